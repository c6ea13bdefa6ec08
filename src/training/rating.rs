use crate::error::DrillError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Self-assessed recall quality after a practice session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Rating {
    Easy,
    GotIt,
    Struggled,
    Failed,
}

impl Rating {
    pub const ALL: [Rating; 4] = [
        Rating::Easy,
        Rating::GotIt,
        Rating::Struggled,
        Rating::Failed,
    ];

    /// Days to wait before a subject with this rating is due for review
    pub fn review_interval_days(self) -> f64 {
        match self {
            Rating::Failed => 0.5,
            Rating::Struggled => 1.0,
            Rating::GotIt => 3.0,
            Rating::Easy => 7.0,
        }
    }

    pub fn is_struggle(self) -> bool {
        matches!(self, Rating::Failed | Rating::Struggled)
    }
}

impl FromStr for Rating {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Ok(Rating::Easy),
            "got-it" | "gotit" | "g" => Ok(Rating::GotIt),
            "struggled" | "s" => Ok(Rating::Struggled),
            "failed" | "f" => Ok(Rating::Failed),
            _ => Err(DrillError::UnknownRating(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn display_uses_kebab_case_ids() {
        assert_eq!(Rating::GotIt.to_string(), "got-it");
        assert_eq!(Rating::Failed.to_string(), "failed");
    }

    #[test]
    fn parses_ids_and_shortcuts() {
        for rating in Rating::ALL {
            assert_eq!(rating.to_string().parse::<Rating>().unwrap(), rating);
        }
        assert_eq!("g".parse::<Rating>().unwrap(), Rating::GotIt);
        assert_eq!(" F ".parse::<Rating>().unwrap(), Rating::Failed);
    }

    #[test]
    fn rejects_unknown_rating() {
        assert_matches!("meh".parse::<Rating>(), Err(DrillError::UnknownRating(s)) if s == "meh");
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&Rating::GotIt).unwrap();
        assert_eq!(json, "\"got-it\"");
        let back: Rating = serde_json::from_str("\"struggled\"").unwrap();
        assert_eq!(back, Rating::Struggled);
    }

    #[test]
    fn review_intervals_grow_with_confidence() {
        assert_eq!(Rating::Failed.review_interval_days(), 0.5);
        assert_eq!(Rating::Struggled.review_interval_days(), 1.0);
        assert_eq!(Rating::GotIt.review_interval_days(), 3.0);
        assert_eq!(Rating::Easy.review_interval_days(), 7.0);
    }
}
