use crate::error::DrillError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of one of the built-in weighting profiles
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AlgorithmId {
    #[default]
    Balanced,
    StrugglingFocus,
    FreshExploration,
    SpacedRepetition,
    Random,
}

/// Weighting knobs consumed by the adaptive selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlgorithmProfile {
    pub id: AlgorithmId,
    pub name: &'static str,
    pub description: &'static str,
    /// Emphasis on previously hard subjects (0-1)
    pub struggling_weight: f64,
    /// Penalty for recently practiced subjects (0-1)
    pub recent_weight: f64,
    pub category_balance: bool,
    pub spaced_repetition: bool,
}

static CATALOG: [AlgorithmProfile; 5] = [
    AlgorithmProfile {
        id: AlgorithmId::Balanced,
        name: "Balanced",
        description: "Mix of struggling subjects and fresh ones, spread across categories",
        struggling_weight: 0.4,
        recent_weight: 0.3,
        category_balance: true,
        spaced_repetition: false,
    },
    AlgorithmProfile {
        id: AlgorithmId::StrugglingFocus,
        name: "Struggling Focus",
        description: "Drill the subjects you found hard until they stick",
        struggling_weight: 0.7,
        recent_weight: 0.2,
        category_balance: false,
        spaced_repetition: true,
    },
    AlgorithmProfile {
        id: AlgorithmId::FreshExploration,
        name: "Fresh Exploration",
        description: "Favour subjects you have not drawn yet",
        struggling_weight: 0.2,
        recent_weight: 0.1,
        category_balance: true,
        spaced_repetition: false,
    },
    AlgorithmProfile {
        id: AlgorithmId::SpacedRepetition,
        name: "Memory Trainer",
        description: "Review subjects when their spaced repetition interval comes due",
        struggling_weight: 0.5,
        recent_weight: 0.4,
        category_balance: false,
        spaced_repetition: true,
    },
    AlgorithmProfile {
        id: AlgorithmId::Random,
        name: "Surprise Me",
        description: "Pure random pick, ignores your history",
        struggling_weight: 0.0,
        recent_weight: 0.0,
        category_balance: false,
        spaced_repetition: false,
    },
];

/// All built-in profiles in presentation order
pub fn catalog() -> &'static [AlgorithmProfile] {
    &CATALOG
}

impl AlgorithmId {
    pub fn profile(self) -> &'static AlgorithmProfile {
        // CATALOG is declared in variant order
        &CATALOG[self as usize]
    }
}

impl AlgorithmProfile {
    pub fn is_random(&self) -> bool {
        self.id == AlgorithmId::Random
    }
}

impl Default for AlgorithmProfile {
    fn default() -> Self {
        *AlgorithmId::default().profile()
    }
}

impl FromStr for AlgorithmId {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .map(|p| p.id)
            .find(|id| id.to_string() == s.trim())
            .ok_or_else(|| DrillError::UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn catalog_order_matches_variants() {
        for profile in catalog() {
            assert_eq!(profile.id.profile().id, profile.id);
        }
        assert_eq!(catalog().len(), 5);
    }

    #[test]
    fn literal_weights_are_preserved() {
        let expect = [
            (AlgorithmId::Balanced, 0.4, 0.3, true, false),
            (AlgorithmId::StrugglingFocus, 0.7, 0.2, false, true),
            (AlgorithmId::FreshExploration, 0.2, 0.1, true, false),
            (AlgorithmId::SpacedRepetition, 0.5, 0.4, false, true),
            (AlgorithmId::Random, 0.0, 0.0, false, false),
        ];
        for (id, struggling, recent, balance, spaced) in expect {
            let p = id.profile();
            assert_eq!(p.struggling_weight, struggling, "{id}");
            assert_eq!(p.recent_weight, recent, "{id}");
            assert_eq!(p.category_balance, balance, "{id}");
            assert_eq!(p.spaced_repetition, spaced, "{id}");
        }
    }

    #[test]
    fn parses_known_ids() {
        assert_eq!(
            "spaced-repetition".parse::<AlgorithmId>().unwrap(),
            AlgorithmId::SpacedRepetition
        );
        assert_eq!("random".parse::<AlgorithmId>().unwrap(), AlgorithmId::Random);
    }

    #[test]
    fn unknown_id_is_an_error_not_a_fallback() {
        assert_matches!(
            "turbo".parse::<AlgorithmId>(),
            Err(DrillError::UnknownAlgorithm(id)) if id == "turbo"
        );
    }

    #[test]
    fn default_is_balanced() {
        assert_eq!(AlgorithmProfile::default().id, AlgorithmId::Balanced);
        assert!(AlgorithmId::Random.profile().is_random());
        assert!(!AlgorithmId::Balanced.profile().is_random());
    }
}
