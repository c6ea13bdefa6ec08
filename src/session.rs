use crate::history::HistoryEntry;
use crate::training::{Challenge, Rating};
use chrono::{DateTime, Utc};

/// A challenge being drawn right now
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub challenge: Challenge,
    pub started_at: DateTime<Utc>,
}

impl PracticeSession {
    pub fn start(challenge: Challenge) -> Self {
        Self::start_at(challenge, Utc::now())
    }

    pub fn start_at(challenge: Challenge, started_at: DateTime<Utc>) -> Self {
        Self {
            challenge,
            started_at,
        }
    }

    pub fn finish(self, rating: Rating) -> HistoryEntry {
        self.finish_at(rating, Utc::now())
    }

    /// Close the session, elapsed time in whole seconds
    pub fn finish_at(self, rating: Rating, now: DateTime<Utc>) -> HistoryEntry {
        let elapsed_secs = (now - self.started_at).num_seconds().max(0) as u64;
        HistoryEntry {
            subject: self.challenge.item,
            category: self.challenge.category,
            elapsed_secs,
            rating,
            practiced_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn challenge() -> Challenge {
        Challenge {
            item: "hand".into(),
            category: "Anatomy".into(),
        }
    }

    #[test]
    fn finish_records_elapsed_time() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let session = PracticeSession::start_at(challenge(), start);
        let entry = session.finish_at(Rating::Struggled, start + Duration::milliseconds(95_500));
        assert_eq!(entry.subject, "hand");
        assert_eq!(entry.category, "Anatomy");
        assert_eq!(entry.elapsed_secs, 95);
        assert_eq!(entry.rating, Rating::Struggled);
        assert_eq!(entry.practiced_at, start + Duration::milliseconds(95_500));
    }

    #[test]
    fn clock_skew_does_not_underflow() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let entry = PracticeSession::start_at(challenge(), start)
            .finish_at(Rating::Easy, start - Duration::seconds(3));
        assert_eq!(entry.elapsed_secs, 0);
    }
}
