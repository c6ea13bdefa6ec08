use crate::config::Config;
use crate::error::Result;
use crate::history::{HistoryDb, HistoryEntry};
use crate::session::PracticeSession;
use crate::training::{select_challenge, AlgorithmProfile, Challenge, TrainingList};
use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::info;

/// Ties the active list, algorithm and history store together
#[derive(Debug)]
pub struct Trainer {
    pub list: TrainingList,
    pub profile: AlgorithmProfile,
    pub algorithm_enabled: bool,
    db: HistoryDb,
}

impl Trainer {
    pub fn new(
        list: TrainingList,
        profile: AlgorithmProfile,
        algorithm_enabled: bool,
        db: HistoryDb,
    ) -> Result<Self> {
        list.validate()?;
        Ok(Self {
            list,
            profile,
            algorithm_enabled,
            db,
        })
    }

    pub fn from_config(config: &Config, db: HistoryDb) -> Result<Self> {
        Self::new(
            config.training_list()?,
            *config.algorithm.profile(),
            config.algorithm_enabled,
            db,
        )
    }

    pub fn next_challenge(&self, rng: &mut dyn RngCore) -> Result<Challenge> {
        self.next_challenge_at(Utc::now(), rng)
    }

    pub fn next_challenge_at(&self, now: DateTime<Utc>, rng: &mut dyn RngCore) -> Result<Challenge> {
        // Snapshots; the selector never sees the store
        let ratings = self.db.item_ratings()?;
        let history = self.db.entries()?;
        let challenge = select_challenge(
            &self.list,
            self.algorithm_enabled,
            &self.profile,
            &ratings,
            &history,
            now,
            rng,
        )?;
        info!(
            list = %self.list.id,
            algorithm = %self.profile.id,
            enabled = self.algorithm_enabled,
            challenge = %challenge,
            "selected challenge"
        );
        Ok(challenge)
    }

    pub fn start(&self, rng: &mut dyn RngCore) -> Result<PracticeSession> {
        Ok(PracticeSession::start(self.next_challenge(rng)?))
    }

    pub fn complete(&mut self, entry: &HistoryEntry) -> Result<()> {
        self.db.record_entry(entry)
    }

    pub fn history(&self) -> &HistoryDb {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{AlgorithmId, Category, Rating};
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trainer(profile: AlgorithmId) -> Trainer {
        let list = TrainingList::new(
            "t",
            "T",
            vec![Category::new("Shapes", vec!["circle".into(), "square".into()])],
        );
        Trainer::new(list, *profile.profile(), true, HistoryDb::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn rejects_empty_list_up_front() {
        let empty = TrainingList::new("e", "E", vec![]);
        let db = HistoryDb::open_in_memory().unwrap();
        assert!(Trainer::new(empty, AlgorithmProfile::default(), true, db).is_err());
    }

    #[test]
    fn completed_sessions_feed_back_into_selection() {
        let mut trainer = trainer(AlgorithmId::StrugglingFocus);
        let now = Utc::now();
        let start = now - Duration::days(5);

        // circle failed, square easy, both five days ago
        for (item, rating) in [("circle", Rating::Failed), ("square", Rating::Easy)] {
            let session = PracticeSession::start_at(
                Challenge {
                    item: item.into(),
                    category: "Shapes".into(),
                },
                start,
            );
            trainer
                .complete(&session.finish_at(rating, start + Duration::seconds(60)))
                .unwrap();
        }
        assert_eq!(trainer.history().entries().unwrap().len(), 2);

        let mut rng = StdRng::seed_from_u64(3);
        let circles = (0..500)
            .filter(|_| trainer.next_challenge_at(now, &mut rng).unwrap().item == "circle")
            .count();
        assert!(circles > 400, "circle picked {circles} of 500");
    }

    #[test]
    fn start_returns_session_for_list_subject() {
        let trainer = trainer(AlgorithmId::Balanced);
        let mut rng = StdRng::seed_from_u64(11);
        let session = trainer.start(&mut rng).unwrap();
        assert!(trainer
            .list
            .contains(&session.challenge.item, &session.challenge.category));
    }
}
