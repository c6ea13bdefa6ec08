pub mod core;
pub mod parser;
pub mod profile;
pub mod rating;
pub mod selector;

// Re-export the main types for convenience
pub use self::core::{Category, TrainingList};
pub use parser::{load_list_file, parse_list};
pub use profile::{catalog, AlgorithmId, AlgorithmProfile};
pub use rating::Rating;
pub use selector::{
    select_challenge, AdaptiveSelector, Challenge, ChallengeSelector, RandomSelector,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ItemRatings;
    use chrono::Utc;

    #[test]
    fn builtin_list_with_default_profile() {
        let list = TrainingList::builtin("fundamentals").unwrap();
        let mut rng = rand::thread_rng();
        let challenge = select_challenge(
            &list,
            true,
            &AlgorithmProfile::default(),
            &ItemRatings::default(),
            &[],
            Utc::now(),
            &mut rng,
        )
        .unwrap();
        assert!(list.contains(&challenge.item, &challenge.category));
    }

    #[test]
    fn parsed_list_feeds_selector() {
        let list = parse_list("custom", "Custom", "Faces:\nnose\nchin\n\nHands:\nfist\n");
        let mut rng = rand::thread_rng();
        let challenge = RandomSelector
            .select(&list, &ItemRatings::default(), &[], Utc::now(), &mut rng)
            .unwrap();
        assert!(list.contains(&challenge.item, &challenge.category));
    }
}
