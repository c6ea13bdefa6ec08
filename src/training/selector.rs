use super::{core::TrainingList, profile::AlgorithmProfile, rating::Rating};
use crate::error::{DrillError, Result};
use crate::history::{HistoryEntry, ItemRatings};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

const BASE_SCORE: f64 = 1.0;
const MIN_SCORE: f64 = 0.1;
const NOVELTY_BONUS: f64 = 0.5;
const REVIEW_DUE_BONUS: f64 = 1.0;
const REVIEW_EARLY_PENALTY: f64 = 0.5;

/// Only this many of the latest history entries count towards category balance
pub const BALANCE_WINDOW: usize = 20;
/// A category seen more often than this within the window gets dampened
pub const BALANCE_THRESHOLD: usize = 3;
pub const BALANCE_DAMPENING: f64 = 0.7;

const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// The subject the user is asked to draw next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub item: String,
    pub category: String,
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.item)
    }
}

/// Trait for the different challenge selection strategies
pub trait ChallengeSelector {
    fn select(
        &self,
        list: &TrainingList,
        ratings: &ItemRatings,
        history: &[HistoryEntry],
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Result<Challenge>;
}

/// Uniform category, then uniform subject within it
pub struct RandomSelector;

impl ChallengeSelector for RandomSelector {
    fn select(
        &self,
        list: &TrainingList,
        _ratings: &ItemRatings,
        _history: &[HistoryEntry],
        _now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Result<Challenge> {
        list.validate()?;
        uniform_pick(list, rng)
    }
}

/// Weighted selection driven by ratings, recency and category balance
pub struct AdaptiveSelector {
    pub profile: AlgorithmProfile,
}

impl AdaptiveSelector {
    pub fn new(profile: AlgorithmProfile) -> Self {
        Self { profile }
    }
}

impl ChallengeSelector for AdaptiveSelector {
    fn select(
        &self,
        list: &TrainingList,
        ratings: &ItemRatings,
        history: &[HistoryEntry],
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Result<Challenge> {
        list.validate()?;

        let scored = score_subjects(list, &self.profile, ratings, history, now);
        let total: f64 = scored.iter().map(|s| s.score).sum();
        let draw = rng.gen::<f64>() * total;
        pick_weighted(list, &scored, draw, rng)
    }
}

/// Walk the wheel in natural subject order, subtracting scores from `draw`.
/// `None` when the draw outlasts every subject.
fn roulette<'s, 'a>(
    scored: &'s [ScoredSubject<'a>],
    draw: f64,
) -> Option<&'s ScoredSubject<'a>> {
    let mut remaining = draw;
    scored.iter().find(|subject| {
        remaining -= subject.score;
        remaining <= 0.0
    })
}

fn pick_weighted(
    list: &TrainingList,
    scored: &[ScoredSubject<'_>],
    draw: f64,
    rng: &mut dyn RngCore,
) -> Result<Challenge> {
    match roulette(scored, draw) {
        Some(subject) => {
            debug!(
                item = subject.item,
                category = subject.category,
                score = subject.score,
                draw,
                "weighted pick"
            );
            Ok(Challenge {
                item: subject.item.to_string(),
                category: subject.category.to_string(),
            })
        }
        None => {
            debug!(draw, "weighted draw exhausted, falling back to uniform pick");
            uniform_pick(list, rng)
        }
    }
}

/// Pick the next challenge, dispatching on whether adaptive selection applies
pub fn select_challenge(
    list: &TrainingList,
    algorithm_enabled: bool,
    profile: &AlgorithmProfile,
    ratings: &ItemRatings,
    history: &[HistoryEntry],
    now: DateTime<Utc>,
    rng: &mut dyn RngCore,
) -> Result<Challenge> {
    let selector: Box<dyn ChallengeSelector> = if !algorithm_enabled || profile.is_random() {
        Box::new(RandomSelector)
    } else {
        Box::new(AdaptiveSelector::new(*profile))
    };
    selector.select(list, ratings, history, now, rng)
}

fn uniform_pick(list: &TrainingList, rng: &mut dyn RngCore) -> Result<Challenge> {
    let category = list
        .categories
        .choose(rng)
        .ok_or_else(|| DrillError::EmptyList(list.id.clone()))?;
    let item = category
        .items
        .choose(rng)
        .ok_or_else(|| DrillError::EmptyCategory {
            list: list.id.clone(),
            category: category.name.clone(),
        })?;
    Ok(Challenge {
        item: item.clone(),
        category: category.name.clone(),
    })
}

/// A subject together with its final selection weight
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSubject<'a> {
    pub category: &'a str,
    pub item: &'a str,
    pub score: f64,
}

/// Fractional days between two instants, from millisecond timestamps
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MS_PER_DAY
}

/// Score a single subject before category balancing. Never below 0.1.
pub fn score_subject(
    profile: &AlgorithmProfile,
    rating: Option<Rating>,
    last_practiced: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = BASE_SCORE;

    match rating {
        Some(r) if r.is_struggle() => score += profile.struggling_weight * 2.0,
        Some(Rating::Easy) => score -= profile.struggling_weight * 0.5,
        _ => {}
    }

    let days_since = last_practiced.map(|at| days_between(at, now));
    match days_since {
        Some(days) if days < 1.0 => score -= profile.recent_weight * 1.5,
        Some(days) if days < 3.0 => score -= profile.recent_weight * 0.8,
        Some(_) => {}
        None => score += NOVELTY_BONUS,
    }

    if profile.spaced_repetition {
        if let (Some(r), Some(days)) = (rating, days_since) {
            if days >= r.review_interval_days() {
                score += REVIEW_DUE_BONUS;
            } else {
                score -= REVIEW_EARLY_PENALTY;
            }
        }
    }

    score.max(MIN_SCORE)
}

/// Latest practice instant per subject
fn last_practiced_by_subject(history: &[HistoryEntry]) -> HashMap<&str, DateTime<Utc>> {
    let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for entry in history {
        latest
            .entry(entry.subject.as_str())
            .and_modify(|at| *at = (*at).max(entry.practiced_at))
            .or_insert(entry.practiced_at);
    }
    latest
}

/// Score every subject of the list in natural order, including category balancing
pub fn score_subjects<'a>(
    list: &'a TrainingList,
    profile: &AlgorithmProfile,
    ratings: &ItemRatings,
    history: &[HistoryEntry],
    now: DateTime<Utc>,
) -> Vec<ScoredSubject<'a>> {
    let latest = last_practiced_by_subject(history);

    let mut scored: Vec<ScoredSubject<'a>> = list
        .subjects()
        .map(|(category, item)| ScoredSubject {
            category,
            item,
            score: score_subject(profile, ratings.get(item), latest.get(item).copied(), now),
        })
        .collect();

    if profile.category_balance {
        let window = &history[history.len().saturating_sub(BALANCE_WINDOW)..];
        let counts = window.iter().map(|e| e.category.as_str()).counts();
        // Applied after the floor, so dampened scores may drop below it
        for subject in scored.iter_mut() {
            if counts.get(subject.category).copied().unwrap_or(0) > BALANCE_THRESHOLD {
                subject.score *= BALANCE_DAMPENING;
            }
        }
    }

    scored
}
