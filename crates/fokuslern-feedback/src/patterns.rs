//! Behavioral pattern analysis over the recent feedback window.
//!
//! This is heuristic aggregation, not learning: mean reward per time bucket,
//! per app category and per action, reduced to at most three insights.

use std::collections::BTreeMap;
use std::fmt;

use fokuslern_core::{Action, AppCategory, TimeBucket};
use serde::{Deserialize, Serialize};

use crate::FeedbackEntry;

/// Number of most recent entries analyzed
const PATTERN_WINDOW: usize = 50;
/// Minimum number of feedback entries before any pattern is reported
const PATTERN_MIN_FEEDBACK: usize = 10;
/// An action needs more than this many samples to be called most effective
const PATTERN_MIN_ACTION_SAMPLES: usize = 2;
/// Mean reward below which an app category needs attention
const PATTERN_ATTENTION_THRESHOLD: f64 = -0.2;

/// Reward aggregate for one group.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RewardStatistics {
    pub total: usize,
    pub total_reward: f64,
}

impl RewardStatistics {
    #[must_use]
    pub fn average_reward(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.total_reward / self.total as f64
        }
    }
}

/// One behavioral insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    /// Time bucket with the highest mean reward.
    BestTime { bucket: TimeBucket, score: f64 },
    /// Action with the highest mean reward among well-sampled actions.
    BestAction { action: Action, score: f64 },
    /// App categories whose mean reward is below the attention threshold.
    NeedsAttention { categories: Vec<AppCategory> },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::BestTime { bucket, score } => write!(
                f,
                "Most receptive to interventions during: {bucket} (score: {score:.2})"
            ),
            Insight::BestAction { action, score } => write!(
                f,
                "Most effective intervention: {action} (score: {score:.2})"
            ),
            Insight::NeedsAttention { categories } => {
                let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
                write!(f, "Apps needing attention: {}", names.join(", "))
            }
        }
    }
}

/// Result of a pattern analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatternReport {
    /// Not enough feedback yet; no partial statistics are reported.
    InsufficientData { available: usize, required: usize },
    Insights { insights: Vec<Insight> },
}

impl PatternReport {
    pub const INSUFFICIENT_DATA_MESSAGE: &'static str = "Need more data to identify patterns.";

    /// Rendered insights, or the single "need more data" line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            PatternReport::InsufficientData { .. } => {
                vec![Self::INSUFFICIENT_DATA_MESSAGE.to_string()]
            }
            PatternReport::Insights { insights } => {
                insights.iter().map(ToString::to_string).collect()
            }
        }
    }

    /// Insights only; empty when data is insufficient.
    #[must_use]
    pub fn insights(&self) -> &[Insight] {
        match self {
            PatternReport::InsufficientData { .. } => &[],
            PatternReport::Insights { insights } => insights.as_slice(),
        }
    }
}

/// Aggregates feedback entries into behavioral insights.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    window: usize,
    min_feedback: usize,
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self {
            window: PATTERN_WINDOW,
            min_feedback: PATTERN_MIN_FEEDBACK,
        }
    }
}

impl PatternAnalyzer {
    #[must_use]
    pub fn new(window: usize, min_feedback: usize) -> Self {
        Self {
            window: window.max(1),
            min_feedback,
        }
    }

    /// Mean reward per group key. Groups iterate in key order, which for the
    /// vocabulary enums is declaration order.
    #[must_use]
    pub fn aggregate<'a, K: Ord>(
        &self,
        entries: impl IntoIterator<Item = &'a FeedbackEntry>,
        key_fn: impl Fn(&FeedbackEntry) -> K,
    ) -> BTreeMap<K, RewardStatistics> {
        let mut stats: BTreeMap<K, RewardStatistics> = BTreeMap::new();
        for entry in entries {
            let group = stats.entry(key_fn(entry)).or_default();
            group.total += 1;
            if entry.reward.is_finite() {
                group.total_reward += entry.reward;
            }
        }
        stats
    }

    /// Analyzes the newest `window` entries of `history` (oldest first).
    ///
    /// Requires at least `min_feedback` entries in total; otherwise returns
    /// [`PatternReport::InsufficientData`].
    #[must_use]
    pub fn analyze(&self, history: &[FeedbackEntry]) -> PatternReport {
        if history.len() < self.min_feedback {
            return PatternReport::InsufficientData {
                available: history.len(),
                required: self.min_feedback,
            };
        }
        let recent = &history[history.len().saturating_sub(self.window)..];

        let mut insights = Vec::new();

        let by_time = self.aggregate(recent, |e| e.state.time_of_day);
        if let Some((bucket, score)) = best_group(&by_time, 0) {
            insights.push(Insight::BestTime { bucket, score });
        }

        let by_action = self.aggregate(recent, |e| e.action);
        if let Some((action, score)) = best_group(&by_action, PATTERN_MIN_ACTION_SAMPLES) {
            insights.push(Insight::BestAction { action, score });
        }

        let by_app = self.aggregate(recent, |e| e.state.app_category);
        let categories: Vec<AppCategory> = by_app
            .iter()
            .filter(|(_, s)| s.average_reward() < PATTERN_ATTENTION_THRESHOLD)
            .map(|(c, _)| *c)
            .collect();
        if !categories.is_empty() {
            insights.push(Insight::NeedsAttention { categories });
        }

        PatternReport::Insights { insights }
    }
}

/// Group with the highest mean among groups with more than `min_samples`
/// entries; ties go to the smallest key.
fn best_group<K: Ord + Copy>(
    stats: &BTreeMap<K, RewardStatistics>,
    min_samples: usize,
) -> Option<(K, f64)> {
    let mut best: Option<(K, f64)> = None;
    for (key, s) in stats.iter().filter(|(_, s)| s.total > min_samples) {
        let score = s.average_reward();
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((*key, score)),
        }
    }
    best
}
