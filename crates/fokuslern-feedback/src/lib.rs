#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Feedback history and retrospective analysis.
//!
//! Every processed feedback event becomes a [`FeedbackEntry`]. The
//! [`FeedbackHistory`] keeps a bounded window of them, the
//! [`PatternAnalyzer`] turns the recent window into behavioral insights, and
//! [`ModelStats`] and [`suggest::personalized`] summarize the learned model
//! for the user.

pub mod patterns;
pub mod stats;
pub mod suggest;

use std::collections::VecDeque;

use fokuslern_core::{Action, Feedback, State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use patterns::{Insight, PatternAnalyzer, PatternReport, RewardStatistics};
pub use stats::{LearningProgress, ModelStats};
pub use suggest::SuggestionContext;

/// Default number of entries retained (and persisted).
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Recorded outcome of one intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    /// Raw payload the reward was computed from
    pub feedback: Feedback,
    /// RFC 3339 timestamp of when the feedback was processed
    pub timestamp: String,
}

impl FeedbackEntry {
    #[must_use]
    pub fn new(state: State, action: Action, reward: f64, feedback: Feedback, at: OffsetDateTime) -> Self {
        Self {
            state,
            action,
            reward,
            feedback,
            timestamp: fokuslern_core::rfc3339(at),
        }
    }
}

/// Append-only feedback log that keeps the most recent `limit` entries.
///
/// `recorded` counts every entry ever appended (including those loaded from
/// a snapshot), so it keeps growing after old entries are dropped.
#[derive(Debug, Clone)]
pub struct FeedbackHistory {
    entries: VecDeque<FeedbackEntry>,
    limit: usize,
    recorded: u64,
}

impl Default for FeedbackHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl FeedbackHistory {
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
            recorded: 0,
        }
    }

    /// Rebuilds a history from persisted entries, keeping the newest `limit`.
    #[must_use]
    pub fn restore(entries: Vec<FeedbackEntry>, limit: usize) -> Self {
        let mut history = Self::with_limit(limit);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    /// Appends an entry and returns the new lifetime count.
    pub fn push(&mut self, entry: FeedbackEntry) -> u64 {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.recorded += 1;
        self.recorded
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &FeedbackEntry> + '_ {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    /// Owned copy of the retained entries, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<FeedbackEntry> {
        self.entries.iter().cloned().collect()
    }
}
