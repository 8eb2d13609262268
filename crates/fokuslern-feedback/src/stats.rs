//! Summary view of the learned model.

use fokuslern_bandits::ValueTable;
use serde::{Deserialize, Serialize};

use crate::FeedbackHistory;

/// Number of newest feedback entries averaged for the recent reward
const RECENT_REWARD_WINDOW: usize = 20;
/// Below this many feedback entries the model is still starting
const PROGRESS_MIN_FEEDBACK: u64 = 5;
/// Mean recent reward above which learning counts as good
const PROGRESS_GOOD_REWARD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningProgress {
    Starting,
    Learning,
    Good,
}

impl LearningProgress {
    #[must_use]
    pub fn classify(feedback_count: u64, average_recent_reward: f64) -> Self {
        if feedback_count < PROGRESS_MIN_FEEDBACK {
            LearningProgress::Starting
        } else if average_recent_reward <= PROGRESS_GOOD_REWARD {
            LearningProgress::Learning
        } else {
            LearningProgress::Good
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Distinct states in the value table
    pub total_states: usize,
    /// (state, action) entries in the value table
    pub total_entries: usize,
    /// Feedback events recorded over the model's lifetime
    pub total_feedbacks: u64,
    pub average_q_value: f64,
    pub average_recent_reward: f64,
    pub exploration_rate: f64,
    pub learning_progress: LearningProgress,
}

impl ModelStats {
    /// Builds the stats view; averages and ε are rounded to three decimals.
    #[must_use]
    pub fn compute(table: &ValueTable, history: &FeedbackHistory, epsilon: f64) -> Self {
        let recent: Vec<f64> = history
            .recent(RECENT_REWARD_WINDOW)
            .map(|e| e.reward)
            .collect();
        let average_recent_reward = if recent.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                recent.iter().sum::<f64>() / recent.len() as f64
            }
        };

        Self {
            total_states: table.state_count(),
            total_entries: table.entry_count(),
            total_feedbacks: history.recorded(),
            average_q_value: round3(table.mean_value()),
            average_recent_reward: round3(average_recent_reward),
            exploration_rate: round3(epsilon),
            learning_progress: LearningProgress::classify(history.recorded(), average_recent_reward),
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
