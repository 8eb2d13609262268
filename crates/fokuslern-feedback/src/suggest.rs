//! Personalized suggestions from insights, time of day and the value table.

use std::collections::BTreeMap;

use fokuslern_bandits::ValueTable;
use fokuslern_core::Action;
use serde::{Deserialize, Serialize};

use crate::PatternReport;

/// Maximum number of suggestions returned
const MAX_SUGGESTIONS: usize = 3;
/// Insights taken from the pattern report
const MAX_INSIGHT_SUGGESTIONS: usize = 2;
/// Afternoon hours with a typical energy dip
const AFTERNOON_DIP_HOURS: std::ops::RangeInclusive<u8> = 14..=16;
/// The table must know more states than this before it is mined
const MIN_STATES_FOR_TABLE_SUGGESTION: usize = 5;
/// Best value a state's action needs to count as successful
const SUCCESSFUL_VALUE: f64 = 0.5;

const AFTERNOON_DIP: &str = "Consider a coffee break or short walk to boost afternoon energy!";
const ONBOARDING: [&str; 3] = [
    "Keep using the app to build your personalized productivity profile!",
    "Try different focus techniques to see what works best for you.",
    "Your assistant is learning your patterns in real-time.",
];

/// Caller context for suggestions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionContext {
    /// Local hour of day, 0-23. The agent's clock is used when absent.
    #[serde(default)]
    pub current_hour: Option<u8>,
}

/// Up to three suggestions, in this order: the first two pattern insights,
/// an afternoon-dip hint at 14-16h, and the action most often learned as best.
/// Falls back to fixed onboarding suggestions when none apply.
#[must_use]
pub fn personalized(report: &PatternReport, table: &ValueTable, hour: u8) -> Vec<String> {
    let mut suggestions: Vec<String> = report
        .insights()
        .iter()
        .take(MAX_INSIGHT_SUGGESTIONS)
        .map(ToString::to_string)
        .collect();

    if AFTERNOON_DIP_HOURS.contains(&hour) {
        suggestions.push(AFTERNOON_DIP.to_string());
    }

    if let Some(action) = most_common_successful_action(table) {
        if action.is_intervention() {
            suggestions.push(format!(
                "Based on your patterns, {} works well for you!",
                action.human_label()
            ));
        }
    }

    if suggestions.is_empty() {
        suggestions = ONBOARDING.iter().map(ToString::to_string).collect();
    }
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Most frequent best action among states whose best value exceeds
/// [`SUCCESSFUL_VALUE`]; ties go to vocabulary order.
#[must_use]
pub fn most_common_successful_action(table: &ValueTable) -> Option<Action> {
    if table.state_count() <= MIN_STATES_FOR_TABLE_SUGGESTION {
        return None;
    }
    let mut counts: BTreeMap<Action, usize> = BTreeMap::new();
    for (_, action, value) in table.best_per_state() {
        if value > SUCCESSFUL_VALUE {
            *counts.entry(action).or_insert(0) += 1;
        }
    }
    let mut best: Option<(Action, usize)> = None;
    for (action, count) in counts {
        match best {
            Some((_, current)) if count <= current => {}
            _ => best = Some((action, count)),
        }
    }
    best.map(|(action, _)| action)
}
