//! Intervention texts.
//!
//! Each action has a fixed list of approved templates; one is picked at
//! random per intervention. Only block suggestions mention the app.

use fokuslern_core::Action;
use rand::seq::SliceRandom;
use rand::Rng;

const APP_PLACEHOLDER: &str = "{app}";
const UNNAMED_APP: &str = "this app";

const GENTLE_REMINDER: &[&str] = &[
    "You're doing well! Keep focused on your current task.",
    "Great progress so far. Stay in the zone!",
    "You've maintained good focus. Keep it up!",
];

const BREAK_SUGGESTION: &[&str] = &[
    "You've been focused for a while. Consider a 5-minute break!",
    "Time for a quick stretch? You've earned it!",
    "Grab some water and take a short breather.",
    "Give your eyes a rest - look away from the screen for a moment.",
];

const TASK_REDIRECT: &[&str] = &[
    "Time to switch back to your main task?",
    "What's your top priority right now?",
    "Let's channel this energy into your important work!",
    "Ready to tackle that priority task?",
];

const BLOCK_SUGGESTION: &[&str] = &[
    "Consider temporarily blocking {app} to stay focused.",
    "This might be a good time to close distracting tabs.",
    "Block distractions for the next 25 minutes?",
];

const PRODUCTIVITY_TIP: &[&str] = &[
    "Try the Pomodoro technique: 25 min work, 5 min break!",
    "Set a specific goal for the next 15 minutes.",
    "Write down your current task to stay accountable.",
    "Reward yourself after completing this task!",
    "Use a timer to create urgency and focus.",
];

fn raw_templates(action: Action) -> &'static [&'static str] {
    match action {
        Action::NoIntervention => &[],
        Action::GentleReminder => GENTLE_REMINDER,
        Action::BreakSuggestion => BREAK_SUGGESTION,
        Action::TaskRedirect => TASK_REDIRECT,
        Action::BlockSuggestion => BLOCK_SUGGESTION,
        Action::ProductivityTip => PRODUCTIVITY_TIP,
    }
}

fn fill(template: &str, app_name: &str) -> String {
    let app = if app_name.trim().is_empty() {
        UNNAMED_APP
    } else {
        app_name
    };
    template.replace(APP_PLACEHOLDER, app)
}

/// Every message `render` may return for `action`, with the app filled in.
/// Empty for the no-op.
#[must_use]
pub fn templates(action: Action, app_name: &str) -> Vec<String> {
    raw_templates(action)
        .iter()
        .map(|t| fill(t, app_name))
        .collect()
}

/// Picks one approved message for `action`, or `None` for the no-op.
pub fn render<R: Rng + ?Sized>(action: Action, app_name: &str, rng: &mut R) -> Option<String> {
    raw_templates(action)
        .choose(rng)
        .map(|t| fill(t, app_name))
}
