//! Example: pattern analysis over a simulated week of feedback.
//!
//! Morning interventions on social apps mostly land, evening ones are
//! dismissed. The analyzer should name the morning as the receptive time and
//! flag nothing but the entertainment apps.
//!
//! Run with: cargo run -p fokuslern-feedback --example pattern_analysis

use fokuslern_core::{Action, Activity, ActivityContext, Feedback, State, UserAction};
use fokuslern_feedback::{FeedbackEntry, PatternAnalyzer};
use time::{Duration, OffsetDateTime};

fn entry(app: &str, at: OffsetDateTime, action: Action, acted: bool) -> FeedbackEntry {
    let activity = Activity {
        app_name: app.into(),
        duration_minutes: 30.0,
        ..Activity::default()
    };
    let state = State::encode_at(&activity, &ActivityContext::default(), at);
    let feedback = Feedback {
        helpful: Some(acted),
        user_action: if acted {
            UserAction::Acted
        } else {
            UserAction::Dismissed
        },
        productivity_change: if acted { 0.3 } else { -0.2 },
        response_time_minutes: Some(if acted { 2.0 } else { 12.0 }),
    };
    FeedbackEntry::new(state, action, feedback.reward(), feedback, at)
}

fn main() {
    println!("=== fokuslern: feedback pattern analysis ===\n");

    // Monday 2024-03-04, 00:00 UTC
    let monday = OffsetDateTime::from_unix_timestamp(1_709_510_400).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let mut entries = Vec::new();
    for day in 0..5 {
        let morning = monday + Duration::days(day) + Duration::hours(9);
        let evening = monday + Duration::days(day) + Duration::hours(20);
        entries.push(entry("reddit", morning, Action::TaskRedirect, true));
        entries.push(entry("youtube", evening, Action::BlockSuggestion, false));
        entries.push(entry("netflix", evening, Action::GentleReminder, day % 2 == 0));
    }

    let analyzer = PatternAnalyzer::default();

    println!("Mean reward by action:");
    for (action, stats) in analyzer.aggregate(&entries, |e| e.action) {
        println!(
            "  {action:<18} {:>2} samples, avg reward {:+.2}",
            stats.total,
            stats.average_reward()
        );
    }
    println!();

    println!("Insights:");
    for line in analyzer.analyze(&entries).lines() {
        println!("  - {line}");
    }
}
