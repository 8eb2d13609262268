use fokuslern_core::{
    Action, Activity, ActivityContext, Decision, DecisionBasis, State, StateKey, ValueKey,
};
use time::macros::datetime;

const YOUTUBE_KEY: &str = "app_switch_frequency=low;current_app_category=entertainment;\
day_of_week=monday;recent_productivity_score=high;session_duration_bin=long;time_of_day_bin=morning";

fn youtube_state() -> State {
    let activity = Activity {
        app_name: "YouTube".into(),
        window_title: "music".into(),
        is_productive: false,
        duration_minutes: 25.0,
    };
    let ctx = ActivityContext {
        recent_productivity: 0.8,
        app_switches_last_hour: 1,
    };
    State::encode_at(&activity, &ctx, datetime!(2024-03-04 10:30:00 UTC))
}

#[test]
fn persisted_key_format_is_stable() {
    assert_eq!(youtube_state().key().as_str(), YOUTUBE_KEY);
    assert_eq!(
        ValueKey::new(youtube_state().key(), Action::TaskRedirect).encode(),
        format!("{YOUTUBE_KEY}|task_redirect")
    );
}

#[test]
fn keys_written_in_any_order_decode_to_the_same_state() {
    let shuffled = "time_of_day_bin=morning;day_of_week=monday;current_app_category=entertainment;\
session_duration_bin=long;app_switch_frequency=low;recent_productivity_score=high";
    let key: StateKey = shuffled.parse().unwrap_or_else(|e| panic!("key should parse: {e}"));
    assert_eq!(key.as_str(), YOUTUBE_KEY);
    assert_eq!(key.state().ok(), Some(youtube_state()));

    let value: ValueKey = format!("{shuffled}|block_suggestion")
        .parse()
        .unwrap_or_else(|e| panic!("value key should parse: {e}"));
    assert_eq!(value.action, Action::BlockSuggestion);
    assert_eq!(value.state, key);
}

#[test]
fn decision_json_shape() {
    let decision = Decision {
        action: Action::GentleReminder,
        why: DecisionBasis::RuleFallback,
        value: None,
    };
    let json = serde_json::to_value(&decision).unwrap_or_else(|e| panic!("serialize: {e}"));
    assert_eq!(
        json,
        serde_json::json!({"action": "gentle_reminder", "why": "rule_fallback"})
    );
}
