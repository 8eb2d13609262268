//! Reward model: explicit user feedback → bounded scalar.

use serde::{Deserialize, Serialize};

/// Lower bound of every reward.
pub const REWARD_MIN: f64 = -2.0;
/// Upper bound of every reward.
pub const REWARD_MAX: f64 = 2.0;

const HELPFUL_BONUS: f64 = 1.0;
const UNHELPFUL_PENALTY: f64 = -0.5;
const PRODUCTIVITY_WEIGHT: f64 = 0.5;
const QUICK_RESPONSE_MINUTES: f64 = 5.0;
const QUICK_RESPONSE_BONUS: f64 = 0.2;
/// Assumed response time when neither the caller nor the agent supplied one.
pub const DEFAULT_RESPONSE_MINUTES: f64 = 10.0;

/// What the user did after seeing an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Acted,
    Dismissed,
    Ignored,
    #[default]
    None,
    /// Any label outside the known set; contributes nothing.
    #[serde(other)]
    Other,
}

impl UserAction {
    #[must_use]
    pub fn bonus(self) -> f64 {
        match self {
            UserAction::Acted => 1.5,
            UserAction::Dismissed => -0.3,
            UserAction::Ignored | UserAction::None | UserAction::Other => 0.0,
        }
    }
}

/// Feedback payload for one intervention.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    /// `None` means the user did not rate the intervention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helpful: Option<bool>,
    #[serde(default, alias = "action")]
    pub user_action: UserAction,
    #[serde(default)]
    pub productivity_change: f64,
    /// Filled in by the agent from the intervention age when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_minutes: Option<f64>,
}

impl Feedback {
    /// Drops values that cannot be persisted: a non-finite productivity
    /// change becomes 0, a non-finite or negative response time is removed.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if !self.productivity_change.is_finite() {
            self.productivity_change = 0.0;
        }
        self.response_time_minutes = self
            .response_time_minutes
            .filter(|m| m.is_finite() && *m >= 0.0);
        self
    }

    /// Scalar reward in `[REWARD_MIN, REWARD_MAX]`.
    ///
    /// `helpful` contributes +1.0 / -0.5 / 0, the user action its
    /// [`UserAction::bonus`], and half the productivity change. A positive
    /// total earns +0.2 when the response came within five minutes.
    #[must_use]
    pub fn reward(&self) -> f64 {
        let mut reward = match self.helpful {
            Some(true) => HELPFUL_BONUS,
            Some(false) => UNHELPFUL_PENALTY,
            None => 0.0,
        };
        reward += self.user_action.bonus();
        if !self.productivity_change.is_nan() {
            reward += self.productivity_change * PRODUCTIVITY_WEIGHT;
        }

        let response = self
            .response_time_minutes
            .filter(|m| !m.is_nan())
            .unwrap_or(DEFAULT_RESPONSE_MINUTES);
        if reward > 0.0 && response < QUICK_RESPONSE_MINUTES {
            reward += QUICK_RESPONSE_BONUS;
        }

        reward.clamp(REWARD_MIN, REWARD_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn full_positive_feedback_is_clamped() {
        let fb = Feedback {
            helpful: Some(true),
            user_action: UserAction::Acted,
            productivity_change: 1.0,
            response_time_minutes: Some(2.0),
        };
        // 1.0 + 1.5 + 0.5 + 0.2 = 3.2 → 2.0
        assert_eq!(fb.reward(), REWARD_MAX);
    }

    #[test]
    fn components_add_up_below_the_clamp() {
        let dismissed = Feedback {
            helpful: Some(false),
            user_action: UserAction::Dismissed,
            productivity_change: 0.0,
            response_time_minutes: Some(1.0),
        };
        // Negative total never earns the quick-response bonus.
        assert!(close(dismissed.reward(), -0.8));

        let slow = Feedback {
            helpful: Some(true),
            response_time_minutes: Some(30.0),
            ..Feedback::default()
        };
        assert!(close(slow.reward(), 1.0));

        let quick = Feedback {
            helpful: Some(true),
            response_time_minutes: Some(4.9),
            ..Feedback::default()
        };
        assert!(close(quick.reward(), 1.2));
    }

    #[test]
    fn absent_helpful_contributes_nothing() {
        assert!(close(Feedback::default().reward(), 0.0));
    }

    #[test]
    fn extreme_productivity_change_stays_bounded() {
        for change in [-1e12, -50.0, 50.0, 1e12, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let fb = Feedback {
                productivity_change: change,
                ..Feedback::default()
            };
            let r = fb.reward();
            assert!((REWARD_MIN..=REWARD_MAX).contains(&r), "{change} gave {r}");
        }
    }

    #[test]
    fn sanitized_payload_survives_json() {
        let fb = Feedback {
            helpful: Some(true),
            productivity_change: f64::NAN,
            response_time_minutes: Some(f64::INFINITY),
            ..Feedback::default()
        }
        .sanitized();
        assert!(close(fb.productivity_change, 0.0));
        assert_eq!(fb.response_time_minutes, None);

        let json = serde_json::to_string(&fb).unwrap_or_default();
        let back: Feedback = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(back, fb);

        let negative = Feedback {
            response_time_minutes: Some(-1.0),
            ..Feedback::default()
        };
        assert_eq!(negative.sanitized().response_time_minutes, None);
    }

    #[test]
    fn parses_payload_with_unknown_action_label() {
        let fb: Feedback = serde_json::from_value(json!({
            "helpful": true,
            "action": "snoozed"
        }))
        .unwrap_or_default();
        assert_eq!(fb.user_action, UserAction::Other);
        assert_eq!(fb.helpful, Some(true));
        assert!(close(fb.reward(), 1.0));
    }
}
