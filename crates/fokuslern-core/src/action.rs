//! The fixed intervention vocabulary.

/// Risk reported for an action name outside the vocabulary.
pub const UNKNOWN_ACTION_RISK: f64 = 0.5;

labelled! {
    /// One of the interventions a policy may emit.
    pub enum Action {
        NoIntervention => "no_intervention",
        GentleReminder => "gentle_reminder",
        BreakSuggestion => "break_suggestion",
        TaskRedirect => "task_redirect",
        BlockSuggestion => "block_suggestion",
        ProductivityTip => "productivity_tip",
    }
}

impl Action {
    /// Fixed distraction-risk score for this action, independent of any
    /// learned value.
    #[must_use]
    pub fn risk(self) -> f64 {
        match self {
            Action::NoIntervention => 0.1,
            Action::GentleReminder => 0.3,
            Action::BreakSuggestion => 0.4,
            Action::TaskRedirect => 0.7,
            Action::BlockSuggestion => 0.9,
            Action::ProductivityTip => 0.2,
        }
    }

    /// `false` only for the no-op.
    #[must_use]
    pub fn is_intervention(self) -> bool {
        self != Action::NoIntervention
    }

    /// Label with underscores replaced by spaces, for user-facing text.
    #[must_use]
    pub fn human_label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

/// Risk for a textual action name; unrecognized names score
/// [`UNKNOWN_ACTION_RISK`].
#[must_use]
pub fn risk_for(name: &str) -> f64 {
    name.parse::<Action>()
        .map_or(UNKNOWN_ACTION_RISK, Action::risk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn risk_scores_are_fixed_per_action() {
        assert_eq!(Action::NoIntervention.risk(), 0.1);
        assert_eq!(Action::BlockSuggestion.risk(), 0.9);
        assert_eq!(Action::TaskRedirect.risk(), 0.7);
        assert_eq!(risk_for("gentle_reminder"), 0.3);
        assert_eq!(risk_for("launch_rocket"), UNKNOWN_ACTION_RISK);
    }

    #[test]
    fn vocabulary_order_is_declaration_order() {
        assert_eq!(Action::ALL.len(), 6);
        assert_eq!(Action::ALL[0], Action::NoIntervention);
        assert!(Action::NoIntervention < Action::ProductivityTip);
        assert!(!Action::NoIntervention.is_intervention());
        assert_eq!(Action::BreakSuggestion.human_label(), "break suggestion");
    }

    #[test]
    fn labels_roundtrip_through_serde_and_fromstr() {
        for action in Action::ALL {
            let json = serde_json::to_string(action).expect("serialize");
            assert_eq!(json, format!("\"{}\"", action.as_str()));
            assert_eq!(action.as_str().parse::<Action>().ok(), Some(*action));
        }
    }
}
