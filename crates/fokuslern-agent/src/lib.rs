#![warn(clippy::unwrap_used, clippy::expect_used)]

//! The focus agent.
//!
//! [`FocusAgent`] ties the pieces together behind four operations:
//! [`process_activity`](FocusAgent::process_activity) encodes an activity,
//! picks an intervention and registers it;
//! [`process_feedback`](FocusAgent::process_feedback) turns feedback on a
//! registered intervention into a reward and a value update;
//! [`get_suggestions`](FocusAgent::get_suggestions) and
//! [`get_model_insights`](FocusAgent::get_model_insights) summarize what has
//! been learned.
//!
//! All operations take `&self` and are safe to call from several threads.
//! Lock order is pending → history → policy. Persistence failures are logged
//! and never surface to the caller.

pub mod config;
pub mod error;
pub mod messages;
pub mod pending;
pub mod persistence;

use fokuslern_bandits::{telemetry, FocusBandit, ValueTable};
use fokuslern_core::{
    now_local, rfc3339, Action, Activity, ActivityContext, DecisionBasis, Feedback, Policy, State,
};
use fokuslern_feedback::{
    suggest, FeedbackEntry, FeedbackHistory, ModelStats, PatternAnalyzer, PatternReport,
    SuggestionContext,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use pending::{InterventionIds, PendingIntervention, PendingInterventions};
pub use persistence::{ModelSnapshot, SnapshotStore};

/// Result of processing one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityOutcome {
    /// Fixed per-action distraction risk in `[0, 1]`
    pub risk: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub action: Action,
    /// Present iff a message was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_id: Option<String>,
    pub why: DecisionBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInsights {
    pub stats: ModelStats,
    pub patterns: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug)]
pub struct FocusAgent {
    config: AgentConfig,
    policy: RwLock<FocusBandit>,
    history: Mutex<FeedbackHistory>,
    pending: Mutex<PendingInterventions>,
    ids: InterventionIds,
    rng: Mutex<StdRng>,
    store: SnapshotStore,
    analyzer: PatternAnalyzer,
}

impl FocusAgent {
    /// Builds the agent and restores the snapshot at `config.model_path`.
    ///
    /// Only an invalid configuration is an error. A missing or unreadable
    /// snapshot starts a fresh model.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let mut bandit = config.bandit()?;
        let mut history = FeedbackHistory::with_limit(config.history_limit);
        let store = SnapshotStore::new(&config.model_path);

        match store.load() {
            Ok(Some(snapshot)) => {
                for rejected in bandit.restore(&snapshot.bandit()) {
                    telemetry::warn(format_args!("skipping value-table entry: {rejected}"));
                }
                history = FeedbackHistory::restore(snapshot.feedback_history, config.history_limit);
                telemetry::info(format_args!(
                    "model loaded from {}: {} states, {} feedback entries",
                    store.path().display(),
                    bandit.table().state_count(),
                    history.len()
                ));
            }
            Ok(None) => telemetry::info(format_args!(
                "no model at {}, starting fresh",
                store.path().display()
            )),
            Err(e) => telemetry::warn(format_args!(
                "could not load model from {}, starting fresh: {e}",
                store.path().display()
            )),
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let ttl_minutes = i64::try_from(config.intervention_ttl_minutes).unwrap_or(i64::MAX / 60);
        let ttl = Duration::minutes(ttl_minutes.min(i64::MAX / 60));
        let pending = PendingInterventions::new(ttl, config.max_pending_interventions);

        Ok(Self {
            policy: RwLock::new(bandit),
            history: Mutex::new(history),
            pending: Mutex::new(pending),
            ids: InterventionIds::default(),
            rng: Mutex::new(rng),
            store,
            analyzer: PatternAnalyzer::default(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn process_activity(&self, activity: &Activity, ctx: &ActivityContext) -> ActivityOutcome {
        self.process_activity_at(activity, ctx, now_local())
    }

    /// Encodes the activity as observed at `now`, selects an action and, if
    /// it produces a message, registers a pending intervention.
    pub fn process_activity_at(
        &self,
        activity: &Activity,
        ctx: &ActivityContext,
        now: OffsetDateTime,
    ) -> ActivityOutcome {
        let state = State::encode_at(activity, ctx, now);

        let mut pending = self.lock_pending(now);
        let decision = self.policy.read().decide(&state);
        let action = decision.action;
        let message = messages::render(action, &activity.app_name, &mut *self.rng.lock());

        let intervention_id = message.as_ref().map(|_| {
            let id = self.ids.next(now);
            pending.insert(
                id.clone(),
                PendingIntervention {
                    state,
                    action,
                    created_at: now,
                    activity: activity.clone(),
                },
                now,
            );
            id
        });

        ActivityOutcome {
            risk: action.risk(),
            message,
            action,
            intervention_id,
            why: decision.why,
        }
    }

    /// Applies feedback for a pending intervention. Unknown or expired ids
    /// are ignored.
    pub fn process_feedback(&self, intervention_id: &str, feedback: Feedback) {
        let _ = self.process_feedback_at(intervention_id, feedback, now_local());
    }

    /// Like [`process_feedback`](Self::process_feedback) at a given instant;
    /// returns the reward applied, or `None` for an unknown id.
    pub fn process_feedback_at(
        &self,
        intervention_id: &str,
        feedback: Feedback,
        now: OffsetDateTime,
    ) -> Option<f64> {
        let Some(intervention) = self.lock_pending(now).take(intervention_id, now) else {
            telemetry::debug(format_args!(
                "feedback for unknown intervention {intervention_id} ignored"
            ));
            return None;
        };

        let mut feedback = feedback.sanitized();
        if feedback.response_time_minutes.is_none() {
            feedback.response_time_minutes = Some(intervention.age_minutes(now));
        }
        let reward = feedback.reward();

        let mut history = self.history.lock();
        self.policy
            .write()
            .feedback(&intervention.state, intervention.action, reward);
        let recorded = history.push(FeedbackEntry::new(
            intervention.state,
            intervention.action,
            reward,
            feedback,
            now,
        ));
        if recorded % self.config.save_every == 0 {
            self.save_with(&history, now);
        }
        Some(reward)
    }

    /// Up to three suggestions. The hour comes from `ctx` or the local clock.
    pub fn get_suggestions(&self, ctx: &SuggestionContext) -> Vec<String> {
        let hour = ctx.current_hour.unwrap_or_else(|| now_local().hour());
        let report = self.patterns();
        let policy = self.policy.read();
        suggest::personalized(&report, policy.table(), hour)
    }

    pub fn get_model_insights(&self) -> ModelInsights {
        ModelInsights {
            stats: self.model_stats(),
            patterns: self.patterns().lines(),
            recommendations: self.get_suggestions(&SuggestionContext::default()),
        }
    }

    pub fn model_stats(&self) -> ModelStats {
        let history = self.history.lock();
        let policy = self.policy.read();
        ModelStats::compute(policy.table(), &history, policy.epsilon())
    }

    pub fn patterns(&self) -> PatternReport {
        let entries = self.history.lock().to_vec();
        self.analyzer.analyze(&entries)
    }

    /// Writes the snapshot now. Failures are logged; returns whether the
    /// write succeeded.
    pub fn save_model(&self) -> bool {
        let history = self.history.lock();
        self.save_with(&history, now_local())
    }

    /// Deletes the snapshot and forgets everything learned.
    pub fn reset(&self) -> Result<bool> {
        let mut history = self.history.lock();
        let mut policy = self.policy.write();
        *policy = self.config.bandit()?;
        *history = FeedbackHistory::with_limit(self.config.history_limit);
        self.store.remove()
    }

    fn lock_pending(&self, now: OffsetDateTime) -> MutexGuard<'_, PendingInterventions> {
        let mut pending = self.pending.lock();
        let expired = pending.expire(now);
        if expired > 0 {
            telemetry::debug(format_args!("{expired} pending interventions expired"));
        }
        pending
    }

    fn save_with(&self, history: &FeedbackHistory, now: OffsetDateTime) -> bool {
        let snapshot = ModelSnapshot::new(
            self.policy.read().snapshot(),
            history.to_vec(),
            self.config.history_limit,
            rfc3339(now),
        );
        match self.store.save(&snapshot) {
            Ok(()) => {
                telemetry::info(format_args!(
                    "model saved to {}: {} values, {} feedback entries",
                    self.store.path().display(),
                    snapshot.q_table.len(),
                    snapshot.feedback_history.len()
                ));
                true
            }
            Err(e) => {
                telemetry::warn(format_args!(
                    "failed to save model to {}: {e}",
                    self.store.path().display()
                ));
                false
            }
        }
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.policy.read().epsilon()
    }

    pub fn set_epsilon(&self, epsilon: f64) {
        self.policy.write().set_epsilon(epsilon);
    }

    /// Learned value for (state, action), 0 when unseen.
    #[must_use]
    pub fn value(&self, state: &State, action: Action) -> f64 {
        self.policy.read().table().get(&state.key(), action)
    }

    /// Copy of the current value table.
    #[must_use]
    pub fn table(&self) -> ValueTable {
        self.policy.read().table().clone()
    }

    #[must_use]
    pub fn feedback_count(&self) -> u64 {
        self.history.lock().recorded()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
