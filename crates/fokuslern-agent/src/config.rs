//! Agent configuration: JSON file, environment overrides, validation.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use fokuslern_bandits::{
    Exploration, FocusBandit, DEFAULT_DISCOUNT_FACTOR, DEFAULT_EPSILON, DEFAULT_EPSILON_DECAY,
    DEFAULT_EPSILON_FLOOR, DEFAULT_LEARNING_RATE,
};
use fokuslern_feedback::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Overrides `model_path`
pub const ENV_MODEL_PATH: &str = "FOKUSLERN_MODEL_PATH";
/// Overrides `seed`
pub const ENV_SEED: &str = "FOKUSLERN_SEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f64,
    /// Persisted with the model; the value update does not use it.
    pub discount_factor: f64,
    pub initial_epsilon: f64,
    pub epsilon_floor: f64,
    pub epsilon_decay: f64,
    /// Persist after every n-th feedback entry.
    pub save_every: u64,
    /// Feedback entries kept in memory and in the snapshot.
    pub history_limit: usize,
    pub model_path: PathBuf,
    /// Pending interventions older than this are dropped.
    pub intervention_ttl_minutes: u64,
    pub max_pending_interventions: usize,
    /// Seeds exploration and message choice for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            initial_epsilon: DEFAULT_EPSILON,
            epsilon_floor: DEFAULT_EPSILON_FLOOR,
            epsilon_decay: DEFAULT_EPSILON_DECAY,
            save_every: 10,
            history_limit: DEFAULT_HISTORY_LIMIT,
            model_path: PathBuf::from("models/focus_rl_model.json"),
            intervention_ttl_minutes: 240,
            max_pending_interventions: 1000,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Reads a JSON config; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| AgentError::io(path, e))?;
        let config: AgentConfig = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Applies `FOKUSLERN_MODEL_PATH` and `FOKUSLERN_SEED`.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(path) = env::var(ENV_MODEL_PATH) {
            if !path.trim().is_empty() {
                self.model_path = PathBuf::from(path);
            }
        }
        if let Ok(seed) = env::var(ENV_SEED) {
            let seed = seed
                .trim()
                .parse()
                .map_err(|_| AgentError::Config(format!("{ENV_SEED} is not a u64: {seed:?}")))?;
            self.seed = Some(seed);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epsilon_floor > self.initial_epsilon {
            return Err(AgentError::Config(format!(
                "epsilon_floor {} exceeds initial_epsilon {}",
                self.epsilon_floor, self.initial_epsilon
            )));
        }
        if self.save_every == 0 {
            return Err(AgentError::Config("save_every must be at least 1".into()));
        }
        if self.history_limit == 0 {
            return Err(AgentError::Config("history_limit must be at least 1".into()));
        }
        if self.max_pending_interventions == 0 {
            return Err(AgentError::Config(
                "max_pending_interventions must be at least 1".into(),
            ));
        }
        self.bandit().map(|_| ())
    }

    /// Builds an untrained policy from these parameters.
    pub fn bandit(&self) -> Result<FocusBandit> {
        let exploration = Exploration::new(self.initial_epsilon, self.epsilon_floor, self.epsilon_decay)?;
        let bandit = FocusBandit::new(self.learning_rate, self.discount_factor, exploration)?;
        Ok(match self.seed {
            Some(seed) => bandit.with_seed(seed),
            None => bandit,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let config = AgentConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.save_every, 10);
        assert_eq!(config.history_limit, 1000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = env::temp_dir().join(format!("fokuslern_config_{}.json", std::process::id()));
        fs::write(&path, r#"{"learning_rate": 0.2, "seed": 9}"#).unwrap();
        let config = AgentConfig::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!((config.learning_rate - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(9));
        assert!((config.initial_epsilon - DEFAULT_EPSILON).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inconsistent_settings() {
        let floor_too_high = AgentConfig {
            initial_epsilon: 0.05,
            ..AgentConfig::default()
        };
        assert!(matches!(floor_too_high.validate(), Err(AgentError::Config(_))));

        let bad_rate = AgentConfig {
            learning_rate: 1.5,
            ..AgentConfig::default()
        };
        assert!(matches!(bad_rate.validate(), Err(AgentError::Bandit(_))));

        let never_save = AgentConfig {
            save_every: 0,
            ..AgentConfig::default()
        };
        assert!(never_save.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AgentConfig::from_file(Path::new("/nonexistent/fokuslern.json")).unwrap_err();
        assert!(matches!(err, AgentError::Io { .. }));
    }
}
