//! Model snapshot on disk.
//!
//! Format (JSON):
//!
//! ```json
//! {
//!   "q_table": { "<state key>|<action>": 0.42, ... },
//!   "feedback_history": [ { "state": {...}, "action": "...", "reward": 1.0, ... } ],
//!   "learning_params": { "learning_rate": 0.1, "discount_factor": 0.9, "epsilon": 0.3 },
//!   "timestamp": "2024-05-06T09:00:00Z"
//! }
//! ```
//!
//! The snapshot is written wholesale. On load, value-table and history
//! entries are decoded one by one; entries that do not decode are skipped
//! with a warning.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fokuslern_bandits::{telemetry, BanditSnapshot, LearningParams};
use fokuslern_feedback::FeedbackEntry;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub q_table: BTreeMap<String, f64>,
    #[serde(default)]
    pub feedback_history: Vec<FeedbackEntry>,
    #[serde(default)]
    pub learning_params: LearningParams,
    #[serde(default)]
    pub timestamp: String,
}

impl ModelSnapshot {
    /// Combines policy state with the newest `history_limit` feedback entries.
    #[must_use]
    pub fn new(
        bandit: BanditSnapshot,
        mut feedback_history: Vec<FeedbackEntry>,
        history_limit: usize,
        timestamp: String,
    ) -> Self {
        let excess = feedback_history.len().saturating_sub(history_limit);
        feedback_history.drain(..excess);
        Self {
            q_table: bandit.q_table,
            feedback_history,
            learning_params: bandit.learning_params,
            timestamp,
        }
    }

    #[must_use]
    pub fn bandit(&self) -> BanditSnapshot {
        BanditSnapshot {
            q_table: self.q_table.clone(),
            learning_params: self.learning_params,
        }
    }
}

/// On-disk form with entries not yet decoded.
#[derive(Debug, Deserialize)]
struct StoredSnapshot {
    #[serde(default)]
    q_table: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    feedback_history: Vec<serde_json::Value>,
    #[serde(default)]
    learning_params: LearningParams,
    #[serde(default)]
    timestamp: String,
}

impl From<StoredSnapshot> for ModelSnapshot {
    fn from(stored: StoredSnapshot) -> Self {
        let mut q_table = BTreeMap::new();
        for (key, raw) in stored.q_table {
            match raw.as_f64() {
                Some(value) => {
                    q_table.insert(key, value);
                }
                None => telemetry::warn(format_args!("skipping value for {key}: not a number: {raw}")),
            }
        }

        let mut feedback_history = Vec::with_capacity(stored.feedback_history.len());
        for (idx, raw) in stored.feedback_history.into_iter().enumerate() {
            match serde_json::from_value::<FeedbackEntry>(raw) {
                Ok(entry) => feedback_history.push(entry),
                Err(e) => telemetry::warn(format_args!("skipping feedback entry {idx}: {e}")),
            }
        }

        Self {
            q_table,
            feedback_history,
            learning_params: stored.learning_params,
            timestamp: stored.timestamp,
        }
    }
}

/// JSON file holding the [`ModelSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot, creating parent directories as needed. The file
    /// is replaced by rename so a crash mid-write leaves the old snapshot.
    pub fn save(&self, snapshot: &ModelSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AgentError::io(parent, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let file = File::create(&tmp).map_err(|e| AgentError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot)?;
        writer.flush().map_err(|e| AgentError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| AgentError::io(&self.path, e))?;
        Ok(())
    }

    /// `Ok(None)` when no snapshot exists yet.
    pub fn load(&self) -> Result<Option<ModelSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(|e| AgentError::io(&self.path, e))?;
        let stored: StoredSnapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(stored.into()))
    }

    /// Deletes the snapshot; `Ok(false)` if there was none.
    pub fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| AgentError::io(&self.path, e))?;
        Ok(true)
    }
}
