//! Canonical textual keys for states and value-table entries.
//!
//! A [`StateKey`] is the sorted list of `feature=value` pairs joined by `;`,
//! e.g. `app_switch_frequency=low;current_app_category=research;...`.
//! A [`ValueKey`] appends the action after a `|`. Both decode with a strict
//! parser, so persisted tables round-trip without evaluating anything.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::state::State;

const PAIR_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = '=';
const ACTION_SEPARATOR: char = '|';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed feature pair: {0:?}")]
    MalformedPair(String),
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
    #[error("feature listed twice: {0}")]
    DuplicateFeature(String),
    #[error("missing feature: {0}")]
    MissingFeature(&'static str),
    #[error("unknown {kind} value: {value:?}")]
    UnknownValue { kind: &'static str, value: String },
    #[error("value key without action: {0:?}")]
    MissingAction(String),
}

pub type Result<T> = std::result::Result<T, KeyError>;

/// Canonical, ordering-independent key of a [`State`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey(String);

impl StateKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the key back into its [`State`].
    pub fn state(&self) -> Result<State> {
        decode_state(&self.0)
    }
}

impl From<&State> for StateKey {
    fn from(state: &State) -> Self {
        let mut out = String::with_capacity(160);
        for (i, (name, value)) in state.features().iter().enumerate() {
            if i > 0 {
                out.push(PAIR_SEPARATOR);
            }
            out.push_str(name);
            out.push(VALUE_SEPARATOR);
            out.push_str(value);
        }
        StateKey(out)
    }
}

impl FromStr for StateKey {
    type Err = KeyError;

    /// Accepts the pairs in any order and normalizes to canonical form.
    fn from_str(s: &str) -> Result<Self> {
        decode_state(s).map(|state| state.key())
    }
}

impl TryFrom<String> for StateKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn decode_state(s: &str) -> Result<State> {
    let mut pairs: BTreeMap<&str, &str> = BTreeMap::new();
    for pair in s.split(PAIR_SEPARATOR) {
        let (name, value) = pair
            .split_once(VALUE_SEPARATOR)
            .ok_or_else(|| KeyError::MalformedPair(pair.to_string()))?;
        if pairs.insert(name, value).is_some() {
            return Err(KeyError::DuplicateFeature(name.to_string()));
        }
    }

    let mut take = |name: &'static str| pairs.remove(name).ok_or(KeyError::MissingFeature(name));
    let state = State {
        app_switch_frequency: take("app_switch_frequency")?.parse()?,
        app_category: take("current_app_category")?.parse()?,
        day_of_week: take("day_of_week")?.parse()?,
        recent_productivity: take("recent_productivity_score")?.parse()?,
        session_duration: take("session_duration_bin")?.parse()?,
        time_of_day: take("time_of_day_bin")?.parse()?,
    };

    if let Some(extra) = pairs.keys().next() {
        return Err(KeyError::UnknownFeature((*extra).to_string()));
    }
    Ok(state)
}

/// Composite (state, action) key of a value-table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueKey {
    pub state: StateKey,
    pub action: Action,
}

impl ValueKey {
    #[must_use]
    pub fn new(state: StateKey, action: Action) -> Self {
        Self { state, action }
    }

    /// Textual form used in persisted snapshots.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.state, ACTION_SEPARATOR, self.action)
    }
}

impl FromStr for ValueKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self> {
        let (state, action) = s
            .rsplit_once(ACTION_SEPARATOR)
            .ok_or_else(|| KeyError::MissingAction(s.to_string()))?;
        Ok(Self {
            state: state.parse()?,
            action: action.parse()?,
        })
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
