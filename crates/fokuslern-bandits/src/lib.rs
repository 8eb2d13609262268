#![warn(clippy::unwrap_used, clippy::expect_used)]

//! ε-greedy Interventions-Policy für fokuslern.
//!
//! Der [`FocusBandit`] implementiert das [`Policy`](fokuslern_core::Policy)-Trait
//! über dem festen Aktionsvokabular. Mit Wahrscheinlichkeit `epsilon` wählt er
//! zufällig eine Aktion, sonst die Aktion mit dem höchsten gelernten Wert im
//! aktuellen Zustand. Für Zustände ohne gelernte Werte greift die
//! deterministische [`rules::fallback`]-Tabelle.
//!
//! Das Lernen ist ein einstufiges Update ohne Folgezustand:
//! `new = old + lr * (reward - old)`. Der `discount_factor` wird nur
//! mitgeführt und persistiert, das Update verwendet ihn nicht.

pub mod error;
pub mod rules;
pub mod table;
pub mod telemetry;

use fokuslern_core::{Action, Decision, DecisionBasis, Policy, State};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use error::{BanditError, Result};
pub use table::ValueTable;

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.9;
pub const DEFAULT_EPSILON: f64 = 0.3;
pub const DEFAULT_EPSILON_FLOOR: f64 = 0.1;
pub const DEFAULT_EPSILON_DECAY: f64 = 0.995;

/// Explorationsrate mit multiplikativem Zerfall bis zu einer Untergrenze.
///
/// Nach jedem Lernschritt gilt `epsilon = max(floor, epsilon * decay)`. Die
/// Folge fällt monoton und erreicht `floor`, nie 0 (sofern `floor > 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exploration {
    epsilon: f64,
    floor: f64,
    decay: f64,
}

impl Default for Exploration {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            floor: DEFAULT_EPSILON_FLOOR,
            decay: DEFAULT_EPSILON_DECAY,
        }
    }
}

impl Exploration {
    pub fn new(epsilon: f64, floor: f64, decay: f64) -> Result<Self> {
        check_unit("epsilon", epsilon)?;
        check_unit("epsilon_floor", floor)?;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(BanditError::InvalidParameter {
                name: "epsilon_decay",
                value: decay,
            });
        }
        Ok(Self {
            epsilon,
            floor,
            decay,
        })
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Setzt `epsilon` direkt, begrenzt auf `[0, 1]`. Nicht-endliche Werte
    /// werden ignoriert.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        if epsilon.is_finite() {
            self.epsilon = epsilon.clamp(0.0, 1.0);
        }
    }

    /// Übernimmt ein gespeichertes `epsilon`, begrenzt auf `[floor, 1]`.
    /// Nicht-endliche Werte werden ignoriert.
    pub fn restore_epsilon(&mut self, epsilon: f64) {
        if epsilon.is_finite() {
            self.epsilon = epsilon.clamp(self.floor, 1.0);
        }
    }

    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.decay).max(self.floor);
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BanditError::InvalidParameter { name, value })
    }
}

/// Persistierte Lernparameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    pub learning_rate: f64,
    /// Nur aus Kompatibilitätsgründen gespeichert; das Update nutzt ihn nicht.
    pub discount_factor: f64,
    pub epsilon: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Persistierbarer Zustand eines [`FocusBandit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditSnapshot {
    /// `<state key>|<action>` → Wert
    pub q_table: BTreeMap<String, f64>,
    pub learning_params: LearningParams,
}

/// ε-greedy Policy über dem Interventionsvokabular.
#[derive(Debug)]
pub struct FocusBandit {
    table: ValueTable,
    exploration: Exploration,
    learning_rate: f64,
    discount_factor: f64,
    rng: Mutex<StdRng>,
}

impl Default for FocusBandit {
    fn default() -> Self {
        Self {
            table: ValueTable::new(),
            exploration: Exploration::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl FocusBandit {
    pub fn new(learning_rate: f64, discount_factor: f64, exploration: Exploration) -> Result<Self> {
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(BanditError::InvalidParameter {
                name: "learning_rate",
                value: learning_rate,
            });
        }
        check_unit("discount_factor", discount_factor)?;
        Ok(Self {
            learning_rate,
            discount_factor,
            exploration,
            ..Self::default()
        })
    }

    /// Ersetzt den Zufallsgenerator durch einen deterministisch geseedeten.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    #[must_use]
    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.exploration.set_epsilon(epsilon);
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    #[must_use]
    pub fn params(&self) -> LearningParams {
        LearningParams {
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
            epsilon: self.exploration.epsilon(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> BanditSnapshot {
        BanditSnapshot {
            q_table: self.table.to_encoded(),
            learning_params: self.params(),
        }
    }

    /// Übernimmt Wertetabelle und `epsilon` aus einem Snapshot. Lernrate und
    /// Diskontfaktor bleiben wie konfiguriert.
    ///
    /// Nicht dekodierbare Einträge werden übersprungen und als Fehler
    /// zurückgegeben; der Rest wird geladen.
    pub fn restore(&mut self, snapshot: &BanditSnapshot) -> Vec<BanditError> {
        let mut table = ValueTable::new();
        let mut rejected = Vec::new();
        for (key, value) in &snapshot.q_table {
            if let Err(e) = table.insert_encoded(key, *value) {
                rejected.push(e);
            }
        }
        self.table = table;
        self.exploration.restore_epsilon(snapshot.learning_params.epsilon);
        rejected
    }

    fn explore(&self) -> Option<Action> {
        let mut rng = self.rng.lock();
        if rng.gen::<f64>() < self.exploration.epsilon() {
            Action::ALL.choose(&mut *rng).copied()
        } else {
            None
        }
    }
}

impl Policy for FocusBandit {
    /// Wählt eine Aktion per ε-greedy; ohne gelernte Werte per Regeltabelle.
    fn decide(&self, state: &State) -> Decision {
        let key = state.key();
        if let Some(action) = self.explore() {
            return Decision {
                action,
                why: DecisionBasis::Explore,
                value: self.table.row(&key).and_then(|row| row.get(&action).copied()),
            };
        }
        match self.table.best_action(&key) {
            Some((action, value)) => Decision {
                action,
                why: DecisionBasis::Exploit,
                value: Some(value),
            },
            None => Decision {
                action: rules::fallback(state),
                why: DecisionBasis::RuleFallback,
                value: None,
            },
        }
    }

    /// Aktualisiert den Wert für (state, action) und lässt `epsilon` zerfallen.
    fn feedback(&mut self, state: &State, action: Action, reward: f64) {
        let new_value = self
            .table
            .update(state.key(), action, reward, self.learning_rate);
        self.exploration.decay();
        telemetry::debug(format_args!(
            "value update: action={action} reward={reward:.2} new_value={new_value:.2} epsilon={:.3}",
            self.exploration.epsilon()
        ));
    }
}
