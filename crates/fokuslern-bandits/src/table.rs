//! Wertetabelle (state, action) → geschätzter Nutzen.
//!
//! Fehlende Einträge gelten als 0. Die Tabelle wächst über die Lebensdauer
//! des Agenten und verdrängt keine Einträge.

use std::collections::{BTreeMap, HashMap};

use fokuslern_core::{Action, StateKey, ValueKey};

use crate::error::{BanditError, Result};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueTable {
    entries: HashMap<StateKey, BTreeMap<Action, f64>>,
}

impl ValueTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wert für (state, action), 0 wenn unbekannt.
    #[must_use]
    pub fn get(&self, state: &StateKey, action: Action) -> f64 {
        self.entries
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Alle gelernten Werte eines Zustands in Vokabular-Reihenfolge.
    #[must_use]
    pub fn row(&self, state: &StateKey) -> Option<&BTreeMap<Action, f64>> {
        self.entries.get(state).filter(|row| !row.is_empty())
    }

    /// Aktion mit dem höchsten Wert. Bei Gleichstand gewinnt die im
    /// Vokabular zuerst deklarierte Aktion.
    #[must_use]
    pub fn best_action(&self, state: &StateKey) -> Option<(Action, f64)> {
        best_of(self.row(state)?)
    }

    /// `new = old + lr * (reward - old)`; gibt den neuen Wert zurück.
    pub fn update(&mut self, state: StateKey, action: Action, reward: f64, learning_rate: f64) -> f64 {
        let slot = self
            .entries
            .entry(state)
            .or_default()
            .entry(action)
            .or_insert(0.0);
        *slot += learning_rate * (reward - *slot);
        *slot
    }

    pub fn insert(&mut self, key: ValueKey, value: f64) {
        self.entries
            .entry(key.state)
            .or_default()
            .insert(key.action, value);
    }

    /// Dekodiert einen persistierten Schlüssel und übernimmt den Wert.
    pub fn insert_encoded(&mut self, key: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(BanditError::NonFiniteValue {
                key: key.to_string(),
                value,
            });
        }
        let key: ValueKey = key.parse()?;
        self.insert(key, value);
        Ok(())
    }

    /// Anzahl unterschiedlicher Zustände.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.entries.len()
    }

    /// Anzahl (state, action)-Einträge.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Mittelwert über alle Einträge, 0 für eine leere Tabelle.
    #[must_use]
    pub fn mean_value(&self) -> f64 {
        let count = self.entry_count();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self.entries.values().flat_map(BTreeMap::values).sum();
        #[allow(clippy::cast_precision_loss)]
        {
            sum / count as f64
        }
    }

    /// Beste Aktion je Zustand.
    pub fn best_per_state(&self) -> impl Iterator<Item = (&StateKey, Action, f64)> + '_ {
        self.entries
            .iter()
            .filter_map(|(state, row)| best_of(row).map(|(action, value)| (state, action, value)))
    }

    /// Textuelle Form für Snapshots, sortiert nach Schlüssel.
    #[must_use]
    pub fn to_encoded(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .flat_map(|(state, row)| {
                row.iter()
                    .map(move |(action, value)| (ValueKey::new(state.clone(), *action).encode(), *value))
            })
            .collect()
    }
}

fn best_of(row: &BTreeMap<Action, f64>) -> Option<(Action, f64)> {
    let mut best: Option<(Action, f64)> = None;
    for (action, value) in row {
        match best {
            Some((_, current)) if *value <= current => {}
            _ => best = Some((*action, *value)),
        }
    }
    best
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::expect_used)]
mod tests {
    use super::*;
    use fokuslern_core::{AppCategory, DurationBucket, Level, State, TimeBucket, Weekday};

    fn key(category: AppCategory) -> StateKey {
        State {
            app_category: category,
            time_of_day: TimeBucket::Afternoon,
            day_of_week: Weekday::Tuesday,
            session_duration: DurationBucket::Short,
            recent_productivity: Level::Medium,
            app_switch_frequency: Level::Low,
        }
        .key()
    }

    #[test]
    fn unseen_pairs_default_to_zero() {
        let table = ValueTable::new();
        assert_eq!(table.get(&key(AppCategory::Design), Action::TaskRedirect), 0.0);
        assert!(table.best_action(&key(AppCategory::Design)).is_none());
        assert_eq!(table.mean_value(), 0.0);
    }

    #[test]
    fn update_moves_toward_reward_by_learning_rate() {
        let mut table = ValueTable::new();
        let k = key(AppCategory::Social);
        let first = table.update(k.clone(), Action::TaskRedirect, 2.0, 0.1);
        assert!((first - 0.2).abs() < 1e-12);
        let second = table.update(k.clone(), Action::TaskRedirect, 2.0, 0.1);
        assert!((second - (0.2 + 0.1 * (2.0 - 0.2))).abs() < 1e-12);
        // reward equal to old value leaves it unchanged
        let same = table.update(k.clone(), Action::TaskRedirect, second, 0.1);
        assert_eq!(same, second);
    }

    #[test]
    fn best_action_breaks_ties_by_vocabulary_order() {
        let mut table = ValueTable::new();
        let k = key(AppCategory::Research);
        table.insert(ValueKey::new(k.clone(), Action::ProductivityTip), 0.5);
        table.insert(ValueKey::new(k.clone(), Action::GentleReminder), 0.5);
        table.insert(ValueKey::new(k.clone(), Action::BlockSuggestion), -1.0);
        assert_eq!(table.best_action(&k), Some((Action::GentleReminder, 0.5)));
    }

    #[test]
    fn negative_only_rows_still_have_a_best_action() {
        let mut table = ValueTable::new();
        let k = key(AppCategory::Unknown);
        table.insert(ValueKey::new(k.clone(), Action::BlockSuggestion), -1.5);
        table.insert(ValueKey::new(k.clone(), Action::BreakSuggestion), -0.4);
        assert_eq!(table.best_action(&k), Some((Action::BreakSuggestion, -0.4)));
    }

    #[test]
    fn encoded_form_roundtrips() {
        let mut table = ValueTable::new();
        table.update(key(AppCategory::Social), Action::TaskRedirect, 1.0, 0.1);
        table.update(key(AppCategory::Design), Action::NoIntervention, -0.5, 0.1);

        let mut restored = ValueTable::new();
        for (k, v) in table.to_encoded() {
            restored.insert_encoded(&k, v).expect("valid key");
        }
        assert_eq!(restored, table);
        assert_eq!(restored.state_count(), 2);
        assert_eq!(restored.entry_count(), 2);
    }

    #[test]
    fn insert_encoded_rejects_bad_input() {
        let mut table = ValueTable::new();
        assert!(matches!(
            table.insert_encoded("bogus", 1.0),
            Err(BanditError::Key(_))
        ));
        let good = ValueKey::new(key(AppCategory::Design), Action::GentleReminder).encode();
        assert!(matches!(
            table.insert_encoded(&good, f64::NAN),
            Err(BanditError::NonFiniteValue { .. })
        ));
        assert!(table.is_empty());
    }
}
