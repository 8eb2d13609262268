//! Deterministische Regeltabelle für Zustände ohne gelernte Werte.

use fokuslern_core::{Action, AppCategory, DurationBucket, Level, State};

/// Wertet die Regeln in fester Reihenfolge aus; die erste passende gewinnt.
///
/// 1. Unterhaltung/Social und lange Sitzung → `task_redirect`
/// 2. Recherche bei niedriger Produktivität → `gentle_reminder`
/// 3. Lange Sitzung bei hoher Produktivität → `break_suggestion`
/// 4. Entwicklung/Produktivität, Produktivität nicht niedrig → `no_intervention`
/// 5. sonst → `gentle_reminder`
#[must_use]
pub fn fallback(state: &State) -> Action {
    let category = state.app_category;
    let long = state.session_duration == DurationBucket::Long;
    let productivity = state.recent_productivity;

    if matches!(category, AppCategory::Entertainment | AppCategory::Social) && long {
        return Action::TaskRedirect;
    }
    if category == AppCategory::Research && productivity == Level::Low {
        return Action::GentleReminder;
    }
    if long && productivity == Level::High {
        return Action::BreakSuggestion;
    }
    if matches!(category, AppCategory::Development | AppCategory::Productivity)
        && productivity != Level::Low
    {
        return Action::NoIntervention;
    }
    Action::GentleReminder
}
