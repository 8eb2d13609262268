//! Datenstrukturen für beobachtete Aktivitäten und deren Kontext.
//!
//! Eine [`Activity`] beschreibt, was der Nutzer gerade tut (Anwendung,
//! Fenstertitel, Dauer). Der [`ActivityContext`] liefert die aggregierten
//! Kennzahlen der Sitzungsbuchhaltung, die außerhalb dieses Crates berechnet
//! werden. Beide Strukturen sind tolerant: fehlende Felder erhalten
//! dokumentierte Standardwerte, damit der Zustandsencoder nie scheitert.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Standardwert für die jüngste Produktivitätsquote, falls nicht geliefert.
pub const DEFAULT_RECENT_PRODUCTIVITY: f64 = 0.5;

/// Eine einzelne Aktivitätsbeobachtung.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    /// Name der Anwendung im Vordergrund, z. B. "Code" oder "youtube".
    #[serde(default, alias = "app")]
    pub app_name: String,
    /// Freitext-Fenstertitel. Fließt nicht in den Zustand ein, wird aber mit
    /// der Intervention gespeichert.
    #[serde(default, alias = "title")]
    pub window_title: String,
    /// Einschätzung des Aufrufers, ob die Aktivität produktiv ist.
    #[serde(default)]
    pub is_productive: bool,
    /// Bisherige Dauer der aktuellen Sitzung in Minuten.
    #[serde(default, alias = "duration")]
    pub duration_minutes: f64,
}

/// Kontextkennzahlen zur Aktivität.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityContext {
    /// Anteil produktiver Aktivitäten im jüngsten Fenster, in `[0, 1]`.
    #[serde(
        default = "default_recent_productivity",
        alias = "recent_productivity_score"
    )]
    pub recent_productivity: f64,
    /// Anzahl der Anwendungswechsel in der letzten Stunde. Akzeptiert auch
    /// Gleitkommazahlen (gerundet), negative Werte und `null` (beides 0).
    #[serde(
        default,
        alias = "switches_last_hour",
        deserialize_with = "lenient_count"
    )]
    pub app_switches_last_hour: u32,
}

fn default_recent_productivity() -> f64 {
    DEFAULT_RECENT_PRODUCTIVITY
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a count")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            Ok(u32::try_from(v).unwrap_or(u32::MAX))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            Ok(u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            // `as` saturiert; NaN wird zu 0.
            Ok(v.round().max(0.0) as u32)
        }

        fn visit_unit<E: de::Error>(self) -> Result<u32, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<u32, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

impl Default for ActivityContext {
    fn default() -> Self {
        Self {
            recent_productivity: DEFAULT_RECENT_PRODUCTIVITY,
            app_switches_last_hour: 0,
        }
    }
}

impl Activity {
    /// Dauer in Minuten; negative oder nicht-endliche Werte zählen als 0.
    #[must_use]
    pub fn duration(&self) -> f64 {
        if self.duration_minutes.is_finite() && self.duration_minutes > 0.0 {
            self.duration_minutes
        } else {
            0.0
        }
    }
}

impl ActivityContext {
    /// Produktivitätsquote; nicht-endliche Werte fallen auf den Standardwert
    /// zurück.
    #[must_use]
    pub fn productivity(&self) -> f64 {
        if self.recent_productivity.is_finite() {
            self.recent_productivity
        } else {
            DEFAULT_RECENT_PRODUCTIVITY
        }
    }
}
