#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Core types for fokuslern.
//!
//! Raw activity observations are turned into a discrete [`State`], policies
//! map states to one of the fixed [`Action`]s, and explicit user feedback is
//! condensed into a bounded scalar reward by [`Feedback::reward`].

/// Declares a closed vocabulary enum with a stable textual label per variant.
///
/// Declaration order is the tie-break order everywhere a deterministic
/// choice between variants is needed.
macro_rules! labelled {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err($crate::KeyError::UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod action;
pub mod activity;
pub mod key;
pub mod reward;
pub mod state;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub use action::Action;
pub use activity::{Activity, ActivityContext};
pub use key::{KeyError, StateKey, ValueKey};
pub use reward::{Feedback, UserAction};
pub use state::{AppCategory, DurationBucket, Level, State, TimeBucket, Weekday};

/// Fallback timestamp when formatting fails
pub const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// How a policy arrived at its decision.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// Uniform random pick (ε branch).
    Explore,
    /// Highest learned value for the state.
    Exploit,
    /// No learned values yet, deterministic rule table.
    RuleFallback,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub why: DecisionBasis,
    /// Learned value of `action` in the decided state, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

pub trait Policy {
    fn decide(&self, state: &State) -> Decision;
    fn feedback(&mut self, state: &State, action: Action, reward: f64);
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
#[must_use]
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// RFC 3339 rendering used for every persisted timestamp.
#[must_use]
pub fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}
