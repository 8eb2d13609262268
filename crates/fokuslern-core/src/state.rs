//! Discrete state abstraction.
//!
//! [`State::encode_at`] maps an [`Activity`] plus its [`ActivityContext`] and
//! a wall-clock instant onto six categorical features. The encoder has no
//! error conditions; every input is coerced.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::activity::{Activity, ActivityContext};
use crate::key::StateKey;

labelled! {
    /// Application category, assigned by keyword match.
    pub enum AppCategory {
        Development => "development",
        Design => "design",
        Productivity => "productivity",
        Communication => "communication",
        Research => "research",
        Entertainment => "entertainment",
        Social => "social",
        Unknown => "unknown",
    }
}

/// Keyword lists per category. Order matters: the first category with a
/// matching keyword wins.
const CATEGORY_KEYWORDS: &[(AppCategory, &[&str])] = &[
    (
        AppCategory::Development,
        &["vscode", "visual studio", "pycharm", "atom", "sublime"],
    ),
    (
        AppCategory::Design,
        &["photoshop", "illustrator", "figma", "sketch", "canva"],
    ),
    (
        AppCategory::Productivity,
        &["word", "excel", "powerpoint", "notion", "todoist"],
    ),
    (
        AppCategory::Communication,
        &["outlook", "teams", "slack", "zoom", "skype"],
    ),
    (AppCategory::Research, &["chrome", "firefox", "edge"]),
    (
        AppCategory::Entertainment,
        &["youtube", "netflix", "spotify", "steam", "discord"],
    ),
    (
        AppCategory::Social,
        &["facebook", "twitter", "instagram", "reddit", "tiktok"],
    ),
];

impl AppCategory {
    /// Case-insensitive substring classification of an application name.
    #[must_use]
    pub fn classify(app_name: &str) -> Self {
        let lower = app_name.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map_or(AppCategory::Unknown, |(category, _)| *category)
    }
}

labelled! {
    pub enum TimeBucket {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        Night => "night",
    }
}

impl TimeBucket {
    /// morning `[6,12)`, afternoon `[12,17)`, evening `[17,22)`, night otherwise.
    #[must_use]
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            6..=11 => TimeBucket::Morning,
            12..=16 => TimeBucket::Afternoon,
            17..=21 => TimeBucket::Evening,
            _ => TimeBucket::Night,
        }
    }
}

labelled! {
    pub enum Weekday {
        Monday => "monday",
        Tuesday => "tuesday",
        Wednesday => "wednesday",
        Thursday => "thursday",
        Friday => "friday",
        Saturday => "saturday",
        Sunday => "sunday",
    }
}

impl From<time::Weekday> for Weekday {
    fn from(day: time::Weekday) -> Self {
        match day {
            time::Weekday::Monday => Weekday::Monday,
            time::Weekday::Tuesday => Weekday::Tuesday,
            time::Weekday::Wednesday => Weekday::Wednesday,
            time::Weekday::Thursday => Weekday::Thursday,
            time::Weekday::Friday => Weekday::Friday,
            time::Weekday::Saturday => Weekday::Saturday,
            time::Weekday::Sunday => Weekday::Sunday,
        }
    }
}

labelled! {
    pub enum DurationBucket {
        Short => "short",
        Medium => "medium",
        Long => "long",
    }
}

impl DurationBucket {
    /// `<5` short, `<20` medium, long otherwise.
    #[must_use]
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes < 5.0 {
            DurationBucket::Short
        } else if minutes < 20.0 {
            DurationBucket::Medium
        } else {
            DurationBucket::Long
        }
    }
}

labelled! {
    /// Three-level bucket shared by productivity and switch frequency.
    pub enum Level {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Level {
    /// `<0.3` low, `<0.7` medium, high otherwise.
    #[must_use]
    pub fn from_productivity(ratio: f64) -> Self {
        if ratio < 0.3 {
            Level::Low
        } else if ratio < 0.7 {
            Level::Medium
        } else {
            Level::High
        }
    }

    /// `<3` low, `<8` medium, high otherwise.
    #[must_use]
    pub fn from_switches(switches: u32) -> Self {
        if switches < 3 {
            Level::Low
        } else if switches < 8 {
            Level::Medium
        } else {
            Level::High
        }
    }
}

/// Discretized snapshot of the user's situation. Immutable once built.
///
/// Field names double as the feature names of the canonical [`StateKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "current_app_category")]
    pub app_category: AppCategory,
    #[serde(rename = "time_of_day_bin")]
    pub time_of_day: TimeBucket,
    pub day_of_week: Weekday,
    #[serde(rename = "session_duration_bin")]
    pub session_duration: DurationBucket,
    #[serde(rename = "recent_productivity_score")]
    pub recent_productivity: Level,
    pub app_switch_frequency: Level,
}

impl State {
    /// Encodes an observation taken at `at` (hour and weekday are read from
    /// `at` as given, so pass local time).
    #[must_use]
    pub fn encode_at(activity: &Activity, ctx: &ActivityContext, at: OffsetDateTime) -> Self {
        Self {
            app_category: AppCategory::classify(&activity.app_name),
            time_of_day: TimeBucket::from_hour(at.hour()),
            day_of_week: at.weekday().into(),
            session_duration: DurationBucket::from_minutes(activity.duration()),
            recent_productivity: Level::from_productivity(ctx.productivity()),
            app_switch_frequency: Level::from_switches(ctx.app_switches_last_hour),
        }
    }

    /// Encodes an observation taken now, in local time.
    #[must_use]
    pub fn encode(activity: &Activity, ctx: &ActivityContext) -> Self {
        Self::encode_at(activity, ctx, crate::now_local())
    }

    /// Feature name/value pairs sorted by feature name.
    #[must_use]
    pub fn features(&self) -> [(&'static str, &'static str); 6] {
        [
            ("app_switch_frequency", self.app_switch_frequency.as_str()),
            ("current_app_category", self.app_category.as_str()),
            ("day_of_week", self.day_of_week.as_str()),
            ("recent_productivity_score", self.recent_productivity.as_str()),
            ("session_duration_bin", self.session_duration.as_str()),
            ("time_of_day_bin", self.time_of_day.as_str()),
        ]
    }

    #[must_use]
    pub fn key(&self) -> StateKey {
        StateKey::from(self)
    }
}
