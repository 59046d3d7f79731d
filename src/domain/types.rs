/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier newtypes, calendar helpers and the small
/// enums (categories, methods, schedule kinds) shared by every entity.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Declares a UUID-backed identifier newtype for one entity type.
///
/// Each entity gets its own id type so a goal id can never be passed where a
/// dhikr id is expected. Ids serialize as the hyphenated lowercase UUID string.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id that arrived as text.
            ///
            /// Surrounding whitespace is ignored and both the hyphenated and the
            /// simple UUID forms are accepted in any letter case, so two spellings
            /// of the same id compare equal once parsed.
            pub fn parse(s: &str) -> Result<Self, DomainError> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| DomainError::InvalidId(s.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a dhikr phrase
    DhikrId
);
entity_id!(
    /// Unique identifier for a dhikr completion log
    DhikrLogId
);
entity_id!(
    /// Unique identifier for a dhikr schedule
    ScheduleId
);
entity_id!(
    /// Unique identifier for a goal
    GoalId
);
entity_id!(
    /// Unique identifier for an Islamic content record
    ContentId
);
entity_id!(
    /// Unique identifier for the user settings record
    SettingsId
);
entity_id!(
    /// Unique identifier for a crescent sighting
    SightingId
);

/// Today's calendar date.
///
/// Calendar-day logic (streaks, monthly rollover, log upserts) uses UTC dates
/// unless the caller supplies an explicit local date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(format!("expected YYYY-MM-DD, got '{}'", s)))
}

/// Serde helpers for entity timestamps.
///
/// Timestamps are written as RFC 3339 UTC with a fixed microsecond precision so
/// that comparing two stored strings orders them chronologically.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_str(&super::format(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}

/// A calendar month, stored as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidDate(format!("month must be 1-12, got {}", month)));
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidDate(format!("expected YYYY-MM, got '{}'", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Categories for organizing dhikr in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DhikrCategory {
    /// Morning remembrance (adhkar al-sabah)
    Morning,
    /// Evening remembrance (adhkar al-masa)
    Evening,
    AfterPrayer,
    BeforeSleep,
    General,
    Quran,
    Salawat,
    Tasbih,
    Dua,
    Ziyarah,
}

impl DhikrCategory {
    pub const ALL: [DhikrCategory; 10] = [
        DhikrCategory::Morning,
        DhikrCategory::Evening,
        DhikrCategory::AfterPrayer,
        DhikrCategory::BeforeSleep,
        DhikrCategory::General,
        DhikrCategory::Quran,
        DhikrCategory::Salawat,
        DhikrCategory::Tasbih,
        DhikrCategory::Dua,
        DhikrCategory::Ziyarah,
    ];

    /// Get the storage/wire name for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            DhikrCategory::Morning => "morning",
            DhikrCategory::Evening => "evening",
            DhikrCategory::AfterPrayer => "after_prayer",
            DhikrCategory::BeforeSleep => "before_sleep",
            DhikrCategory::General => "general",
            DhikrCategory::Quran => "quran",
            DhikrCategory::Salawat => "salawat",
            DhikrCategory::Tasbih => "tasbih",
            DhikrCategory::Dua => "dua",
            DhikrCategory::Ziyarah => "ziyarah",
        }
    }
}

impl FromStr for DhikrCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| DomainError::Validation {
                message: format!(
                    "Invalid category '{}'. Valid options: {}",
                    s,
                    Self::ALL.map(|c| c.as_str()).join(", ")
                ),
            })
    }
}

/// How the repetitions of a session were counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountMethod {
    #[default]
    Manual,
    Voice,
    AutoTimer,
}

impl FromStr for CountMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(CountMethod::Manual),
            "voice" => Ok(CountMethod::Voice),
            "auto_timer" => Ok(CountMethod::AutoTimer),
            other => Err(DomainError::Validation {
                message: format!("Invalid method '{}'. Valid options: manual, voice, auto_timer", other),
            }),
        }
    }
}

/// Recurrence pattern of a dhikr schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    Daily,
    Weekly,
    PrayerTime,
    Monthly,
}

impl FromStr for ScheduleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ScheduleType::Daily),
            "weekly" => Ok(ScheduleType::Weekly),
            "prayer_time" => Ok(ScheduleType::PrayerTime),
            "monthly" => Ok(ScheduleType::Monthly),
            other => Err(DomainError::Validation {
                message: format!(
                    "Invalid schedule type '{}'. Valid options: daily, weekly, prayer_time, monthly",
                    other
                ),
            }),
        }
    }
}

/// The five daily prayer slots a schedule can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrayerSlot {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl FromStr for PrayerSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fajr" => Ok(PrayerSlot::Fajr),
            "dhuhr" => Ok(PrayerSlot::Dhuhr),
            "asr" => Ok(PrayerSlot::Asr),
            "maghrib" => Ok(PrayerSlot::Maghrib),
            "isha" => Ok(PrayerSlot::Isha),
            other => Err(DomainError::Validation {
                message: format!("Invalid prayer slot '{}'", other),
            }),
        }
    }
}

/// Kinds of Islamic content shown on content cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Hadith,
    Tafsir,
    Fiqh,
    Wisdom,
    Biography,
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hadith" => Ok(ContentType::Hadith),
            "tafsir" => Ok(ContentType::Tafsir),
            "fiqh" => Ok(ContentType::Fiqh),
            "wisdom" => Ok(ContentType::Wisdom),
            "biography" => Ok(ContentType::Biography),
            other => Err(DomainError::Validation {
                message: format!(
                    "Invalid content type '{}'. Valid options: hadith, tafsir, fiqh, wisdom, biography",
                    other
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_normalizes_spelling() {
        let id = DhikrId::new();
        let upper = id.to_string().to_uppercase();
        let simple = id.0.simple().to_string();

        assert_eq!(DhikrId::parse(&upper).unwrap(), id);
        assert_eq!(DhikrId::parse(&format!("  {}  ", simple)).unwrap(), id);
        assert!(DhikrId::parse("7").is_err());
    }

    #[test]
    fn test_month_key_round_trip_and_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let key = MonthKey::of(date);
        assert_eq!(key.to_string(), "2024-05");
        assert_eq!("2024-05".parse::<MonthKey>().unwrap(), key);
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("May 2024".parse::<MonthKey>().is_err());

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-05\"");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("after_prayer".parse::<DhikrCategory>().unwrap(), DhikrCategory::AfterPrayer);
        assert_eq!(" Tasbih ".parse::<DhikrCategory>().unwrap(), DhikrCategory::Tasbih);
        assert!("health".parse::<DhikrCategory>().is_err());
    }
}
