/// Dhikr entity and related functionality
///
/// A dhikr is a remembrance phrase with a target number of repetitions. Logs,
/// schedules and goals refer to it by id; deleting a dhikr does not cascade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{timestamp, DhikrCategory, DhikrId, DomainError};

/// A remembrance phrase the user repeats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dhikr {
    /// Unique identifier for this dhikr
    pub id: DhikrId,
    /// Optional short display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The phrase itself (required, non-empty)
    pub arabic_text: String,
    #[serde(default = "default_category")]
    pub category: DhikrCategory,
    /// Target repetitions per session
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    /// Virtue/reward text shown next to the counter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
    /// Where the phrase is narrated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Higher priority is shown first
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_date: Option<DateTime<Utc>>,
}

fn default_category() -> DhikrCategory {
    DhikrCategory::General
}

fn default_repetitions() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Input for creating a dhikr
///
/// Unset optional fields fall back to the store defaults (general category,
/// one repetition, priority 0, active, not a favorite).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDhikr {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub arabic_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DhikrCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl NewDhikr {
    /// Shorthand for the common case of a phrase with a repetition target
    pub fn new(arabic_text: impl Into<String>, category: DhikrCategory, repetitions: u32) -> Self {
        Self {
            arabic_text: arabic_text.into(),
            category: Some(category),
            repetitions: Some(repetitions),
            ..Self::default()
        }
    }

    /// Validate the input before it reaches the store
    pub fn validate(&self) -> Result<(), DomainError> {
        Dhikr::validate_text(&self.arabic_text)?;
        if let Some(repetitions) = self.repetitions {
            Dhikr::validate_repetitions(repetitions)?;
        }
        Ok(())
    }
}

/// Partial update for a dhikr; only `Some` fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DhikrPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DhikrCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl DhikrPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(ref text) = self.arabic_text {
            Dhikr::validate_text(text)?;
        }
        if let Some(repetitions) = self.repetitions {
            Dhikr::validate_repetitions(repetitions)?;
        }
        Ok(())
    }
}

impl Dhikr {
    /// Name to show in reminders: the short name when present, else the phrase
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.arabic_text)
    }

    /// Whether the library search query matches this dhikr.
    ///
    /// The phrase, reward and source are compared with Arabic diacritics
    /// removed from both sides, so an unvocalised query finds vocalised text.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = strip_diacritics(query.trim());
        if query.is_empty() {
            return true;
        }
        [Some(&self.arabic_text), self.reward.as_ref(), self.source.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| strip_diacritics(field).contains(&query))
    }

    fn validate_text(text: &str) -> Result<(), DomainError> {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidText("Dhikr text cannot be empty".to_string()));
        }

        if trimmed.chars().count() > 2000 {
            return Err(DomainError::InvalidText(
                "Dhikr text cannot be longer than 2000 characters".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_repetitions(repetitions: u32) -> Result<(), DomainError> {
        if repetitions == 0 {
            return Err(DomainError::InvalidValue {
                message: "Repetitions must be greater than 0".to_string(),
            });
        }
        if repetitions > 100_000 {
            return Err(DomainError::InvalidValue {
                message: "Repetitions cannot exceed 100000".to_string(),
            });
        }
        Ok(())
    }
}

/// Remove Arabic diacritics (harakat U+064B..U+065F and the superscript alef U+0670)
pub fn strip_diacritics(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{064B}'..='\u{065F}' | '\u{0670}'))
        .collect()
}
