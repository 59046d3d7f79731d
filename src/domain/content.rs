/// Display-only records: Islamic content cards and crescent sightings

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{timestamp, ContentId, ContentType, SightingId};

/// A hadith, tafsir excerpt or similar text shown on content cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslamicContent {
    pub id: ContentId,
    pub title: String,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIslamicContent {
    pub title: String,
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tags: Vec<String>,
}

/// A user-recorded sighting of the new crescent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrescentSighting {
    pub id: SightingId,
    pub gregorian_date: NaiveDate,
    /// Hijri month name as displayed by the calendar
    pub hijri_month: String,
    pub hijri_year: i32,
    #[serde(default = "default_true")]
    pub is_sighted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCrescentSighting {
    pub gregorian_date: NaiveDate,
    pub hijri_month: String,
    pub hijri_year: i32,
    pub is_sighted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}
