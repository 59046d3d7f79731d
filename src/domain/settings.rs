/// UserSettings: the single per-installation settings record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{timestamp, SettingsId};

/// Default location (Karbala) used for prayer-time display until the user sets one
pub const DEFAULT_LATITUDE: f64 = 32.6027;
pub const DEFAULT_LONGITUDE: f64 = 44.0197;
/// Default twilight angles in degrees
pub const DEFAULT_FAJR_ANGLE: f64 = 12.0;
pub const DEFAULT_MAGHRIB_ANGLE: f64 = 6.0;

/// Location, calendar and notification preferences plus the legacy streak counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: SettingsId,
    pub latitude: f64,
    pub longitude: f64,
    pub fajr_angle: f64,
    pub maghrib_angle: f64,
    /// Day offset applied to the computed Hijri date
    #[serde(default)]
    pub hijri_adjustment: i32,
    #[serde(default = "default_true")]
    pub notification_enabled: bool,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_date: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Partial update for the settings record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fajr_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maghrib_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hijri_adjustment: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_streak: Option<u32>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), crate::domain::DomainError> {
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(crate::domain::DomainError::InvalidValue {
                    message: format!("Latitude must be between -90 and 90, got {}", lat),
                });
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(crate::domain::DomainError::InvalidValue {
                    message: format!("Longitude must be between -180 and 180, got {}", lon),
                });
            }
        }
        Ok(())
    }
}

impl UserSettings {
    /// Streak bookkeeping after a full completion: bump the counter and keep
    /// the best-ever value in step.
    pub fn streak_after_completion(&self) -> SettingsPatch {
        let current = self.current_streak.saturating_add(1);
        SettingsPatch {
            current_streak: Some(current),
            longest_streak: Some(self.longest_streak.max(current)),
            ..SettingsPatch::default()
        }
    }
}
