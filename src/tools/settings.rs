/// Reading and changing the settings record

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use crate::domain::{SettingsPatch, UserSettings};
use crate::storage::{RecordStore, SettingsRepository};
use crate::tools::ToolError;

/// Settings to change; omitted fields keep their value
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateSettingsParams {
    /// Latitude in degrees, -90 to 90
    pub latitude: Option<f64>,
    /// Longitude in degrees, -180 to 180
    pub longitude: Option<f64>,
    /// Sun depression angle for Fajr
    pub fajr_angle: Option<f64>,
    /// Sun depression angle for Maghrib
    pub maghrib_angle: Option<f64>,
    /// Days added to the computed Hijri date
    pub hijri_adjustment: Option<i32>,
    pub notification_enabled: Option<bool>,
}

pub fn get_settings<S: RecordStore>(storage: &S) -> Result<UserSettings, ToolError> {
    Ok(storage.get_or_create_settings()?)
}

/// Apply the given changes, creating the settings record if there is none yet
pub fn update_settings<S: RecordStore>(storage: &S, params: UpdateSettingsParams) -> Result<UserSettings, ToolError> {
    let patch = SettingsPatch {
        latitude: params.latitude,
        longitude: params.longitude,
        fajr_angle: params.fajr_angle,
        maghrib_angle: params.maghrib_angle,
        hijri_adjustment: params.hijri_adjustment,
        notification_enabled: params.notification_enabled,
        ..SettingsPatch::default()
    };
    patch.validate()?;

    let settings = storage.save_settings(&patch)?;
    info!("Updated settings {}", settings.id);
    Ok(settings)
}
