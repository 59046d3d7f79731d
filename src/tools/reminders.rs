/// Reminder polling for the notification collaborator
///
/// The client polls once a minute; nothing is scheduled server-side.

use chrono::{NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DhikrId, DomainError, PrayerSlot, ScheduleId};
use crate::storage::{DhikrRepository, RecordStore, ScheduleRepository, SettingsRepository};
use crate::tools::{parse_opt, ToolError};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RemindersParams {
    /// Local date and time to check, YYYY-MM-DDTHH:MM (defaults to now, UTC)
    pub at: Option<String>,
    /// The prayer slot currently in effect, for prayer_time schedules
    pub current_prayer: Option<String>,
}

/// A reminder that should fire now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    pub schedule_id: ScheduleId,
    pub dhikr_id: DhikrId,
    /// The dhikr's short name, or its text when it has none
    pub title: String,
    pub repetitions: u32,
}

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub notifications_enabled: bool,
    pub reminders: Vec<Reminder>,
}

/// Reminders due at the given minute.
///
/// Nothing is due while notifications are off. Schedules of deleted or
/// inactive dhikr are skipped.
pub fn reminders_due<S: RecordStore>(storage: &S, params: RemindersParams) -> Result<RemindersResponse, ToolError> {
    let now = match params.at.as_deref() {
        Some(at) => NaiveDateTime::parse_from_str(at.trim(), "%Y-%m-%dT%H:%M").map_err(|_| {
            DomainError::InvalidDate(format!("expected YYYY-MM-DDTHH:MM, got '{}'", at))
        })?,
        None => Utc::now().naive_utc(),
    };
    let current_prayer = parse_opt::<PrayerSlot>(params.current_prayer.as_deref())?;

    let settings = storage.get_or_create_settings()?;
    if !settings.notification_enabled {
        return Ok(RemindersResponse { notifications_enabled: false, reminders: Vec::new() });
    }

    let mut reminders = Vec::new();
    for schedule in storage.list_schedules()? {
        if !schedule.reminder_due(now, current_prayer) {
            continue;
        }
        match storage.get_dhikr(schedule.dhikr_id)? {
            Some(dhikr) if dhikr.is_active => reminders.push(Reminder {
                schedule_id: schedule.id,
                dhikr_id: dhikr.id,
                title: dhikr.display_name().to_string(),
                repetitions: dhikr.repetitions,
            }),
            _ => debug!("Skipping schedule {} of missing or inactive dhikr", schedule.id),
        }
    }

    Ok(RemindersResponse { notifications_enabled: true, reminders })
}
