/// DhikrSchedule entity: recurrence and reminder metadata for one dhikr

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{timestamp, DhikrId, DomainError, PrayerSlot, ScheduleId, ScheduleType};

/// When a dhikr should be recited and whether to remind the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DhikrSchedule {
    pub id: ScheduleId,
    pub dhikr_id: DhikrId,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    /// Used when `schedule_type` is weekly
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    /// Used when `schedule_type` is prayer_time
    #[serde(default)]
    pub prayer_times: Vec<PrayerSlot>,
    /// Optional minute of the day to remind at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<NaiveTime>,
    #[serde(default = "default_true")]
    pub reminder_enabled: bool,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_date: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Input for creating a schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDhikrSchedule {
    pub dhikr_id: DhikrId,
    pub schedule_type: ScheduleType,
    pub days_of_week: Vec<Weekday>,
    pub prayer_times: Vec<PrayerSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<NaiveTime>,
    pub reminder_enabled: bool,
}

impl NewDhikrSchedule {
    /// A daily schedule with reminders on
    pub fn daily(dhikr_id: DhikrId) -> Self {
        Self {
            dhikr_id,
            schedule_type: ScheduleType::Daily,
            days_of_week: Vec::new(),
            prayer_times: Vec::new(),
            time_of_day: None,
            reminder_enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self.schedule_type {
            ScheduleType::Weekly if self.days_of_week.is_empty() => Err(DomainError::Validation {
                message: "Weekly schedule must specify at least one day".to_string(),
            }),
            ScheduleType::PrayerTime if self.prayer_times.is_empty() => Err(DomainError::Validation {
                message: "Prayer-time schedule must specify at least one prayer".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Partial update for a schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<ScheduleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<Weekday>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prayer_times: Option<Vec<PrayerSlot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_enabled: Option<bool>,
}

impl DhikrSchedule {
    /// Check whether this schedule applies on a given date.
    ///
    /// Monthly schedules recur on the day of the month they were created;
    /// prayer-time schedules apply only when the caller names a listed slot.
    pub fn applies_on(&self, date: NaiveDate, current_prayer: Option<PrayerSlot>) -> bool {
        match self.schedule_type {
            ScheduleType::Daily => true,
            ScheduleType::Weekly => self.days_of_week.contains(&date.weekday()),
            ScheduleType::Monthly => date.day() == self.created_date.day(),
            ScheduleType::PrayerTime => {
                current_prayer.is_some_and(|slot| self.prayer_times.contains(&slot))
            }
        }
    }

    /// Whether a reminder should fire at `now` (minute resolution)
    pub fn reminder_due(&self, now: chrono::NaiveDateTime, current_prayer: Option<PrayerSlot>) -> bool {
        if !self.reminder_enabled || !self.applies_on(now.date(), current_prayer) {
            return false;
        }
        match self.time_of_day {
            Some(at) => at.hour() == now.hour() && at.minute() == now.minute(),
            None => true,
        }
    }
}
