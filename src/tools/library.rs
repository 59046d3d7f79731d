/// The dhikr library: create, browse, edit and delete dhikr

use chrono::{NaiveTime, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    Dhikr, DhikrCategory, DhikrId, DhikrPatch, DhikrSchedule, DomainError, NewDhikr, NewDhikrSchedule, PrayerSlot,
    ScheduleType,
};
use crate::storage::{DhikrRepository, RecordStore, ScheduleRepository, SortOrder, StorageError};
use crate::tools::{parse_opt, ToolError};

/// Parameters for creating a dhikr
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDhikrParams {
    /// The phrase in Arabic (required)
    pub arabic_text: String,
    /// Short display name
    pub name: Option<String>,
    /// Category: morning, evening, after_prayer, before_sleep, general, quran, salawat, tasbih, dua, ziyarah
    pub category: Option<String>,
    /// Target repetitions per session (default 1)
    pub repetitions: Option<u32>,
    pub reward: Option<String>,
    pub source: Option<String>,
    /// Higher is shown first
    pub priority: Option<i32>,
    pub is_favorite: Option<bool>,
    /// Also create a schedule for the new dhikr
    pub schedule: Option<ScheduleParams>,
}

/// Schedule settings for a new dhikr
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScheduleParams {
    /// daily, weekly, prayer_time or monthly
    pub schedule_type: String,
    /// Weekday names for weekly schedules, e.g. ["fri"]
    #[serde(default)]
    pub days_of_week: Vec<String>,
    /// Prayer slots for prayer_time schedules: fajr, dhuhr, asr, maghrib, isha
    #[serde(default)]
    pub prayer_times: Vec<String>,
    /// Reminder time, HH:MM
    pub time_of_day: Option<String>,
    pub reminder_enabled: Option<bool>,
}

impl ScheduleParams {
    fn into_new_schedule(self, dhikr_id: DhikrId) -> Result<NewDhikrSchedule, DomainError> {
        let days_of_week = self
            .days_of_week
            .iter()
            .map(|day| {
                day.trim().parse::<Weekday>().map_err(|_| DomainError::Validation {
                    message: format!("Invalid weekday '{}'", day),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let prayer_times = self
            .prayer_times
            .iter()
            .map(|slot| slot.parse::<PrayerSlot>())
            .collect::<Result<Vec<_>, _>>()?;
        let time_of_day = self
            .time_of_day
            .as_deref()
            .map(|t| {
                NaiveTime::parse_from_str(t.trim(), "%H:%M")
                    .map_err(|_| DomainError::InvalidValue { message: format!("Invalid time '{}', expected HH:MM", t) })
            })
            .transpose()?;

        Ok(NewDhikrSchedule {
            dhikr_id,
            schedule_type: self.schedule_type.parse::<ScheduleType>()?,
            days_of_week,
            prayer_times,
            time_of_day,
            reminder_enabled: self.reminder_enabled.unwrap_or(true),
        })
    }
}

/// Response from creating a dhikr
#[derive(Debug, Serialize)]
pub struct CreateDhikrResponse {
    pub dhikr: Dhikr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<DhikrSchedule>,
    pub message: String,
}

/// Create a dhikr and, when requested, its schedule in one batch
pub fn create_dhikr<S: RecordStore>(storage: &S, params: CreateDhikrParams) -> Result<CreateDhikrResponse, ToolError> {
    let new = NewDhikr {
        name: params.name.filter(|n| !n.trim().is_empty()),
        arabic_text: params.arabic_text.trim().to_string(),
        category: parse_opt::<DhikrCategory>(params.category.as_deref())?,
        repetitions: params.repetitions,
        reward: params.reward,
        source: params.source,
        priority: params.priority,
        is_active: Some(true),
        is_favorite: params.is_favorite,
    };
    new.validate()?;

    let schedule_params = params.schedule;
    let (dhikr, schedule) = storage.atomically(|s| {
        let dhikr = s.create_dhikr(&new)?;
        let schedule = match schedule_params {
            Some(p) => Some(s.create_schedule(&p.into_new_schedule(dhikr.id)?)?),
            None => None,
        };
        Ok::<_, ToolError>((dhikr, schedule))
    })?;

    info!("Created dhikr {} ({})", dhikr.display_name(), dhikr.id);
    Ok(CreateDhikrResponse {
        message: format!("Added \"{}\" with {} repetitions", dhikr.display_name(), dhikr.repetitions),
        dhikr,
        schedule,
    })
}

/// Parameters for browsing the library
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListDhikrParams {
    /// Text to search for in the phrase, reward and source; diacritics are ignored
    pub query: Option<String>,
    /// Only this category
    pub category: Option<String>,
    /// Only favourites
    pub favorites_only: Option<bool>,
    /// Include inactive dhikr (default false)
    pub include_inactive: Option<bool>,
    /// Sort field, prefix with '-' for descending (default -priority)
    pub sort: Option<String>,
    /// Maximum number of results (default 100)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListDhikrResponse {
    pub dhikr: Vec<Dhikr>,
    pub total: usize,
}

pub fn list_dhikr<S: RecordStore>(storage: &S, params: ListDhikrParams) -> Result<ListDhikrResponse, ToolError> {
    let category = parse_opt::<DhikrCategory>(params.category.as_deref())?;
    let sort = params.sort.as_deref().map(SortOrder::parse);
    let query = params.query.unwrap_or_default();
    let favorites_only = params.favorites_only.unwrap_or(false);
    let include_inactive = params.include_inactive.unwrap_or(false);

    let dhikr: Vec<Dhikr> = storage
        .list_dhikr(sort.as_ref(), Some(usize::MAX))?
        .into_iter()
        .filter(|d| include_inactive || d.is_active)
        .filter(|d| category.map_or(true, |c| d.category == c))
        .filter(|d| !favorites_only || d.is_favorite)
        .filter(|d| d.matches_query(&query))
        .take(params.limit.unwrap_or(crate::storage::DEFAULT_LIST_LIMIT))
        .collect();

    Ok(ListDhikrResponse { total: dhikr.len(), dhikr })
}

/// Parameters for editing a dhikr; only given fields change
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateDhikrParams {
    pub dhikr_id: String,
    pub name: Option<String>,
    pub arabic_text: Option<String>,
    pub category: Option<String>,
    pub repetitions: Option<u32>,
    pub reward: Option<String>,
    pub source: Option<String>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub is_favorite: Option<bool>,
    /// Flip the favourite flag (ignored when is_favorite is given)
    pub toggle_favorite: Option<bool>,
}

pub fn update_dhikr<S: RecordStore>(storage: &S, params: UpdateDhikrParams) -> Result<Dhikr, ToolError> {
    let id = DhikrId::parse(&params.dhikr_id)?;

    let patch = DhikrPatch {
        name: params.name,
        arabic_text: params.arabic_text.map(|t| t.trim().to_string()),
        category: parse_opt(params.category.as_deref())?,
        repetitions: params.repetitions,
        reward: params.reward,
        source: params.source,
        priority: params.priority,
        is_active: params.is_active,
        is_favorite: params.is_favorite,
    };

    let toggle = params.toggle_favorite.unwrap_or(false) && patch.is_favorite.is_none();
    let dhikr = storage.atomically(|s| {
        let dhikr = s.update_dhikr(id, &patch)?;
        if toggle {
            return s.toggle_favorite(id);
        }
        Ok::<_, StorageError>(dhikr)
    })?;

    info!("Updated dhikr {}", id);
    Ok(dhikr)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteParams {
    /// ID of the record to delete
    pub id: String,
}

/// Delete a dhikr; its logs, schedules and goal references stay
pub fn delete_dhikr<S: RecordStore>(storage: &S, params: DeleteParams) -> Result<String, ToolError> {
    let id = DhikrId::parse(&params.id)?;
    storage.delete_dhikr(id)?;
    Ok(format!("Deleted dhikr {}", id))
}
