/// Typed repositories over the entity tables
///
/// Each entity gets an `Entity` impl (table, defaults) and a repository trait
/// with explicit query methods. The traits are implemented for every
/// [`RecordStore`], so callers simply write `storage.get_dhikr(id)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::domain::{
    ContentId, ContentType, CrescentSighting, Dhikr, DhikrId, DhikrLog, DhikrLogId, DhikrLogPatch,
    DhikrPatch, DhikrSchedule, Goal, GoalId, GoalReset, GoalUpdate, IslamicContent, NewCrescentSighting,
    NewDhikr, NewDhikrLog, NewDhikrSchedule, NewGoal, NewIslamicContent, ScheduleId, SchedulePatch,
    SettingsId, SettingsPatch, SightingId, UserSettings, DEFAULT_FAJR_ANGLE, DEFAULT_LATITUDE,
    DEFAULT_LONGITUDE, DEFAULT_MAGHRIB_ANGLE,
};
use crate::storage::{Criteria, Entity, RecordStore, SortOrder, StorageError};

fn defaults(pairs: Value) -> Map<String, Value> {
    match pairs {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Entity for Dhikr {
    type Id = DhikrId;
    const TABLE: &'static str = "dhikr";
    const NAME: &'static str = "Dhikr";

    fn id(&self) -> DhikrId {
        self.id
    }

    fn defaults() -> Map<String, Value> {
        defaults(json!({
            "category": "general",
            "repetitions": 1,
            "priority": 0,
            "is_active": true,
            "is_favorite": false,
        }))
    }
}

impl Entity for DhikrLog {
    type Id = DhikrLogId;
    const TABLE: &'static str = "dhikr_log";
    const NAME: &'static str = "DhikrLog";

    fn id(&self) -> DhikrLogId {
        self.id
    }

    fn defaults() -> Map<String, Value> {
        defaults(json!({
            "hijri_date": "",
            "count_completed": 0,
            "completion_percentage": 0.0,
            "method": "manual",
            "duration_seconds": 0,
        }))
    }
}

impl Entity for DhikrSchedule {
    type Id = ScheduleId;
    const TABLE: &'static str = "dhikr_schedule";
    const NAME: &'static str = "DhikrSchedule";

    fn id(&self) -> ScheduleId {
        self.id
    }

    fn defaults() -> Map<String, Value> {
        defaults(json!({
            "schedule_type": "daily",
            "days_of_week": [],
            "prayer_times": [],
            "reminder_enabled": true,
        }))
    }
}

impl Entity for Goal {
    type Id = GoalId;
    const TABLE: &'static str = "goal";
    const NAME: &'static str = "Goal";

    fn id(&self) -> GoalId {
        self.id
    }

    fn defaults() -> Map<String, Value> {
        defaults(json!({
            "current_value": 0,
            "is_completed": false,
        }))
    }
}

impl Entity for IslamicContent {
    type Id = ContentId;
    const TABLE: &'static str = "islamic_content";
    const NAME: &'static str = "IslamicContent";

    fn id(&self) -> ContentId {
        self.id
    }
}

impl Entity for UserSettings {
    type Id = SettingsId;
    const TABLE: &'static str = "user_settings";
    const NAME: &'static str = "UserSettings";

    fn id(&self) -> SettingsId {
        self.id
    }

    fn defaults() -> Map<String, Value> {
        defaults(json!({
            "latitude": DEFAULT_LATITUDE,
            "longitude": DEFAULT_LONGITUDE,
            "fajr_angle": DEFAULT_FAJR_ANGLE,
            "maghrib_angle": DEFAULT_MAGHRIB_ANGLE,
            "hijri_adjustment": 0,
            "notification_enabled": true,
            "current_streak": 0,
            "longest_streak": 0,
        }))
    }
}

impl Entity for CrescentSighting {
    type Id = SightingId;
    const TABLE: &'static str = "crescent_sighting";
    const NAME: &'static str = "CrescentSighting";
    const TRACKS_UPDATED: bool = false;

    fn id(&self) -> SightingId {
        self.id
    }

    fn defaults() -> Map<String, Value> {
        defaults(json!({ "is_sighted": true }))
    }
}

/// Queries over the dhikr library
pub trait DhikrRepository: RecordStore + Sized {
    /// Ordered by `sort`, highest priority first when no sort is given
    fn list_dhikr(&self, sort: Option<&SortOrder>, limit: Option<usize>) -> Result<Vec<Dhikr>, StorageError> {
        let default_order = SortOrder::desc("priority");
        self.entities::<Dhikr>().list(Some(sort.unwrap_or(&default_order)), limit)
    }

    /// Active dhikr, highest priority first
    fn list_active_dhikr(&self) -> Result<Vec<Dhikr>, StorageError> {
        Ok(self
            .list_dhikr(None, Some(usize::MAX))?
            .into_iter()
            .filter(|d| d.is_active)
            .collect())
    }

    fn get_dhikr(&self, id: DhikrId) -> Result<Option<Dhikr>, StorageError> {
        self.entities::<Dhikr>().get(id)
    }

    fn create_dhikr(&self, new: &NewDhikr) -> Result<Dhikr, StorageError> {
        new.validate()?;
        self.entities::<Dhikr>().create(new)
    }

    fn update_dhikr(&self, id: DhikrId, patch: &DhikrPatch) -> Result<Dhikr, StorageError> {
        patch.validate()?;
        self.entities::<Dhikr>().update(id, patch)
    }

    fn toggle_favorite(&self, id: DhikrId) -> Result<Dhikr, StorageError> {
        let dhikr = self
            .get_dhikr(id)?
            .ok_or_else(|| StorageError::NotFound { entity: Dhikr::NAME, id: id.to_string() })?;
        self.entities::<Dhikr>()
            .update(id, &json!({ "is_favorite": !dhikr.is_favorite }))
    }

    /// Logs, schedules and goals referring to the dhikr are left in place
    fn delete_dhikr(&self, id: DhikrId) -> Result<(), StorageError> {
        self.entities::<Dhikr>().delete(id)
    }
}

/// Queries over completion logs
pub trait LogRepository: RecordStore + Sized {
    /// Most recently written first
    fn recent_logs(&self, limit: usize) -> Result<Vec<DhikrLog>, StorageError> {
        self.entities::<DhikrLog>()
            .list(Some(&SortOrder::desc("created_date")), Some(limit))
    }

    /// Latest calendar date first
    fn logs_for_calendar(&self, limit: usize) -> Result<Vec<DhikrLog>, StorageError> {
        self.entities::<DhikrLog>().list(Some(&SortOrder::desc("date")), Some(limit))
    }

    fn logs_on(&self, date: NaiveDate) -> Result<Vec<DhikrLog>, StorageError> {
        self.entities::<DhikrLog>()
            .filter(&Criteria::new().eq("date", json!(date)))
    }

    fn logs_for_dhikr(&self, dhikr_id: DhikrId) -> Result<Vec<DhikrLog>, StorageError> {
        self.entities::<DhikrLog>()
            .filter(&Criteria::new().eq("dhikr_id", json!(dhikr_id)))
    }

    /// The log for one dhikr on one date, if the day has one
    fn log_for_dhikr_on(&self, dhikr_id: DhikrId, date: NaiveDate) -> Result<Option<DhikrLog>, StorageError> {
        let mut logs = self.entities::<DhikrLog>().filter(
            &Criteria::new()
                .eq("dhikr_id", json!(dhikr_id))
                .eq("date", json!(date)),
        )?;
        if logs.len() > 1 {
            warn!("{} logs for dhikr {} on {}; using the first", logs.len(), dhikr_id, date);
        }
        Ok(if logs.is_empty() { None } else { Some(logs.swap_remove(0)) })
    }

    /// Logs dated within `from..=to`
    fn logs_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DhikrLog>, StorageError> {
        Ok(self
            .entities::<DhikrLog>()
            .list(Some(&SortOrder::asc("date")), Some(usize::MAX))?
            .into_iter()
            .filter(|log| log.date >= from && log.date <= to)
            .collect())
    }

    fn create_log(&self, new: &NewDhikrLog) -> Result<DhikrLog, StorageError> {
        self.entities::<DhikrLog>().create(new)
    }

    fn update_log(&self, id: DhikrLogId, patch: &DhikrLogPatch) -> Result<DhikrLog, StorageError> {
        self.entities::<DhikrLog>().update(id, patch)
    }

    fn delete_log(&self, id: DhikrLogId) -> Result<(), StorageError> {
        self.entities::<DhikrLog>().delete(id)
    }
}

/// Queries over dhikr schedules
pub trait ScheduleRepository: RecordStore + Sized {
    fn list_schedules(&self) -> Result<Vec<DhikrSchedule>, StorageError> {
        self.entities::<DhikrSchedule>().list(None, Some(usize::MAX))
    }

    fn schedules_for(&self, dhikr_id: DhikrId) -> Result<Vec<DhikrSchedule>, StorageError> {
        self.entities::<DhikrSchedule>()
            .filter(&Criteria::new().eq("dhikr_id", json!(dhikr_id)))
    }

    fn create_schedule(&self, new: &NewDhikrSchedule) -> Result<DhikrSchedule, StorageError> {
        new.validate()?;
        self.entities::<DhikrSchedule>().create(new)
    }

    fn update_schedule(&self, id: ScheduleId, patch: &SchedulePatch) -> Result<DhikrSchedule, StorageError> {
        self.entities::<DhikrSchedule>().update(id, patch)
    }

    fn delete_schedule(&self, id: ScheduleId) -> Result<(), StorageError> {
        self.entities::<DhikrSchedule>().delete(id)
    }
}

/// Queries and progress writes for goals
pub trait GoalRepository: RecordStore + Sized {
    /// Newest first
    fn list_goals(&self, limit: Option<usize>) -> Result<Vec<Goal>, StorageError> {
        self.entities::<Goal>()
            .list(Some(&SortOrder::desc("created_date")), limit)
    }

    /// Goals still in progress, oldest first
    fn active_goals(&self) -> Result<Vec<Goal>, StorageError> {
        self.entities::<Goal>()
            .filter(&Criteria::new().eq("is_completed", json!(false)))
    }

    fn completed_goals(&self) -> Result<Vec<Goal>, StorageError> {
        self.entities::<Goal>()
            .filter(&Criteria::new().eq("is_completed", json!(true)))
    }

    /// Goals whose dhikr selection includes `dhikr_id`
    fn goals_for_dhikr(&self, dhikr_id: DhikrId) -> Result<Vec<Goal>, StorageError> {
        Ok(self
            .list_goals(Some(usize::MAX))?
            .into_iter()
            .filter(|goal| goal.dhikr_ids().contains(&dhikr_id))
            .collect())
    }

    fn get_goal(&self, id: GoalId) -> Result<Option<Goal>, StorageError> {
        self.entities::<Goal>().get(id)
    }

    /// Validate and store a new goal starting on `today` unless it names a start date
    fn create_goal(&self, new: NewGoal, today: NaiveDate) -> Result<Goal, StorageError> {
        let draft = new.into_draft(today)?;
        self.entities::<Goal>().create(&draft)
    }

    /// Replace the definitional fields of a goal, keeping its progress
    fn edit_goal(&self, id: GoalId, definition: NewGoal) -> Result<Goal, StorageError> {
        let stored = self
            .get_goal(id)?
            .ok_or_else(|| StorageError::NotFound { entity: Goal::NAME, id: id.to_string() })?;
        let patch = definition.into_definition_patch(stored.current_value)?;
        self.entities::<Goal>().update(id, &patch)
    }

    fn apply_progress(&self, id: GoalId, update: &GoalUpdate) -> Result<Goal, StorageError> {
        debug!("Applying progress to goal {}: current_value={}", id, update.current_value);
        self.entities::<Goal>().update(id, update)
    }

    /// Clear all progress and restart the goal on `today`
    fn reset_goal(&self, id: GoalId, today: NaiveDate) -> Result<Goal, StorageError> {
        self.entities::<Goal>().update(id, &GoalReset::on(today))
    }

    fn delete_goal(&self, id: GoalId) -> Result<(), StorageError> {
        self.entities::<Goal>().delete(id)
    }
}

/// Queries over Islamic content cards
pub trait ContentRepository: RecordStore + Sized {
    fn list_content(&self, limit: Option<usize>) -> Result<Vec<IslamicContent>, StorageError> {
        self.entities::<IslamicContent>()
            .list(Some(&SortOrder::desc("created_date")), limit)
    }

    fn content_of_type(&self, content_type: ContentType) -> Result<Vec<IslamicContent>, StorageError> {
        self.entities::<IslamicContent>()
            .filter(&Criteria::new().eq("content_type", json!(content_type)))
    }

    fn create_content(&self, new: &NewIslamicContent) -> Result<IslamicContent, StorageError> {
        self.entities::<IslamicContent>().create(new)
    }
}

/// The single settings record
pub trait SettingsRepository: RecordStore + Sized {
    /// The settings record, created with defaults on first use.
    ///
    /// Should more than one record exist, the oldest wins.
    fn get_or_create_settings(&self) -> Result<UserSettings, StorageError> {
        let mut all = self
            .entities::<UserSettings>()
            .list(Some(&SortOrder::asc("created_date")), Some(usize::MAX))?;

        if all.len() > 1 {
            warn!("Found {} settings records; using the oldest", all.len());
        }
        if !all.is_empty() {
            return Ok(all.swap_remove(0));
        }

        debug!("No settings record yet; creating defaults");
        self.entities::<UserSettings>().create(&json!({}))
    }

    fn update_settings(&self, id: SettingsId, patch: &SettingsPatch) -> Result<UserSettings, StorageError> {
        patch.validate()?;
        self.entities::<UserSettings>().update(id, patch)
    }

    /// Write `patch` to the settings record, creating it first if needed
    fn save_settings(&self, patch: &SettingsPatch) -> Result<UserSettings, StorageError> {
        let settings = self.get_or_create_settings()?;
        if patch.is_empty() {
            return Ok(settings);
        }
        self.update_settings(settings.id, patch)
    }
}

/// Queries over recorded crescent sightings
pub trait SightingRepository: RecordStore + Sized {
    /// Latest sighting date first
    fn list_sightings(&self) -> Result<Vec<CrescentSighting>, StorageError> {
        self.entities::<CrescentSighting>()
            .list(Some(&SortOrder::desc("gregorian_date")), None)
    }

    fn record_sighting(&self, new: &NewCrescentSighting) -> Result<CrescentSighting, StorageError> {
        if new.hijri_month.trim().is_empty() {
            return Err(crate::domain::DomainError::Validation {
                message: "Hijri month cannot be empty".to_string(),
            }
            .into());
        }
        self.entities::<CrescentSighting>().create(new)
    }

    fn delete_sighting(&self, id: SightingId) -> Result<(), StorageError> {
        self.entities::<CrescentSighting>().delete(id)
    }
}

/// Restoring counter drafts
pub trait DraftRepository: RecordStore + Sized {
    /// The saved count for `dhikr_id` if the draft is still fresh at `now`.
    ///
    /// Stale drafts are discarded.
    fn restore_draft(&self, dhikr_id: DhikrId, now: DateTime<Utc>) -> Result<Option<u32>, StorageError> {
        match self.load_draft(dhikr_id)? {
            Some(draft) if draft.is_fresh(now) => Ok(Some(draft.count)),
            Some(_) => {
                debug!("Discarding stale draft for dhikr {}", dhikr_id);
                self.clear_draft(dhikr_id)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

impl<S: RecordStore> DhikrRepository for S {}
impl<S: RecordStore> LogRepository for S {}
impl<S: RecordStore> ScheduleRepository for S {}
impl<S: RecordStore> GoalRepository for S {}
impl<S: RecordStore> ContentRepository for S {}
impl<S: RecordStore> SettingsRepository for S {}
impl<S: RecordStore> SightingRepository for S {}
impl<S: RecordStore> DraftRepository for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountMethod, DhikrCategory, GoalKind, GoalType, MonthKey, SessionDraft};
    use crate::storage::SqliteStorage;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn new_log(dhikr_id: DhikrId, date: NaiveDate, count: u32) -> NewDhikrLog {
        NewDhikrLog {
            dhikr_id,
            date,
            hijri_date: String::new(),
            count_completed: count,
            target_count: 33,
            completion_percentage: 0.0,
            method: CountMethod::Manual,
            duration_seconds: 0,
        }
    }

    #[test]
    fn test_settings_created_once_with_defaults() {
        let storage = SqliteStorage::in_memory().unwrap();

        let first = storage.get_or_create_settings().unwrap();
        let second = storage.get_or_create_settings().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.latitude, DEFAULT_LATITUDE);
        assert_eq!(first.fajr_angle, DEFAULT_FAJR_ANGLE);
        assert!(first.notification_enabled);

        let saved = storage
            .save_settings(&SettingsPatch { hijri_adjustment: Some(-1), ..SettingsPatch::default() })
            .unwrap();
        assert_eq!(saved.id, first.id);
        assert_eq!(saved.hijri_adjustment, -1);
    }

    #[test]
    fn test_log_lookup_by_dhikr_and_date() {
        let storage = SqliteStorage::in_memory().unwrap();
        let a = DhikrId::new();
        let b = DhikrId::new();

        storage.create_log(&new_log(a, day(1), 10)).unwrap();
        storage.create_log(&new_log(b, day(1), 20)).unwrap();
        storage.create_log(&new_log(a, day(2), 30)).unwrap();

        let found = storage.log_for_dhikr_on(a, day(2)).unwrap().unwrap();
        assert_eq!(found.count_completed, 30);
        assert!(storage.log_for_dhikr_on(b, day(2)).unwrap().is_none());
        assert_eq!(storage.logs_on(day(1)).unwrap().len(), 2);

        let calendar = storage.logs_for_calendar(10).unwrap();
        assert_eq!(calendar[0].date, day(2));
        assert_eq!(storage.logs_between(day(2), day(5)).unwrap().len(), 1);
    }

    #[test]
    fn test_dhikr_default_order_is_priority_descending() {
        let storage = SqliteStorage::in_memory().unwrap();
        for (text, priority) in [("low", 1), ("high", 9), ("mid", 5)] {
            storage
                .create_dhikr(&NewDhikr { priority: Some(priority), ..NewDhikr::new(text, DhikrCategory::General, 33) })
                .unwrap();
        }

        let texts: Vec<String> = storage.list_dhikr(None, None).unwrap().into_iter().map(|d| d.arabic_text).collect();
        assert_eq!(texts, vec!["high", "mid", "low"]);

        assert!(storage.create_dhikr(&NewDhikr::new("", DhikrCategory::General, 33)).is_err());
    }

    #[test]
    fn test_goal_edit_keeps_progress_and_reset_clears_it() {
        let storage = SqliteStorage::in_memory().unwrap();
        let goal = storage
            .create_goal(NewGoal::new("Monthly", GoalType::MonthlyTarget, 500), day(1))
            .unwrap();

        let update = GoalUpdate {
            current_value: 40,
            is_completed: false,
            last_activity_date: day(3),
            streak_count: None,
            last_reset_date: Some(day(3)),
            current_month: Some(MonthKey::of(day(3))),
            monthly_progress: Some(40),
        };
        storage.apply_progress(goal.id, &update).unwrap();

        let edited = storage
            .edit_goal(goal.id, NewGoal::new("Monthly 1000", GoalType::MonthlyTarget, 1000))
            .unwrap();
        assert_eq!(edited.title, "Monthly 1000");
        assert_eq!(edited.current_value, 40);
        assert_eq!(edited.monthly_progress(), 40);

        let reset = storage.reset_goal(goal.id, day(10)).unwrap();
        assert_eq!(reset.current_value, 0);
        assert_eq!(reset.monthly_progress(), 0);
        assert_eq!(reset.current_month(), None);
        assert_eq!(reset.last_activity_date, None);
        assert_eq!(reset.start_date, Some(day(10)));
        assert!(matches!(reset.kind, GoalKind::MonthlyTarget { last_reset_date: None, .. }));
    }

    #[test]
    fn test_goal_board_split() {
        let storage = SqliteStorage::in_memory().unwrap();
        let a = storage.create_goal(NewGoal::new("A", GoalType::TotalCount, 10), day(1)).unwrap();
        storage.create_goal(NewGoal::new("B", GoalType::TotalCount, 10), day(1)).unwrap();

        storage
            .apply_progress(
                a.id,
                &GoalUpdate {
                    current_value: 10,
                    is_completed: true,
                    last_activity_date: day(1),
                    streak_count: None,
                    last_reset_date: None,
                    current_month: None,
                    monthly_progress: None,
                },
            )
            .unwrap();

        assert_eq!(storage.active_goals().unwrap().len(), 1);
        assert_eq!(storage.completed_goals().unwrap()[0].id, a.id);
    }

    #[test]
    fn test_raising_target_reopens_completed_goal() {
        let storage = SqliteStorage::in_memory().unwrap();
        let goal = storage.create_goal(NewGoal::new("Thirty", GoalType::TotalCount, 30), day(1)).unwrap();
        let update = GoalUpdate {
            current_value: 33,
            is_completed: true,
            last_activity_date: day(1),
            streak_count: None,
            last_reset_date: None,
            current_month: None,
            monthly_progress: None,
        };
        storage.apply_progress(goal.id, &update).unwrap();

        let raised = storage.edit_goal(goal.id, NewGoal::new("Hundred", GoalType::TotalCount, 100)).unwrap();
        assert_eq!(raised.current_value, 33);
        assert!(!raised.is_completed);
        assert_eq!(storage.active_goals().unwrap()[0].id, goal.id);

        let lowered = storage.edit_goal(goal.id, NewGoal::new("Twenty", GoalType::TotalCount, 20)).unwrap();
        assert!(lowered.is_completed);

        let missing = storage.edit_goal(GoalId::new(), NewGoal::new("None", GoalType::TotalCount, 5));
        assert!(matches!(missing, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_reset_clears_streak_goal() {
        let storage = SqliteStorage::in_memory().unwrap();
        let goal = storage.create_goal(NewGoal::new("Daily", GoalType::DailyStreak, 7), day(1)).unwrap();
        let update = GoalUpdate {
            current_value: 3,
            is_completed: false,
            last_activity_date: day(3),
            streak_count: Some(3),
            last_reset_date: Some(day(3)),
            current_month: None,
            monthly_progress: None,
        };
        let streaking = storage.apply_progress(goal.id, &update).unwrap();
        assert_eq!(streaking.streak_count(), 3);

        let reset = storage.reset_goal(goal.id, day(5)).unwrap();
        assert_eq!(reset.streak_count(), 0);
        assert_eq!(reset.last_reset_date(), None);
        assert_eq!(reset.current_value, 0);
        assert_eq!(reset.last_activity_date, None);
        assert!(matches!(reset.kind, GoalKind::DailyStreak { .. }));
    }

    #[test]
    fn test_stale_draft_is_discarded() {
        let storage = SqliteStorage::in_memory().unwrap();
        let dhikr_id = DhikrId::new();
        let saved_at = Utc::now();
        storage.save_draft(&SessionDraft { dhikr_id, count: 7, saved_at }).unwrap();

        assert_eq!(storage.restore_draft(dhikr_id, saved_at).unwrap(), Some(7));
        let later = saved_at + chrono::Duration::hours(2);
        assert_eq!(storage.restore_draft(dhikr_id, later).unwrap(), None);
        assert!(storage.load_draft(dhikr_id).unwrap().is_none());
    }
}
