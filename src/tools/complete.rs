/// Counting sessions: completion, partial saves and counter drafts
///
/// Finishing a session writes today's log for the dhikr, bumps the streak
/// counter on the settings record, and feeds the completion to every active
/// goal it applies to. Abandoning a session only writes the log.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{
    calculate_goal_progress, completion_percentage, CountMethod, DhikrId, DhikrLog, DhikrLogPatch, DomainError, GoalId,
    NewDhikrLog, SessionDraft,
};
use crate::storage::{
    DhikrRepository, DraftRepository, GoalRepository, LogRepository, RecordStore, SettingsRepository, StorageError,
};
use crate::tools::{parse_opt, resolve_date, ToolError};

/// Views a client should refresh after a session write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    RecentLogs,
    TodayDhikr,
    Goals,
}

/// Final values of one counting session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub dhikr_id: DhikrId,
    pub final_count: u32,
    /// The dhikr's configured repetitions at the time of the session
    pub target_count: u32,
    pub method: CountMethod,
    pub duration_seconds: u64,
    pub date: NaiveDate,
    pub hijri_date: String,
}

impl SessionOutcome {
    /// A session reaching its target counts as a completion
    pub fn is_full_completion(&self) -> bool {
        self.final_count >= self.target_count
    }
}

/// Legacy streak counter after a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Progress recorded on one goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgressReport {
    pub goal_id: GoalId,
    pub title: String,
    pub current_value: u64,
    pub target_value: u64,
    pub is_completed: bool,
}

/// A goal completed by this session, for the completion notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedGoal {
    pub goal_id: GoalId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_message: Option<String>,
}

/// A goal whose progress could not be saved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedGoal {
    pub goal_id: GoalId,
    pub error: String,
}

/// Everything a session write changed
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub log: DhikrLog,
    /// False when an existing log for the day was amended
    pub log_created: bool,
    /// Whether the session counted as a completion
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_streak: Option<SettingsStreak>,
    pub goal_updates: Vec<GoalProgressReport>,
    pub completed_goals: Vec<CompletedGoal>,
    pub failed_goals: Vec<FailedGoal>,
    /// Non-fatal problems in steps after the log was written
    pub warnings: Vec<String>,
    pub invalidated: Vec<CacheKey>,
}

impl CompletionReport {
    fn partial(log: DhikrLog, log_created: bool) -> Self {
        Self {
            log,
            log_created,
            completed: false,
            settings_streak: None,
            goal_updates: Vec::new(),
            completed_goals: Vec::new(),
            failed_goals: Vec::new(),
            warnings: Vec::new(),
            invalidated: vec![CacheKey::RecentLogs, CacheKey::TodayDhikr],
        }
    }
}

/// Write the session's log, creating today's log or amending the existing one.
///
/// Returns the stored log and whether it was newly created.
pub fn upsert_log<S: RecordStore>(storage: &S, session: &SessionOutcome) -> Result<(DhikrLog, bool), StorageError> {
    let percentage = completion_percentage(session.final_count, session.target_count);

    match storage.log_for_dhikr_on(session.dhikr_id, session.date)? {
        Some(existing) => {
            let patch = DhikrLogPatch {
                count_completed: session.final_count,
                target_count: session.target_count,
                completion_percentage: percentage,
                method: session.method,
                duration_seconds: session.duration_seconds,
            };
            let log = storage.update_log(existing.id, &patch)?;
            debug!("Amended log {} for dhikr {} on {}", log.id, session.dhikr_id, session.date);
            Ok((log, false))
        }
        None => {
            let log = storage.create_log(&NewDhikrLog {
                dhikr_id: session.dhikr_id,
                date: session.date,
                hijri_date: session.hijri_date.clone(),
                count_completed: session.final_count,
                target_count: session.target_count,
                completion_percentage: percentage,
                method: session.method,
                duration_seconds: session.duration_seconds,
            })?;
            debug!("Created log {} for dhikr {} on {}", log.id, session.dhikr_id, session.date);
            Ok((log, true))
        }
    }
}

/// Record a session that stopped short of its target.
///
/// Only the log is written; streaks and goals credit completions alone.
/// Replaying the same save is harmless since the log is upserted.
pub fn save_incomplete_progress<S: RecordStore>(
    storage: &S,
    session: &SessionOutcome,
) -> Result<CompletionReport, ToolError> {
    let (log, created) = upsert_log(storage, session)?;
    info!(
        "Saved partial progress {}/{} for dhikr {}",
        session.final_count, session.target_count, session.dhikr_id
    );
    Ok(CompletionReport::partial(log, created))
}

/// Record a finished session.
///
/// The log and the settings streak are written as one batch. Goals are then
/// updated one by one; a goal that fails to save is reported and skipped
/// without affecting the others. A session below its target is saved as
/// partial progress instead.
pub fn complete_session<S: RecordStore>(storage: &S, session: &SessionOutcome) -> Result<CompletionReport, ToolError> {
    if !session.is_full_completion() {
        debug!(
            "Session for dhikr {} ended at {}/{}; saving as partial progress",
            session.dhikr_id, session.final_count, session.target_count
        );
        return save_incomplete_progress(storage, session);
    }

    let (log, log_created, streak) = storage.atomically(|s| {
        let (log, created) = upsert_log(s, session)?;

        let settings = s.get_or_create_settings()?;
        let updated = s.update_settings(settings.id, &settings.streak_after_completion())?;

        Ok::<_, StorageError>((
            log,
            created,
            SettingsStreak {
                current_streak: updated.current_streak,
                longest_streak: updated.longest_streak,
            },
        ))
    })?;

    let mut report = CompletionReport {
        completed: true,
        settings_streak: Some(streak),
        invalidated: vec![CacheKey::RecentLogs, CacheKey::TodayDhikr, CacheKey::Goals],
        ..CompletionReport::partial(log, log_created)
    };

    fan_out_to_goals(storage, session, &mut report);

    if let Err(e) = storage.clear_draft(session.dhikr_id) {
        warn!("Failed to clear counter draft for dhikr {}: {}", session.dhikr_id, e);
        report.warnings.push(format!("Counter draft was not cleared: {}", e));
    }

    info!(
        "Completed dhikr {} ({} repetitions): {} goal(s) updated, {} completed, {} failed",
        session.dhikr_id,
        session.final_count,
        report.goal_updates.len(),
        report.completed_goals.len(),
        report.failed_goals.len()
    );
    Ok(report)
}

/// Feed one completion to every active goal it applies to
fn fan_out_to_goals<S: RecordStore>(storage: &S, session: &SessionOutcome, report: &mut CompletionReport) {
    let goals = match storage.active_goals() {
        Ok(goals) => goals,
        Err(e) => {
            warn!("Could not load active goals: {}", e);
            report.warnings.push(format!("Goals were not updated: {}", e));
            return;
        }
    };

    for goal in goals.iter().filter(|g| g.applies_to(session.dhikr_id)) {
        let Some(update) = calculate_goal_progress(goal, session.final_count, session.date) else {
            debug!("Goal {} already counted on {}", goal.id, session.date);
            continue;
        };

        match storage.apply_progress(goal.id, &update) {
            Ok(saved) => {
                if update.is_completed && !goal.is_completed {
                    info!("Goal completed: {}", saved.title);
                    report.completed_goals.push(CompletedGoal {
                        goal_id: saved.id,
                        title: saved.title.clone(),
                        reward_message: saved.reward_message.clone(),
                    });
                }
                report.goal_updates.push(GoalProgressReport {
                    goal_id: saved.id,
                    title: saved.title,
                    current_value: saved.current_value,
                    target_value: saved.target_value,
                    is_completed: saved.is_completed,
                });
            }
            Err(e) => {
                warn!("Failed to update goal {}: {}", goal.id, e);
                report.failed_goals.push(FailedGoal { goal_id: goal.id, error: e.to_string() });
            }
        }
    }
}

/// Parameters for the dhikr_complete and dhikr_save_progress tools
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionParams {
    /// ID of the dhikr that was counted
    pub dhikr_id: String,
    /// Repetitions counted in the session
    pub count: u32,
    /// Counting method: manual, voice or auto_timer (default manual)
    pub method: Option<String>,
    /// Session length in seconds
    pub duration_seconds: Option<u64>,
    /// Calendar date of the session, YYYY-MM-DD (defaults to today, UTC)
    pub date: Option<String>,
    /// Hijri date as displayed to the user
    pub hijri_date: Option<String>,
}

impl SessionParams {
    /// Resolve the parameters against the stored dhikr
    pub fn into_outcome<S: RecordStore>(self, storage: &S) -> Result<SessionOutcome, ToolError> {
        let dhikr_id = DhikrId::parse(&self.dhikr_id)?;
        if self.count == 0 {
            return Err(DomainError::InvalidValue { message: "Nothing was counted in this session".to_string() }.into());
        }
        let dhikr = storage.get_dhikr(dhikr_id)?.ok_or_else(|| ToolError::NotFound {
            entity: "Dhikr",
            id: dhikr_id.to_string(),
        })?;

        Ok(SessionOutcome {
            dhikr_id,
            final_count: self.count,
            target_count: dhikr.repetitions,
            method: parse_opt(self.method.as_deref())?.unwrap_or_default(),
            duration_seconds: self.duration_seconds.unwrap_or(0),
            date: resolve_date(self.date.as_deref())?,
            hijri_date: self.hijri_date.unwrap_or_default(),
        })
    }
}

/// Finish a counting session described by tool arguments
pub fn record_completion<S: RecordStore>(storage: &S, params: SessionParams) -> Result<CompletionReport, ToolError> {
    let session = params.into_outcome(storage)?;
    complete_session(storage, &session)
}

/// Save an unfinished counting session described by tool arguments
pub fn record_progress<S: RecordStore>(storage: &S, params: SessionParams) -> Result<CompletionReport, ToolError> {
    let session = params.into_outcome(storage)?;
    save_incomplete_progress(storage, &session)
}

/// Parameters for the counter_draft tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CounterDraftParams {
    /// ID of the dhikr being counted
    pub dhikr_id: String,
    /// Current counter value; omit to restore the saved value instead
    pub count: Option<u32>,
}

/// Response from the counter_draft tool
#[derive(Debug, Serialize)]
pub struct CounterDraftResponse {
    pub dhikr_id: DhikrId,
    /// The saved or restored count; absent when nothing could be restored
    pub count: Option<u32>,
    pub message: String,
}

/// Save the live counter value, or restore it when no count is given.
///
/// A zero count discards the draft, like resetting the counter.
pub fn counter_draft<S: RecordStore>(
    storage: &S,
    params: CounterDraftParams,
    now: DateTime<Utc>,
) -> Result<CounterDraftResponse, ToolError> {
    let dhikr_id = DhikrId::parse(&params.dhikr_id)?;

    match params.count {
        Some(0) => {
            storage.clear_draft(dhikr_id)?;
            Ok(CounterDraftResponse { dhikr_id, count: None, message: "Counter draft cleared".to_string() })
        }
        Some(count) => {
            storage.save_draft(&SessionDraft { dhikr_id, count, saved_at: now })?;
            Ok(CounterDraftResponse { dhikr_id, count: Some(count), message: format!("Saved count {}", count) })
        }
        None => {
            let count = storage.restore_draft(dhikr_id, now)?;
            let message = match count {
                Some(count) => format!("Restored count {}", count),
                None => "No recent counter draft".to_string(),
            };
            Ok(CounterDraftResponse { dhikr_id, count, message })
        }
    }
}
