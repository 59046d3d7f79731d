/// The activity_summary tool

use chrono::Duration;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::analytics::{ActivitySummary, RECENT_DAYS};
use crate::domain::DomainError;
use crate::storage::{LogRepository, RecordStore, SettingsRepository};
use crate::tools::{resolve_date, ToolError};

/// How far back logs are read to measure the day streak
const STREAK_LOOKBACK_DAYS: i64 = 366;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ActivitySummaryParams {
    /// Today's date, YYYY-MM-DD (defaults to today, UTC)
    pub date: Option<String>,
}

/// Streaks, today's total and the last week of activity
pub fn activity_summary<S: RecordStore>(storage: &S, params: ActivitySummaryParams) -> Result<ActivitySummary, ToolError> {
    let today = resolve_date(params.date.as_deref())?;
    let from = today
        .checked_sub_signed(Duration::days(STREAK_LOOKBACK_DAYS.max(RECENT_DAYS)))
        .ok_or_else(|| DomainError::InvalidDate(format!("{} is out of range", today)))?;

    let logs = storage.logs_between(from, today)?;
    let settings = storage.get_or_create_settings()?;

    Ok(ActivitySummary::from_logs(&logs, today, settings.current_streak, settings.longest_streak))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{complete_session, SessionOutcome};
    use crate::domain::{CountMethod, DhikrId};
    use crate::storage::SqliteStorage;
    use chrono::NaiveDate;

    #[test]
    fn test_summary_after_two_days_of_completions() {
        let storage = SqliteStorage::in_memory().unwrap();
        let dhikr_id = DhikrId::new();
        for d in [1, 2] {
            let session = SessionOutcome {
                dhikr_id,
                final_count: 33,
                target_count: 33,
                method: CountMethod::Manual,
                duration_seconds: 60,
                date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                hijri_date: String::new(),
            };
            complete_session(&storage, &session).unwrap();
        }

        let summary =
            activity_summary(&storage, ActivitySummaryParams { date: Some("2024-01-02".to_string()) }).unwrap();
        assert_eq!(summary.day_streak, 2);
        assert_eq!(summary.today_total, 33);
        assert_eq!(summary.current_streak, 2);
        assert_eq!(summary.last_7_days.len(), 7);
    }

    #[test]
    fn test_date_near_calendar_start_is_rejected() {
        let storage = SqliteStorage::in_memory().unwrap();
        let result = activity_summary(&storage, ActivitySummaryParams { date: Some("-262143-01-02".to_string()) });
        assert!(matches!(result, Err(ref e) if e.is_invalid_input()));
    }
}
