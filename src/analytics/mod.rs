/// Statistics derived from completion logs
///
/// Everything here is a pure function over a slice of logs; the activity
/// tool loads the logs and assembles the summary.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::domain::DhikrLog;

/// Length of the recent activity series
pub const RECENT_DAYS: i64 = 7;

/// Repetitions counted on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub count: u64,
}

/// Sum of `count_completed` per date
pub fn daily_totals(logs: &[DhikrLog]) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for log in logs {
        *totals.entry(log.date).or_insert(0) += u64::from(log.count_completed);
    }
    totals
}

/// Consecutive calendar days ending at `today` with at least one log.
///
/// A day without logs today means no streak, even if yesterday had some.
pub fn log_day_streak(logs: &[DhikrLog], today: NaiveDate) -> u32 {
    let totals = daily_totals(logs);
    let mut streak = 0;
    let mut day = today;
    while totals.contains_key(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// One total per day for the `days` days ending at `today`, oldest first.
///
/// Days without logs appear with a zero count.
pub fn recent_series(logs: &[DhikrLog], today: NaiveDate, days: i64) -> Vec<DayTotal> {
    let totals = daily_totals(logs);
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_signed(Duration::days(back)))
        .map(|date| DayTotal { date, count: totals.get(&date).copied().unwrap_or(0) })
        .collect()
}

/// Activity overview for the progress screen
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    pub date: NaiveDate,
    /// Consecutive days with at least one log, ending today
    pub day_streak: u32,
    /// Repetitions counted today
    pub today_total: u64,
    /// Sessions that reached their target today
    pub completed_today: usize,
    pub last_7_days: Vec<DayTotal>,
    /// Legacy counters kept on the settings record
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl ActivitySummary {
    /// Summarise `logs` as of `today`; the streak counters come from settings
    pub fn from_logs(logs: &[DhikrLog], today: NaiveDate, current_streak: u32, longest_streak: u32) -> Self {
        let todays: Vec<&DhikrLog> = logs.iter().filter(|log| log.date == today).collect();

        Self {
            date: today,
            day_streak: log_day_streak(logs, today),
            today_total: todays.iter().map(|log| u64::from(log.count_completed)).sum(),
            completed_today: todays.iter().filter(|log| log.is_complete()).count(),
            last_7_days: recent_series(logs, today, RECENT_DAYS),
            current_streak,
            longest_streak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountMethod, DhikrId, DhikrLogId};
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn log(date: NaiveDate, count: u32, target: u32) -> DhikrLog {
        DhikrLog {
            id: DhikrLogId::new(),
            dhikr_id: DhikrId::new(),
            date,
            hijri_date: String::new(),
            count_completed: count,
            target_count: target,
            completion_percentage: 0.0,
            method: CountMethod::Manual,
            duration_seconds: 0,
            created_date: Utc::now(),
            updated_date: None,
        }
    }

    #[test]
    fn test_day_streak_needs_today() {
        let logs = vec![log(day(8), 33, 33), log(day(9), 10, 33), log(day(10), 33, 33), log(day(10), 3, 3)];

        assert_eq!(log_day_streak(&logs, day(10)), 3);
        assert_eq!(log_day_streak(&logs, day(11)), 0);
        assert_eq!(log_day_streak(&[], day(10)), 0);
    }

    #[test]
    fn test_gap_breaks_day_streak() {
        let logs = vec![log(day(6), 1, 1), log(day(8), 1, 1), log(day(9), 1, 1)];
        assert_eq!(log_day_streak(&logs, day(9)), 2);
    }

    #[test]
    fn test_recent_series_fills_empty_days() {
        let logs = vec![log(day(4), 33, 33), log(day(10), 33, 33), log(day(10), 100, 100)];
        let series = recent_series(&logs, day(10), RECENT_DAYS);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0], DayTotal { date: day(4), count: 33 });
        assert_eq!(series[6], DayTotal { date: day(10), count: 133 });
        assert!(series[1..6].iter().all(|d| d.count == 0));
    }

    #[test]
    fn test_summary_counts_today() {
        let logs = vec![log(day(9), 33, 33), log(day(10), 33, 33), log(day(10), 20, 100)];
        let summary = ActivitySummary::from_logs(&logs, day(10), 4, 9);

        assert_eq!(summary.day_streak, 2);
        assert_eq!(summary.today_total, 53);
        assert_eq!(summary.completed_today, 1);
        assert_eq!(summary.longest_streak, 9);
    }
}
