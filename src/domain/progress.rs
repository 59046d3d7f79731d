/// Goal progress engine
///
/// Given a goal and one completion event, compute the goal's next progress
/// state according to its kind. Everything here is pure: the caller persists
/// the returned [`GoalUpdate`] as a partial update of the goal record.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Goal, GoalKind, MonthKey};

/// Progress fields written back to a goal after a completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalUpdate {
    pub current_value: u64,
    pub is_completed: bool,
    pub last_activity_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_month: Option<MonthKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_progress: Option<u64>,
}

impl GoalUpdate {
    fn counted(current_value: u64, date: NaiveDate) -> Self {
        Self {
            current_value,
            is_completed: false,
            last_activity_date: date,
            streak_count: None,
            last_reset_date: None,
            current_month: None,
            monthly_progress: None,
        }
    }

    /// Apply this update to an in-memory goal, as the store would
    pub fn apply_to(&self, goal: &mut Goal) {
        goal.current_value = self.current_value;
        goal.is_completed = self.is_completed;
        goal.last_activity_date = Some(self.last_activity_date);

        match &mut goal.kind {
            GoalKind::DailyStreak { streak_count, last_reset_date }
            | GoalKind::DhikrStreak { streak_count, last_reset_date, .. } => {
                if let Some(count) = self.streak_count {
                    *streak_count = count;
                }
                if self.last_reset_date.is_some() {
                    *last_reset_date = self.last_reset_date;
                }
            }
            GoalKind::MonthlyTarget { current_month, monthly_progress, last_reset_date } => {
                if let Some(progress) = self.monthly_progress {
                    *monthly_progress = progress;
                }
                if self.current_month.is_some() {
                    *current_month = self.current_month;
                }
                if self.last_reset_date.is_some() {
                    *last_reset_date = self.last_reset_date;
                }
            }
            GoalKind::TotalCount | GoalKind::SpecificDhikr { .. } | GoalKind::Combination { .. } => {}
        }
    }
}

/// Progress fields written when the user resets a goal.
///
/// Date markers serialize as explicit nulls so the merge clears them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalReset {
    pub current_value: u64,
    pub streak_count: u32,
    pub monthly_progress: u64,
    pub is_completed: bool,
    pub last_activity_date: Option<NaiveDate>,
    pub last_reset_date: Option<NaiveDate>,
    pub current_month: Option<MonthKey>,
    pub start_date: NaiveDate,
}

impl GoalReset {
    pub fn on(today: NaiveDate) -> Self {
        Self {
            current_value: 0,
            streak_count: 0,
            monthly_progress: 0,
            is_completed: false,
            last_activity_date: None,
            last_reset_date: None,
            current_month: None,
            start_date: today,
        }
    }
}

/// True when the goal has not been reset or continued on `date`
pub fn needs_daily_reset(goal: &Goal, date: NaiveDate) -> bool {
    goal.last_reset_date() != Some(date)
}

/// True when the goal is not counting `month`
pub fn needs_monthly_reset(goal: &Goal, month: MonthKey) -> bool {
    goal.current_month() != Some(month)
}

/// A streak breaks after a gap of two or more calendar days.
///
/// Yesterday to today continues it; no previous activity never breaks it.
pub fn is_streak_broken(last_activity: Option<NaiveDate>, date: NaiveDate) -> bool {
    match last_activity {
        None => false,
        Some(last) => (date - last).num_days() > 1,
    }
}

pub fn has_activity_today(last_activity: Option<NaiveDate>, date: NaiveDate) -> bool {
    last_activity == Some(date)
}

/// Compute the next state of `goal` after a completion of `completed_count`
/// repetitions on `date`.
///
/// Returns `None` when nothing should be recorded, which only happens for
/// streak goals that were already counted on `date`. Completion is sticky:
/// a goal that was completed stays completed until explicitly reset.
pub fn calculate_goal_progress(goal: &Goal, completed_count: u32, date: NaiveDate) -> Option<GoalUpdate> {
    let count = u64::from(completed_count);

    let mut update = match &goal.kind {
        GoalKind::DailyStreak { streak_count, .. } | GoalKind::DhikrStreak { streak_count, .. } => {
            if has_activity_today(goal.last_activity_date, date) {
                return None;
            }
            let streak = if is_streak_broken(goal.last_activity_date, date) {
                1
            } else {
                streak_count.saturating_add(1)
            };
            GoalUpdate {
                streak_count: Some(streak),
                last_reset_date: Some(date),
                ..GoalUpdate::counted(u64::from(streak), date)
            }
        }
        GoalKind::TotalCount | GoalKind::SpecificDhikr { .. } | GoalKind::Combination { .. } => {
            GoalUpdate::counted(goal.current_value.saturating_add(count), date)
        }
        GoalKind::MonthlyTarget { monthly_progress, .. } => {
            let month = MonthKey::of(date);
            if needs_monthly_reset(goal, month) {
                GoalUpdate {
                    monthly_progress: Some(count),
                    current_month: Some(month),
                    last_reset_date: Some(date),
                    ..GoalUpdate::counted(count, date)
                }
            } else {
                let progress = monthly_progress.saturating_add(count);
                GoalUpdate {
                    monthly_progress: Some(progress),
                    ..GoalUpdate::counted(progress, date)
                }
            }
        }
    };

    update.is_completed = goal.is_completed || update.current_value >= goal.target_value;
    Some(update)
}
