/// Goal progress rules applied through the public engine
use chrono::{NaiveDate, Utc};
use dhikr_tracker_mcp::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn goal(kind: GoalKind, target_value: u64) -> Goal {
    Goal {
        id: GoalId::new(),
        title: "Goal".to_string(),
        description: None,
        kind,
        target_value,
        current_value: 0,
        is_completed: false,
        last_activity_date: None,
        reward_message: None,
        start_date: None,
        end_date: None,
        created_date: Utc::now(),
        updated_date: None,
    }
}

/// Feed completions to a goal the way the orchestrator does
fn run(mut goal: Goal, completions: &[(NaiveDate, u32)]) -> Goal {
    for &(day, count) in completions {
        if let Some(update) = calculate_goal_progress(&goal, count, day) {
            update.apply_to(&mut goal);
        }
    }
    goal
}

#[test]
fn test_daily_streak_continues_breaks_and_restarts() {
    let streak = goal(GoalKind::DailyStreak { streak_count: 0, last_reset_date: None }, 5);

    let continued = run(
        streak.clone(),
        &[(date(2024, 2, 27), 1), (date(2024, 2, 28), 1), (date(2024, 2, 29), 1), (date(2024, 3, 1), 1)],
    );
    assert_eq!(continued.streak_count(), 4);
    assert_eq!(continued.current_value, 4);

    let broken = run(streak, &[(date(2024, 2, 27), 1), (date(2024, 2, 28), 1), (date(2024, 3, 2), 1)]);
    assert_eq!(broken.streak_count(), 1);
    assert_eq!(broken.last_activity_date, Some(date(2024, 3, 2)));
}

#[test]
fn test_same_day_counts_once_for_streaks() {
    let streak = goal(
        GoalKind::DhikrStreak { dhikr_ids: vec![DhikrId::new()], streak_count: 0, last_reset_date: None },
        3,
    );
    let after = run(streak, &[(date(2024, 5, 1), 33), (date(2024, 5, 1), 33), (date(2024, 5, 1), 100)]);
    assert_eq!(after.streak_count(), 1);
}

#[test]
fn test_monthly_target_rolls_over_at_month_boundary() {
    let monthly = goal(
        GoalKind::MonthlyTarget { current_month: None, monthly_progress: 0, last_reset_date: None },
        500,
    );

    let after = run(
        monthly,
        &[(date(2023, 12, 30), 100), (date(2023, 12, 31), 100), (date(2024, 1, 1), 7)],
    );
    assert_eq!(after.monthly_progress(), 7);
    assert_eq!(after.current_value, 7);
    assert_eq!(after.current_month(), Some(MonthKey::new(2024, 1).unwrap()));
}

#[test]
fn test_completion_is_sticky() {
    let combination = goal(GoalKind::Combination { dhikr_ids: vec![DhikrId::new()] }, 50);
    let done = run(combination, &[(date(2024, 1, 1), 60)]);
    assert!(done.is_completed);

    let update = calculate_goal_progress(&done, 1, date(2024, 1, 2)).unwrap();
    assert!(update.is_completed);
    assert_eq!(update.current_value, 61);
}

#[test]
fn test_monthly_completion_survives_rollover() {
    let monthly = goal(
        GoalKind::MonthlyTarget { current_month: None, monthly_progress: 0, last_reset_date: None },
        100,
    );
    let done = run(monthly, &[(date(2024, 1, 31), 100), (date(2024, 2, 1), 5)]);

    assert!(done.is_completed);
    assert_eq!(done.monthly_progress(), 5);
}
