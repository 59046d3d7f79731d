/// Counting sessions end to end: logs, the settings streak and goals
use chrono::NaiveDate;
use dhikr_tracker_mcp::storage::{DhikrRepository, GoalRepository, LogRepository, SettingsRepository};
use dhikr_tracker_mcp::tools::{
    self, CacheKey, CreateGoalParams, EditGoalParams, GoalParams, ResetGoalParams, SessionOutcome, SessionParams,
};
use dhikr_tracker_mcp::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn goal_params(goal_type: &str, target_value: u64, dhikr_ids: Vec<DhikrId>) -> GoalParams {
    GoalParams {
        title: format!("{} goal", goal_type),
        description: None,
        goal_type: goal_type.to_string(),
        target_value,
        dhikr_ids: dhikr_ids.iter().map(|id| id.to_string()).collect(),
        reward_message: Some("ما شاء الله".to_string()),
        start_date: None,
        end_date: None,
    }
}

fn create_goal(storage: &SqliteStorage, params: GoalParams) -> Goal {
    tools::create_goal(storage, CreateGoalParams { goal: params, date: Some("2024-01-01".to_string()) }).unwrap()
}

fn complete(storage: &SqliteStorage, dhikr_id: DhikrId, count: u32, date: &str) -> tools::CompletionReport {
    tools::record_completion(
        storage,
        SessionParams {
            dhikr_id: dhikr_id.to_string(),
            count,
            method: None,
            duration_seconds: Some(45),
            date: Some(date.to_string()),
            hijri_date: Some("19 جمادى الآخرة 1445".to_string()),
        },
    )
    .unwrap()
}

#[test]
fn test_full_completion_scenario() {
    let storage = SqliteStorage::in_memory().unwrap();
    let dhikr = storage
        .create_dhikr(&NewDhikr::new("سُبْحَانَ اللَّهِ", DhikrCategory::Tasbih, 33))
        .unwrap();
    let total = create_goal(&storage, goal_params("total_count", 30, vec![]));

    let report = complete(&storage, dhikr.id, 33, "2024-01-01");

    let logs = storage.logs_on(day(1)).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].completion_percentage, 100.0);
    assert_eq!(logs[0].hijri_date, "19 جمادى الآخرة 1445");

    let settings = storage.get_or_create_settings().unwrap();
    assert_eq!(settings.current_streak, 1);
    assert_eq!(settings.longest_streak, 1);

    let total = storage.get_goal(total.id).unwrap().unwrap();
    assert!(total.is_completed);
    assert_eq!(total.current_value, 33);
    assert_eq!(report.completed_goals.len(), 1);
    assert_eq!(report.completed_goals[0].reward_message.as_deref(), Some("ما شاء الله"));
    assert_eq!(
        report.invalidated,
        vec![CacheKey::RecentLogs, CacheKey::TodayDhikr, CacheKey::Goals]
    );
}

#[test]
fn test_second_completion_on_a_day_amends_the_log() {
    let storage = SqliteStorage::in_memory().unwrap();
    let dhikr = storage
        .create_dhikr(&NewDhikr::new("الْحَمْدُ لِلَّهِ", DhikrCategory::Tasbih, 33))
        .unwrap();

    tools::record_progress(
        &storage,
        SessionParams {
            dhikr_id: dhikr.id.to_string(),
            count: 12,
            method: None,
            duration_seconds: None,
            date: Some("2024-01-03".to_string()),
            hijri_date: None,
        },
    )
    .unwrap();
    let first = complete(&storage, dhikr.id, 33, "2024-01-03");
    let second = complete(&storage, dhikr.id, 40, "2024-01-03");

    assert!(!first.log_created);
    assert_eq!(first.log.id, second.log.id);

    let logs = storage.logs_for_dhikr(dhikr.id).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].count_completed, 40);
    assert_eq!(logs[0].completion_percentage, 100.0);
}

#[test]
fn test_goal_kinds_follow_their_rules_over_days() {
    let storage = SqliteStorage::in_memory().unwrap();
    let a = storage.create_dhikr(&NewDhikr::new("أَسْتَغْفِرُ اللَّهَ", DhikrCategory::General, 10)).unwrap();
    let b = storage.create_dhikr(&NewDhikr::new("اللَّهُ أَكْبَرُ", DhikrCategory::Tasbih, 10)).unwrap();

    let daily = create_goal(&storage, goal_params("daily_streak", 3, vec![]));
    let a_streak = create_goal(&storage, goal_params("dhikr_streak", 3, vec![a.id]));
    let specific_b = create_goal(&storage, goal_params("specific_dhikr", 100, vec![b.id]));
    let monthly = create_goal(&storage, goal_params("monthly_target", 1000, vec![]));

    complete(&storage, a.id, 10, "2024-01-01");
    complete(&storage, b.id, 10, "2024-01-01");
    complete(&storage, b.id, 10, "2024-01-02");
    complete(&storage, a.id, 10, "2024-01-03");

    let daily = storage.get_goal(daily.id).unwrap().unwrap();
    assert_eq!(daily.streak_count(), 3);
    assert!(daily.is_completed);

    // Dhikr A was skipped on the 2nd
    let a_streak = storage.get_goal(a_streak.id).unwrap().unwrap();
    assert_eq!(a_streak.streak_count(), 1);
    assert!(!a_streak.is_completed);

    let specific_b = storage.get_goal(specific_b.id).unwrap().unwrap();
    assert_eq!(specific_b.current_value, 20);

    let monthly = storage.get_goal(monthly.id).unwrap().unwrap();
    assert_eq!(monthly.monthly_progress(), 40);
    assert_eq!(monthly.current_month(), Some(MonthKey::new(2024, 1).unwrap()));
}

#[test]
fn test_completed_goal_is_left_alone_until_reset() {
    let storage = SqliteStorage::in_memory().unwrap();
    let dhikr_id = DhikrId::new();
    let goal = create_goal(&storage, goal_params("total_count", 10, vec![]));

    let session = |date: NaiveDate| SessionOutcome {
        dhikr_id,
        final_count: 33,
        target_count: 33,
        method: CountMethod::Manual,
        duration_seconds: 0,
        date,
        hijri_date: String::new(),
    };

    tools::complete_session(&storage, &session(day(1))).unwrap();
    let later = tools::complete_session(&storage, &session(day(2))).unwrap();
    assert!(later.goal_updates.is_empty());
    assert_eq!(storage.get_goal(goal.id).unwrap().unwrap().current_value, 33);

    let reset = tools::reset_goal(
        &storage,
        ResetGoalParams { goal_id: goal.id.to_string(), date: Some("2024-01-05".to_string()) },
    )
    .unwrap();
    assert_eq!(reset.current_value, 0);
    assert!(!reset.is_completed);
    assert_eq!(reset.start_date, Some(day(5)));

    tools::complete_session(&storage, &session(day(5))).unwrap();
    assert_eq!(storage.get_goal(goal.id).unwrap().unwrap().current_value, 33);
}

#[test]
fn test_raised_target_keeps_counting() {
    let storage = SqliteStorage::in_memory().unwrap();
    let dhikr = storage
        .create_dhikr(&NewDhikr::new("سُبْحَانَ اللَّهِ", DhikrCategory::Tasbih, 33))
        .unwrap();
    let goal = create_goal(&storage, goal_params("total_count", 30, vec![]));

    complete(&storage, dhikr.id, 33, "2024-01-01");
    assert!(storage.get_goal(goal.id).unwrap().unwrap().is_completed);

    let edited = tools::edit_goal(
        &storage,
        EditGoalParams { goal_id: goal.id.to_string(), goal: goal_params("total_count", 100, vec![]) },
    )
    .unwrap();
    assert!(!edited.is_completed);

    let report = complete(&storage, dhikr.id, 33, "2024-01-02");
    assert_eq!(report.goal_updates.len(), 1);
    assert_eq!(storage.get_goal(goal.id).unwrap().unwrap().current_value, 66);
}
