/// Basic unit tests of the public domain types
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use dhikr_tracker_mcp::*;

#[test]
fn test_dhikr_input_validation() {
    assert!(NewDhikr::new("سُبْحَانَ اللَّهِ", DhikrCategory::Tasbih, 33).validate().is_ok());
    assert!(NewDhikr::new("   ", DhikrCategory::Tasbih, 33).validate().is_err());
}

#[test]
fn test_ids_parse_in_any_spelling() {
    let id = GoalId::new();
    assert_eq!(GoalId::parse(&id.to_string().to_uppercase()).unwrap(), id);
    assert_eq!(id.to_string().parse::<GoalId>().unwrap(), id);
    assert!(matches!(GoalId::parse("42"), Err(DomainError::InvalidId(_))));
}

#[test]
fn test_enum_names_from_text() {
    assert_eq!("after_prayer".parse::<DhikrCategory>().unwrap(), DhikrCategory::AfterPrayer);
    assert_eq!("Monthly_Target".parse::<GoalType>().unwrap(), GoalType::MonthlyTarget);
    assert_eq!("auto_timer".parse::<CountMethod>().unwrap(), CountMethod::AutoTimer);
    assert!("hourly".parse::<ScheduleType>().is_err());
}

#[test]
fn test_month_key_text_form() {
    let key: MonthKey = "2024-02".parse().unwrap();
    assert_eq!(key, MonthKey::of(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    assert_eq!(key.to_string(), "2024-02");
    assert!("2024-13".parse::<MonthKey>().is_err());
}

#[test]
fn test_diacritics_are_ignored_in_search_text() {
    assert_eq!(strip_diacritics("سُبْحَانَ"), "سبحان");
}

#[test]
fn test_completion_percentage_is_bounded() {
    assert_eq!(completion_percentage(99, 33), 100.0);
    assert_eq!(completion_percentage(0, 0), 0.0);
}

#[test]
fn test_weekly_schedule_reminder() {
    let schedule = DhikrSchedule {
        id: ScheduleId::new(),
        dhikr_id: DhikrId::new(),
        schedule_type: ScheduleType::Weekly,
        days_of_week: vec![Weekday::Fri],
        prayer_times: vec![],
        time_of_day: NaiveTime::from_hms_opt(6, 0, 0),
        reminder_enabled: true,
        created_date: chrono::Utc::now(),
        updated_date: None,
    };

    // 2024-03-01 is a Friday
    let friday = NaiveDateTime::parse_from_str("2024-03-01T06:00", "%Y-%m-%dT%H:%M").unwrap();
    let saturday = NaiveDateTime::parse_from_str("2024-03-02T06:00", "%Y-%m-%dT%H:%M").unwrap();
    assert!(schedule.reminder_due(friday, None));
    assert!(!schedule.reminder_due(saturday, None));
}
