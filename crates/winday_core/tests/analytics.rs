use chrono::NaiveDate;
use winday_core::db::open_db_in_memory;
use winday_core::model::checklist::TaskType;
use winday_core::repo::UserRepository;
use winday_core::service::progress::HeatmapCell;
use winday_core::{
    AnalyticsService, ChecklistManager, DayChange, FixedClock, HabitService, PlanService,
    ServiceError, SqliteStore, UserContext, UserProfile, ValidationError,
};

const NOW_MS: i64 = 1_772_400_000_000;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn sign_up(store: SqliteStore<'_>) -> UserContext {
    let profile = UserProfile::new("ada@example.com", None);
    store.create_user(&profile).unwrap();
    UserContext::from(&profile)
}

/// Seeds 2026-03-06..=10 plus an out-of-range win on 03-01.
///
/// Wins on 8, 9, 10; "Meditate" logged done on 6 and 7, missed on 8.
fn seed(store: SqliteStore<'_>, clock: &FixedClock, user: &UserContext) {
    let manager = ChecklistManager::new(store, clock);
    let habit = HabitService::new(store).add_habit(user, "Meditate").unwrap();

    let old = manager.get_or_create_checklist(user, date(1)).unwrap();
    manager.win_the_day(user, old.id).unwrap();

    for day in 6..=10 {
        let checklist = manager.get_or_create_checklist(user, date(day)).unwrap();
        if day <= 8 {
            manager
                .toggle_habit_log(user, checklist.id, habit.id)
                .unwrap();
        }
        if day == 8 {
            manager
                .toggle_habit_log(user, checklist.id, habit.id)
                .unwrap();
        }
        if day >= 8 {
            manager.win_the_day(user, checklist.id).unwrap();
        }
        if day == 10 {
            let DayChange::TaskAdded(done) = manager
                .add_task(user, checklist.id, "done", TaskType::Other, None)
                .unwrap()
            else {
                panic!("expected TaskAdded");
            };
            manager.toggle_task(user, done.id).unwrap();
            manager
                .add_task(user, checklist.id, "open", TaskType::Other, None)
                .unwrap();
        }
    }
}

#[test]
fn weekly_report_aggregates_the_window() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(10), NOW_MS);
    let user = sign_up(store);
    seed(store, &clock, &user);

    let report = AnalyticsService::new(store, &clock)
        .analytics_report(&user, 7)
        .unwrap();

    assert_eq!(report.since, date(3));
    assert_eq!(report.win_rate.won_days, 3);
    assert_eq!(report.win_rate.total_days, 5);
    assert_eq!(report.win_rate.pct, 60);
    assert_eq!(report.current_streak, 3);
    assert_eq!((report.tasks.done, report.tasks.total), (1, 2));

    assert_eq!(report.habits.len(), 1);
    let meditate = report.habits[0].completion;
    assert_eq!((meditate.done, meditate.total, meditate.pct), (2, 3, 67));

    let daily: Vec<(NaiveDate, bool, u32)> = report
        .daily
        .iter()
        .map(|day| (day.date, day.won, day.tasks_done))
        .collect();
    assert_eq!(
        daily,
        vec![
            (date(6), false, 0),
            (date(7), false, 0),
            (date(8), true, 0),
            (date(9), true, 0),
            (date(10), true, 1),
        ]
    );
}

#[test]
fn heatmap_covers_each_day_of_the_window() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(10), NOW_MS);
    let user = sign_up(store);
    seed(store, &clock, &user);

    let report = AnalyticsService::new(store, &clock)
        .analytics_report(&user, 7)
        .unwrap();

    assert_eq!(report.heatmap_days.first(), Some(&date(4)));
    assert_eq!(report.heatmap_days.last(), Some(&date(10)));
    assert_eq!(report.heatmap.len(), 1);
    assert_eq!(
        report.heatmap[0].cells,
        vec![
            HeatmapCell::NoData,
            HeatmapCell::NoData,
            HeatmapCell::Done,
            HeatmapCell::Done,
            HeatmapCell::Missed,
            HeatmapCell::NoData,
            HeatmapCell::NoData,
        ]
    );
}

#[test]
fn sidebar_streak_leaves_today_out() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(10), NOW_MS);
    let user = sign_up(store);
    seed(store, &clock, &user);
    let analytics = AnalyticsService::new(store, &clock);

    assert_eq!(analytics.sidebar_streak(&user).unwrap(), 2);

    clock.set_today(date(11));
    assert_eq!(analytics.sidebar_streak(&user).unwrap(), 3);

    clock.set_today(date(13));
    assert_eq!(analytics.sidebar_streak(&user).unwrap(), 0);
}

#[test]
fn report_lists_every_project_with_progress() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(10), NOW_MS);
    let user = sign_up(store);
    let plans = PlanService::new(store, &clock);
    let active = plans.add_project(&user, "Active", "Q1 2026", None).unwrap();
    let done = plans.add_project(&user, "Done", "Q1 2026", None).unwrap();
    plans
        .complete_project(&user, done.project.project.id)
        .unwrap();

    let report = AnalyticsService::new(store, &clock)
        .analytics_report(&user, 30)
        .unwrap();

    let ids: Vec<_> = report
        .projects
        .iter()
        .map(|overview| overview.project.project.id)
        .collect();
    assert_eq!(ids, vec![active.project.project.id, done.project.project.id]);
    assert_eq!(report.win_rate.pct, 0);
    assert_eq!(report.current_streak, 0);
}

#[test]
fn unsupported_range_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(10), NOW_MS);
    let user = sign_up(store);

    let err = AnalyticsService::new(store, &clock)
        .analytics_report(&user, 14)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Invalid(ValidationError::UnsupportedRange(14))
    ));
}

#[test]
fn report_serializes_heatmap_cells_in_snake_case() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(10), NOW_MS);
    let user = sign_up(store);
    seed(store, &clock, &user);

    let report = AnalyticsService::new(store, &clock)
        .analytics_report(&user, 7)
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["heatmap"][0]["cells"][0], "no_data");
    assert_eq!(json["daily"][4]["date"], "2026-03-10");
    assert_eq!(json["win_rate"]["pct"], 60);
}
