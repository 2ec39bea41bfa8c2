use chrono::NaiveDate;
use winday_core::db::open_db_in_memory;
use winday_core::model::checklist::ReflectionAnswers;
use winday_core::repo::{ChecklistRepository, HabitRepository, UserRepository};
use winday_core::service::habit_service::MAX_HABITS;
use winday_core::service::reflection_service::HISTORY_LIMIT;
use winday_core::{
    ChecklistManager, EntityKind, FixedClock, HabitService, ReflectionService, ServiceError,
    SqliteStore, UserContext, UserProfile,
};

const NOW_MS: i64 = 1_772_400_000_000;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn sign_up(store: SqliteStore<'_>, email: &str) -> UserContext {
    let profile = UserProfile::new(email, None);
    store.create_user(&profile).unwrap();
    UserContext::from(&profile)
}

#[test]
fn habits_append_in_order_up_to_the_limit() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let habits = HabitService::new(store);
    let user = sign_up(store, "ada@example.com");

    for index in 0..MAX_HABITS {
        habits.add_habit(&user, &format!("habit {index}")).unwrap();
    }
    let err = habits.add_habit(&user, "eleventh").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::LimitReached {
            entity: EntityKind::Habit,
            limit: 10
        }
    ));

    let listed = habits.list_habits(&user).unwrap();
    assert_eq!(listed.len(), 10);
    assert_eq!(listed[0].title, "habit 0");
    assert_eq!(listed[9].sort_order, 9);
}

#[test]
fn removing_a_habit_cascades_to_its_logs() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3, 2), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let habits = HabitService::new(store);
    let user = sign_up(store, "ada@example.com");

    let habit = habits.add_habit(&user, "Stretch").unwrap();
    let checklist = manager.get_or_create_checklist(&user, date(3, 2)).unwrap();
    manager
        .toggle_habit_log(&user, checklist.id, habit.id)
        .unwrap();
    assert_eq!(store.list_habit_logs(checklist.id).unwrap().len(), 1);

    habits.remove_habit(&user, habit.id).unwrap();

    assert!(store.get_habit(habit.id).unwrap().is_none());
    assert!(store.list_habit_logs(checklist.id).unwrap().is_empty());
}

#[test]
fn foreign_habits_cannot_be_removed_or_logged() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3, 2), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let habits = HabitService::new(store);
    let ada = sign_up(store, "ada@example.com");
    let bob = sign_up(store, "bob@example.com");

    let habit = habits.add_habit(&ada, "Journal").unwrap();
    let bob_day = manager.get_or_create_checklist(&bob, date(3, 2)).unwrap();

    assert!(matches!(
        habits.remove_habit(&bob, habit.id).unwrap_err(),
        ServiceError::NotFound { entity: EntityKind::Habit, .. }
    ));
    assert!(matches!(
        manager
            .toggle_habit_log(&bob, bob_day.id, habit.id)
            .unwrap_err(),
        ServiceError::NotFound { entity: EntityKind::Habit, .. }
    ));
}

#[test]
fn reflection_starts_empty_and_creates_the_day() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3, 2), NOW_MS);
    let reflections = ReflectionService::new(store, &clock);
    let user = sign_up(store, "ada@example.com");

    let entry = reflections.get_reflection(&user, date(3, 2)).unwrap();

    assert_eq!(entry.answers, ReflectionAnswers::default());
    assert_eq!(entry.updated_at, None);
    let checklist = store
        .find_checklist(user.user_id, date(3, 2))
        .unwrap()
        .unwrap();
    assert_eq!(entry.checklist_id, checklist.id);
}

#[test]
fn saving_twice_updates_the_single_reflection() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3, 2), NOW_MS);
    let reflections = ReflectionService::new(store, &clock);
    let user = sign_up(store, "ada@example.com");

    let mut answers = ReflectionAnswers {
        proud: "shipped".to_string(),
        grateful: "coffee".to_string(),
        ..ReflectionAnswers::default()
    };
    let first = reflections
        .save_reflection(&user, date(3, 2), &answers)
        .unwrap();

    clock.advance_ms(1_000);
    answers.learned = "patience".to_string();
    let second = reflections
        .save_reflection(&user, date(3, 2), &answers)
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.updated_at, NOW_MS + 1_000);
    let loaded = reflections.get_reflection(&user, date(3, 2)).unwrap();
    assert_eq!(loaded.answers, answers);
    assert_eq!(reflections.reflection_history(&user).unwrap().len(), 1);
}

#[test]
fn history_is_newest_first_and_capped() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3, 31), NOW_MS);
    let reflections = ReflectionService::new(store, &clock);
    let user = sign_up(store, "ada@example.com");

    let first_day = date(2, 1);
    for offset in 0..35 {
        let day = first_day + chrono::Days::new(offset);
        let answers = ReflectionAnswers {
            proud: format!("day {offset}"),
            ..ReflectionAnswers::default()
        };
        reflections.save_reflection(&user, day, &answers).unwrap();
    }

    let history = reflections.reflection_history(&user).unwrap();
    assert_eq!(history.len(), HISTORY_LIMIT as usize);
    assert_eq!(history[0].date, first_day + chrono::Days::new(34));
    assert!(history.windows(2).all(|pair| pair[0].date > pair[1].date));
}
