use chrono::NaiveDate;
use winday_core::db::open_db_in_memory;
use winday_core::model::checklist::{ChecklistId, TaskId, TaskType};
use winday_core::model::plan::Project;
use winday_core::repo::{ChecklistRepository, PlanRepository, UserRepository};
use winday_core::service::habit_service::HabitService;
use winday_core::{
    compute_rollover, ChecklistManager, DayChange, EntityKind, FixedClock, ServiceError,
    SqliteStore, UserContext, UserProfile,
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

fn add(
    manager: &ChecklistManager<SqliteStore<'_>, &FixedClock>,
    user: &UserContext,
    checklist_id: ChecklistId,
    title: &str,
    kind: TaskType,
) -> TaskId {
    match manager
        .add_task(user, checklist_id, title, kind, None)
        .unwrap()
    {
        DayChange::TaskAdded(task) => task.id,
        other => panic!("unexpected change: {other:?}"),
    }
}

#[test]
fn duplicates_done_and_focus_tasks_are_not_candidates() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);

    let yesterday = manager.get_or_create_checklist(&user, date(2)).unwrap();
    add(&manager, &user, yesterday.id, "A", TaskType::Other);
    let b = add(&manager, &user, yesterday.id, "B", TaskType::Other);
    manager.toggle_task(&user, b).unwrap();
    add(&manager, &user, yesterday.id, "C", TaskType::Focus);

    let today = manager.get_or_create_checklist(&user, date(3)).unwrap();
    add(&manager, &user, today.id, "A", TaskType::Other);

    let session = compute_rollover(&manager, &user, date(3)).unwrap();
    assert!(session.is_empty());
    assert_eq!(session.today_checklist_id(), today.id);
}

#[test]
fn title_match_is_exact_and_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);

    let yesterday = manager.get_or_create_checklist(&user, date(2)).unwrap();
    add(&manager, &user, yesterday.id, "email Sam", TaskType::Other);
    let today = manager.get_or_create_checklist(&user, date(3)).unwrap();
    add(&manager, &user, today.id, "Email Sam", TaskType::Other);

    let session = compute_rollover(&manager, &user, date(3)).unwrap();
    let titles: Vec<&str> = session
        .candidates()
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(titles, vec!["email Sam"]);
}

#[test]
fn missing_yesterday_yields_no_candidates_and_creates_today() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);

    let session = compute_rollover(&manager, &user, date(3)).unwrap();

    assert!(session.is_empty());
    let today = store.find_checklist(user.user_id, date(3)).unwrap().unwrap();
    assert_eq!(session.today_checklist_id(), today.id);
}

#[test]
fn only_the_previous_calendar_day_is_considered() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);

    let two_days_ago = manager.get_or_create_checklist(&user, date(1)).unwrap();
    add(&manager, &user, two_days_ago.id, "stale", TaskType::Other);

    assert!(compute_rollover(&manager, &user, date(3)).unwrap().is_empty());
}

#[test]
fn rollover_single_copies_one_candidate_and_keeps_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);
    let project = Project::new(user.user_id, "Launch", "Q1 2026", None);
    store.insert_project(&project).unwrap();

    let yesterday = manager.get_or_create_checklist(&user, date(2)).unwrap();
    add(&manager, &user, yesterday.id, "first", TaskType::Other);
    let linked = match manager
        .add_task(
            &user,
            yesterday.id,
            "second",
            TaskType::Project,
            Some(project.id),
        )
        .unwrap()
    {
        DayChange::TaskAdded(task) => task.id,
        other => panic!("unexpected change: {other:?}"),
    };

    let mut session = compute_rollover(&manager, &user, date(3)).unwrap();
    assert_eq!(session.candidates().len(), 2);

    let change = session.rollover_single(&manager, &user, linked).unwrap();
    let DayChange::TaskAdded(copy) = change else {
        panic!("expected TaskAdded");
    };
    assert_ne!(copy.id, linked);
    assert_eq!(copy.checklist_id, session.today_checklist_id());
    assert_eq!(copy.title, "second");
    assert_eq!(copy.kind, TaskType::Project);
    assert_eq!(copy.project_id, Some(project.id));
    assert!(!copy.is_done);

    let remaining: Vec<&str> = session
        .candidates()
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(remaining, vec!["first"]);

    let err = session.rollover_single(&manager, &user, linked).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Task,
            ..
        }
    ));
}

#[test]
fn rollover_all_preserves_order_and_leaves_yesterday_untouched() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);
    let habit = HabitService::new(store).add_habit(&user, "Meditate").unwrap();

    let yesterday = manager.get_or_create_checklist(&user, date(2)).unwrap();
    for title in ["one", "two", "three"] {
        add(&manager, &user, yesterday.id, title, TaskType::Other);
    }
    manager
        .toggle_habit_log(&user, yesterday.id, habit.id)
        .unwrap();

    let mut session = compute_rollover(&manager, &user, date(3)).unwrap();
    let changes = session.rollover_all(&manager, &user).unwrap();

    assert_eq!(changes.len(), 3);
    assert!(session.is_empty());
    let today_titles: Vec<String> = store
        .list_tasks(session.today_checklist_id())
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(today_titles, vec!["one", "two", "three"]);
    assert_eq!(store.count_tasks(yesterday.id).unwrap(), 3);
    assert!(store
        .list_habit_logs(session.today_checklist_id())
        .unwrap()
        .is_empty());
}

#[test]
fn dismiss_clears_candidates_without_copying() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let clock = FixedClock::new(date(3), NOW_MS);
    let manager = ChecklistManager::new(store, &clock);
    let user = sign_up(store);

    let yesterday = manager.get_or_create_checklist(&user, date(2)).unwrap();
    add(&manager, &user, yesterday.id, "later", TaskType::Other);

    let mut session = compute_rollover(&manager, &user, date(3)).unwrap();
    assert_eq!(session.candidates().len(), 1);
    session.dismiss();

    assert!(session.is_empty());
    assert_eq!(store.count_tasks(session.today_checklist_id()).unwrap(), 0);
}
