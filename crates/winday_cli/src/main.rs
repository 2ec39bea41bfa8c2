//! `winday` command-line entry point.
//!
//! # Responsibility
//! - Open the local database and resolve the signed-in account.
//! - Dispatch one subcommand to the core services and print the result.

mod args;

use args::{Cli, Command, DateArg, GoalCommand, HabitCommand, ProjectCommand, ReflectCommand};
use chrono::NaiveDate;
use clap::Parser;
use log::error;
use serde_json::json;
use std::error::Error;
use std::process::ExitCode;
use winday_core::model::checklist::ReflectionAnswers;
use winday_core::service::onboarding_service::OnboardingProject;
use winday_core::{
    compute_rollover, init_logging, open_db, AnalyticsService, ChecklistManager, Clock,
    HabitService, OnboardingPlan, OnboardingService, PlanService,
    ReflectionService, SessionHub, SqliteStore, SystemClock, UserContext,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli, SystemClock) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run<C: Clock + Copy>(cli: Cli, clock: C) -> CliResult<()> {
    let config = cli.core_config();
    if config.log_dir.is_some() {
        let cwd = std::env::current_dir()?;
        if let Some(dir) = config.log_dir_under(&cwd) {
            init_logging(&config.log_level, &dir)?;
        }
    }

    let conn = open_db(&config.db_path)?;
    let store = SqliteStore::try_new(&conn)?;
    let mut session = SessionHub::new(store);
    let out = Output { json: cli.json };

    if let Command::Signup { email, name } = &cli.command {
        let profile = session.sign_up(email, name.clone())?;
        return out.print(&profile, || format!("signed up {} ({})", profile.email, profile.id));
    }

    let email = cli
        .user
        .as_deref()
        .ok_or("no account selected; pass --user or set WINDAY_USER")?;
    let user = session.sign_in(email)?;
    let day = |date: DateArg| date.date.unwrap_or_else(|| clock.today());
    let manager = ChecklistManager::new(store, clock);

    match cli.command {
        Command::Signup { .. } => Ok(()),
        Command::Today(date) => {
            let view = manager.load_day(&user, day(date))?;
            out.print(&view, || {
                let mut lines = vec![format!(
                    "{} won={} can_win={}",
                    view.checklist.date,
                    view.checklist.won_the_day,
                    view.can_win_the_day()
                )];
                lines.extend(view.tasks.iter().map(|task| {
                    format!(
                        "[{}] {} {:<7} {}",
                        if task.is_done { "x" } else { " " },
                        task.id,
                        task.kind.as_str(),
                        task.title
                    )
                }));
                lines.extend(view.habits.iter().map(|habit| {
                    format!(
                        "({}) {} habit   {}",
                        if view.habit_done(habit.id) { "x" } else { " " },
                        habit.id,
                        habit.title
                    )
                }));
                lines.join("\n")
            })
        }
        Command::Add {
            title,
            kind,
            project,
            date,
        } => {
            let checklist = manager.get_or_create_checklist(&user, day(date))?;
            let change = manager.add_task(&user, checklist.id, &title, kind, project)?;
            out.print(&change, || "task added".to_string())
        }
        Command::Toggle { task_id } => {
            let change = manager.toggle_task(&user, task_id)?;
            out.print(&change, || "task toggled".to_string())
        }
        Command::Remove { task_id } => {
            manager.remove_task(&user, task_id)?;
            out.print(&json!({ "removed": task_id }), || "task removed".to_string())
        }
        Command::Win(date) => {
            let view = manager.load_day(&user, day(date))?;
            let checklist = &view.checklist;
            if !checklist.won_the_day && !view.can_win_the_day() {
                return Err(format!("{}: complete your focus task first", checklist.date).into());
            }
            manager.win_the_day(&user, checklist.id)?;
            out.print(&json!({ "won": checklist.date }), || {
                format!("{} won", checklist.date)
            })
        }
        Command::Rollover { all, task } => {
            let mut rollover = compute_rollover(&manager, &user, clock.today())?;
            if all {
                let copied = rollover.rollover_all(&manager, &user)?;
                return out.print(&json!({ "copied": copied.len() }), || {
                    format!("{} tasks carried over", copied.len())
                });
            }
            if let Some(task_id) = task {
                rollover.rollover_single(&manager, &user, task_id)?;
                return out.print(&json!({ "copied": 1 }), || "task carried over".to_string());
            }
            out.print(rollover.candidates(), || {
                rollover
                    .candidates()
                    .iter()
                    .map(|task| format!("{} {}", task.id, task.title))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Habit(command) => {
            run_habit(&manager, HabitService::new(store), &user, command, day, out)
        }
        Command::Goal(command) => run_goal(store, clock, &user, command, out),
        Command::Project(command) => run_project(store, clock, &user, command, out),
        Command::Reflect(command) => {
            run_reflect(ReflectionService::new(store, clock), &user, command, day, out)
        }
        Command::Stats { range } => {
            let analytics = AnalyticsService::new(store, clock);
            let report = analytics.analytics_report(&user, range)?;
            let sidebar = analytics.sidebar_streak(&user)?;
            out.print(&report, || {
                format!(
                    "last {} days: win rate {}% ({}/{}), streak {} (sidebar {}), tasks {}/{}",
                    report.range_days,
                    report.win_rate.pct,
                    report.win_rate.won_days,
                    report.win_rate.total_days,
                    report.current_streak,
                    sidebar,
                    report.tasks.done,
                    report.tasks.total
                )
            })
        }
        Command::Onboard {
            goal,
            project,
            quarter,
            habits,
            skip,
        } => {
            let onboarding = OnboardingService::new(store, clock);
            if skip {
                let profile = onboarding.skip_onboarding(&user)?;
                return out.print(&profile, || "onboarding skipped".to_string());
            }
            let plan = OnboardingPlan {
                goal_title: goal,
                project: project.map(|title| OnboardingProject {
                    title,
                    quarter: quarter.unwrap_or_default(),
                }),
                habits,
            };
            let outcome = onboarding.finish_onboarding(&user, &plan)?;
            out.print(&outcome, || {
                format!("onboarding complete, {} habits", outcome.habits.len())
            })
        }
    }
}

fn run_habit<C: Clock>(
    manager: &ChecklistManager<SqliteStore<'_>, C>,
    habits: HabitService<SqliteStore<'_>>,
    user: &UserContext,
    command: HabitCommand,
    day: impl Fn(DateArg) -> NaiveDate,
    out: Output,
) -> CliResult<()> {
    match command {
        HabitCommand::List => {
            let list = habits.list_habits(user)?;
            out.print(&list, || {
                list.iter()
                    .map(|habit| format!("{} {}", habit.id, habit.title))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        HabitCommand::Add { title } => {
            let habit = habits.add_habit(user, &title)?;
            out.print(&habit, || format!("habit {} added", habit.id))
        }
        HabitCommand::Remove { habit_id } => {
            habits.remove_habit(user, habit_id)?;
            out.print(&json!({ "removed": habit_id }), || "habit removed".to_string())
        }
        HabitCommand::Log { habit_id, date } => {
            let checklist = manager.get_or_create_checklist(user, day(date))?;
            let change = manager.toggle_habit_log(user, checklist.id, habit_id)?;
            out.print(&change, || "habit toggled".to_string())
        }
    }
}

fn run_goal<C: Clock>(
    store: SqliteStore<'_>,
    clock: C,
    user: &UserContext,
    command: GoalCommand,
    out: Output,
) -> CliResult<()> {
    let plans = PlanService::new(store, clock);
    match command {
        GoalCommand::List => {
            let goals = plans.list_goals(user)?;
            out.print(&goals, || {
                goals
                    .iter()
                    .map(|overview| {
                        format!(
                            "{} {} {}% ({} projects)",
                            overview.goal.goal.id,
                            overview.goal.goal.title,
                            overview.progress.pct,
                            overview.progress.project_count
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        GoalCommand::Add { title } => {
            let goal = plans.add_goal(user, &title)?;
            out.print(&goal, || format!("goal {} added", goal.id))
        }
        GoalCommand::Archive { goal_id } => {
            let goal = plans.archive_goal(user, goal_id)?;
            out.print(&goal, || "goal archived".to_string())
        }
        GoalCommand::Achieve { goal_id } => {
            let goal = plans.achieve_goal(user, goal_id)?;
            out.print(&goal, || "goal achieved".to_string())
        }
    }
}

fn run_project<C: Clock>(
    store: SqliteStore<'_>,
    clock: C,
    user: &UserContext,
    command: ProjectCommand,
    out: Output,
) -> CliResult<()> {
    let plans = PlanService::new(store, clock);
    let summary = |overview: &winday_core::service::plan_service::ProjectOverview| {
        format!(
            "{} {} [{}] {}/{} {}%",
            overview.project.project.id,
            overview.project.project.title,
            overview.project.project.quarter,
            overview.progress.done,
            overview.progress.total,
            overview.progress.pct
        )
    };
    match command {
        ProjectCommand::List { all } => {
            let projects = if all {
                plans.list_all_projects(user)?
            } else {
                plans.list_active_projects(user)?
            };
            out.print(&projects, || {
                projects.iter().map(summary).collect::<Vec<_>>().join("\n")
            })
        }
        ProjectCommand::Add {
            title,
            quarter,
            goal,
        } => {
            let project = plans.add_project(user, &title, &quarter, goal)?;
            out.print(&project, || summary(&project))
        }
        ProjectCommand::Complete { project_id } => {
            let project = plans.complete_project(user, project_id)?;
            out.print(&project, || "project completed".to_string())
        }
        ProjectCommand::Task { project_id, title } => {
            let project = plans.add_project_task(user, project_id, &title)?;
            out.print(&project, || summary(&project))
        }
        ProjectCommand::ToggleTask { task_id } => {
            let project = plans.toggle_project_task(user, task_id)?;
            out.print(&project, || summary(&project))
        }
        ProjectCommand::DeleteTask { task_id } => {
            let project = plans.delete_project_task(user, task_id)?;
            out.print(&project, || summary(&project))
        }
    }
}

fn run_reflect<C: Clock>(
    reflections: ReflectionService<SqliteStore<'_>, C>,
    user: &UserContext,
    command: ReflectCommand,
    day: impl Fn(DateArg) -> NaiveDate,
    out: Output,
) -> CliResult<()> {
    match command {
        ReflectCommand::Show(date) => {
            let entry = reflections.get_reflection(user, day(date))?;
            out.print(&entry, || format_answers(&entry.answers))
        }
        ReflectCommand::Save {
            date,
            proud,
            progress,
            learned,
            different,
            grateful,
        } => {
            let answers = ReflectionAnswers {
                proud,
                progress,
                learned,
                different,
                grateful,
            };
            let saved = reflections.save_reflection(user, day(date), &answers)?;
            out.print(&saved, || "reflection saved".to_string())
        }
        ReflectCommand::History => {
            let history = reflections.reflection_history(user)?;
            out.print(&history, || {
                history
                    .iter()
                    .map(|entry| {
                        let answers = format_answers(&entry.reflection.answers);
                        format!("{}\n{answers}", entry.date)
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
        }
    }
}

fn format_answers(answers: &ReflectionAnswers) -> String {
    [
        ("proud", &answers.proud),
        ("progress", &answers.progress),
        ("learned", &answers.learned),
        ("different", &answers.different),
        ("grateful", &answers.grateful),
    ]
    .iter()
    .map(|(prompt, answer)| format!("  {prompt}: {answer}"))
    .collect::<Vec<_>>()
    .join("\n")
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn print<T: serde::Serialize + ?Sized>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{run, CliResult};
    use crate::args::Cli;
    use chrono::NaiveDate;
    use clap::Parser;
    use std::path::Path;
    use winday_core::model::checklist::{Checklist, DailyTask};
    use winday_core::repo::{ChecklistRepository, UserRepository};
    use winday_core::{open_db, FixedClock, SqliteStore};

    const EMAIL: &str = "ada@example.com";

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn winday(db: &Path, clock: &FixedClock, args: &[&str]) -> CliResult<()> {
        let mut argv = vec![
            "winday".to_string(),
            "--db".to_string(),
            db.display().to_string(),
            "--user".to_string(),
            EMAIL.to_string(),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        run(Cli::try_parse_from(argv).unwrap(), clock)
    }

    fn stored_day(db: &Path, day: NaiveDate) -> Option<(Checklist, Vec<DailyTask>)> {
        let conn = open_db(db).unwrap();
        let store = SqliteStore::try_new(&conn).unwrap();
        let user = store.find_user_by_email(EMAIL).unwrap().unwrap();
        let checklist = store.find_checklist(user.id, day).unwrap()?;
        let tasks = store.list_tasks(checklist.id).unwrap();
        Some((checklist, tasks))
    }

    #[test]
    fn config_flags_fill_core_config() {
        let cli = Cli::try_parse_from([
            "winday",
            "--db",
            "/tmp/day.sqlite3",
            "--log-level",
            "warn",
            "--log-dir",
            "logs",
            "today",
        ])
        .unwrap();
        let config = cli.core_config();

        assert_eq!(config.db_path, Path::new("/tmp/day.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some(Path::new("logs")));
    }

    #[test]
    fn commands_for_unknown_account_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("winday.sqlite3");
        let clock = FixedClock::new(date(10), 0);

        let err = winday(&db, &clock, &["today"]).unwrap_err();
        assert_eq!(err.to_string(), format!("no account for `{EMAIL}`"));
        assert!(winday(&db, &clock, &["signup", EMAIL]).is_ok());
        assert!(winday(&db, &clock, &["signup", EMAIL]).is_err());
    }

    #[test]
    fn win_requires_a_finished_focus_task() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("winday.sqlite3");
        let clock = FixedClock::new(date(10), 1_773_100_000_000);
        winday(&db, &clock, &["signup", EMAIL]).unwrap();

        let err = winday(&db, &clock, &["win"]).unwrap_err();
        assert!(err.to_string().contains("focus task"));
        let (checklist, _) = stored_day(&db, date(10)).unwrap();
        assert!(!checklist.won_the_day);

        winday(&db, &clock, &["add", "Ship the release", "--kind", "focus"]).unwrap();
        assert!(winday(&db, &clock, &["win"]).is_err());

        let (_, tasks) = stored_day(&db, date(10)).unwrap();
        let focus = tasks[0].id.to_string();
        winday(&db, &clock, &["toggle", &focus]).unwrap();
        winday(&db, &clock, &["win"]).unwrap();

        let (checklist, _) = stored_day(&db, date(10)).unwrap();
        assert!(checklist.won_the_day);
        assert_eq!(checklist.won_at, Some(1_773_100_000_000));

        winday(&db, &clock, &["toggle", &focus]).unwrap();
        winday(&db, &clock, &["win"]).unwrap();
    }

    #[test]
    fn rollover_all_carries_yesterdays_open_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("winday.sqlite3");
        let clock = FixedClock::new(date(10), 0);
        winday(&db, &clock, &["signup", EMAIL]).unwrap();

        winday(&db, &clock, &["add", "Write report", "--date", "2026-03-09"]).unwrap();
        winday(&db, &clock, &["add", "Call bank", "--date", "2026-03-09"]).unwrap();
        let (_, yesterday) = stored_day(&db, date(9)).unwrap();
        let done = yesterday[1].id.to_string();
        winday(&db, &clock, &["toggle", &done]).unwrap();

        winday(&db, &clock, &["rollover"]).unwrap();
        let (_, today) = stored_day(&db, date(10)).unwrap();
        assert!(today.is_empty());

        winday(&db, &clock, &["rollover", "--all"]).unwrap();
        let (_, today) = stored_day(&db, date(10)).unwrap();
        let titles: Vec<&str> = today.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["Write report"]);
        assert!(!today[0].is_done);

        winday(&db, &clock, &["rollover", "--all"]).unwrap();
        assert_eq!(stored_day(&db, date(10)).unwrap().1.len(), 1);
    }
}
