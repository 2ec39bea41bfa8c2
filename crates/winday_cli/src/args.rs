//! Command-line surface.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;
use winday_core::config::DEFAULT_DB_FILE_NAME;
use winday_core::model::checklist::TaskType;
use winday_core::{default_log_level, CoreConfig};

#[derive(Parser, Debug)]
#[command(name = "winday", version, about = "Win the day: daily checklist, habits and quarterly plans")]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, env = "WINDAY_DB_PATH", default_value = DEFAULT_DB_FILE_NAME, global = true)]
    pub db: PathBuf,
    /// Directory for log files; logging stays off when unset.
    #[arg(long, env = "WINDAY_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
    #[arg(long, env = "WINDAY_LOG_LEVEL", default_value = default_log_level(), global = true)]
    pub log_level: String,
    /// Email of the signed-in account.
    #[arg(long, env = "WINDAY_USER", global = true)]
    pub user: Option<String>,
    /// Print JSON instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn core_config(&self) -> CoreConfig {
        CoreConfig {
            db_path: self.db.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register an account.
    Signup {
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a day's checklist.
    Today(DateArg),
    /// Add a task to a day's checklist.
    Add {
        title: String,
        #[arg(long, default_value = "other", value_parser = parse_task_type)]
        kind: TaskType,
        #[arg(long)]
        project: Option<Uuid>,
        #[command(flatten)]
        date: DateArg,
    },
    /// Flip a task between done and not done.
    Toggle { task_id: Uuid },
    /// Delete a task.
    Remove { task_id: Uuid },
    /// Mark a day as won.
    Win(DateArg),
    /// Carry yesterday's unfinished tasks into today.
    Rollover {
        /// Copy every candidate.
        #[arg(long, conflicts_with = "task")]
        all: bool,
        /// Copy a single candidate by its id on yesterday's checklist.
        #[arg(long)]
        task: Option<Uuid>,
    },
    #[command(subcommand)]
    Habit(HabitCommand),
    #[command(subcommand)]
    Goal(GoalCommand),
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Reflect(ReflectCommand),
    /// Analytics over the last 7, 30 or 90 days.
    Stats {
        #[arg(long, default_value_t = 7)]
        range: u32,
    },
    /// Finish or skip first-run setup.
    Onboard {
        #[arg(long)]
        goal: Option<String>,
        #[arg(long, requires = "quarter")]
        project: Option<String>,
        #[arg(long)]
        quarter: Option<String>,
        #[arg(long = "habit")]
        habits: Vec<String>,
        #[arg(long, conflicts_with_all = ["goal", "project", "habits"])]
        skip: bool,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct DateArg {
    /// Calendar date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum HabitCommand {
    List,
    Add { title: String },
    Remove { habit_id: Uuid },
    /// Toggle a habit on a day's checklist.
    Log {
        habit_id: Uuid,
        #[command(flatten)]
        date: DateArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    List,
    Add { title: String },
    Archive { goal_id: Uuid },
    Achieve { goal_id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    List {
        /// Include completed projects.
        #[arg(long)]
        all: bool,
    },
    Add {
        title: String,
        /// Quarter label such as `Q3 2026`.
        #[arg(long)]
        quarter: String,
        #[arg(long)]
        goal: Option<Uuid>,
    },
    Complete { project_id: Uuid },
    /// Add a backlog task to a project.
    Task { project_id: Uuid, title: String },
    /// Flip a backlog task.
    ToggleTask { task_id: Uuid },
    DeleteTask { task_id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum ReflectCommand {
    Show(DateArg),
    Save {
        #[command(flatten)]
        date: DateArg,
        #[arg(long, default_value = "")]
        proud: String,
        #[arg(long, default_value = "")]
        progress: String,
        #[arg(long, default_value = "")]
        learned: String,
        #[arg(long, default_value = "")]
        different: String,
        #[arg(long, default_value = "")]
        grateful: String,
    },
    History,
}

fn parse_task_type(value: &str) -> Result<TaskType, String> {
    TaskType::parse(value).ok_or_else(|| format!("unknown task type `{value}`"))
}
