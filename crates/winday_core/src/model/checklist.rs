//! Daily checklist records: the checklist itself, its tasks, habit logs
//! and the evening reflection.
//!
//! # Invariants
//! - One checklist per `(user_id, date)`.
//! - At most one habit log per `(checklist_id, habit_id)`.
//! - At most one reflection per checklist.
//! - `completed_at` is set iff `is_done` is true.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::ProjectId;
use super::user::UserId;
use super::{require_title, EntityKind, ValidationError};

pub type ChecklistId = Uuid;
pub type TaskId = Uuid;
pub type HabitId = Uuid;
pub type HabitLogId = Uuid;
pub type ReflectionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub won_the_day: bool,
    /// Epoch ms of the first win.
    pub won_at: Option<i64>,
}

impl Checklist {
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            won_the_day: false,
            won_at: None,
        }
    }
}

/// Section a daily task is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// The one most important task of the day.
    Focus,
    /// Pulled from a project backlog.
    Project,
    /// Ad-hoc task.
    Other,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Project => "project",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "focus" => Some(Self::Focus),
            "project" => Some(Self::Project),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: TaskId,
    pub checklist_id: ChecklistId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TaskType,
    pub project_id: Option<ProjectId>,
    pub is_done: bool,
    pub completed_at: Option<i64>,
    pub sort_order: i64,
}

impl DailyTask {
    pub fn new(
        checklist_id: ChecklistId,
        title: impl Into<String>,
        kind: TaskType,
        project_id: Option<ProjectId>,
        sort_order: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            checklist_id,
            title: title.into().trim().to_string(),
            kind,
            project_id,
            is_done: false,
            completed_at: None,
            sort_order,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(EntityKind::Task, &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub title: String,
    pub sort_order: i64,
}

impl Habit {
    pub fn new(user_id: UserId, title: impl Into<String>, sort_order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into().trim().to_string(),
            sort_order,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(EntityKind::Habit, &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: HabitLogId,
    pub checklist_id: ChecklistId,
    pub habit_id: HabitId,
    pub is_done: bool,
}

/// Answers to the five evening prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionAnswers {
    /// What am I proud of today?
    pub proud: String,
    /// Where did I make the most progress?
    pub progress: String,
    /// What did I learn?
    pub learned: String,
    /// What will I do differently tomorrow?
    pub different: String,
    /// What am I grateful for?
    pub grateful: String,
}

impl ReflectionAnswers {
    pub fn is_empty(&self) -> bool {
        [
            &self.proud,
            &self.progress,
            &self.learned,
            &self.different,
            &self.grateful,
        ]
        .iter()
        .all(|answer| answer.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: ReflectionId,
    pub checklist_id: ChecklistId,
    pub answers: ReflectionAnswers,
    pub updated_at: i64,
}

/// Reflection paired with the date of its checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedReflection {
    pub date: NaiveDate,
    pub reflection: Reflection,
}

/// A checklist with its tasks and habit logs, as read by analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistWithEntries {
    pub checklist: Checklist,
    pub tasks: Vec<DailyTask>,
    pub habit_logs: Vec<HabitLog>,
}
