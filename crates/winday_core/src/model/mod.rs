//! Domain model for the daily checklist, planning and reflection data.
//!
//! # Responsibility
//! - Define canonical records persisted by the repository layer.
//! - Define typed view models for embedded fetches (`ProjectWithTasks`,
//!   `GoalWithProjects`, `ChecklistWithEntries`).
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Writes go through `validate()` before they reach storage.

pub mod checklist;
pub mod plan;
pub mod user;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Entity names used by not-found and limit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Goal,
    Project,
    ProjectTask,
    Checklist,
    Task,
    Habit,
    HabitLog,
    Reflection,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Goal => "goal",
            Self::Project => "project",
            Self::ProjectTask => "project_task",
            Self::Checklist => "checklist",
            Self::Task => "task",
            Self::Habit => "habit",
            Self::HabitLog => "habit_log",
            Self::Reflection => "reflection",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming.
    BlankTitle(EntityKind),
    /// Quarter label does not look like `Q1 2026`.
    InvalidQuarter(String),
    /// Email is empty or has no `@`.
    InvalidEmail(String),
    /// Analytics window outside the supported 7/30/90 day set.
    UnsupportedRange(u32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle(entity) => write!(f, "{entity} title must not be blank"),
            Self::InvalidQuarter(label) => {
                write!(f, "invalid quarter label `{label}`; expected `Q<1-4> <year>`")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::UnsupportedRange(days) => {
                write!(f, "unsupported analytics range {days}; expected 7|30|90")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_title(entity: EntityKind, title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::BlankTitle(entity));
    }
    Ok(())
}
