//! Annual goals, quarterly projects and their task backlogs.
//!
//! # Invariants
//! - A goal is terminal once archived; `achieved_at` is set only together
//!   with the archive flag.
//! - A project belongs to at most one goal; project tasks belong to exactly
//!   one project.
//! - Progress is derived from task completion and never stored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use super::{require_title, EntityKind, ValidationError};

pub type GoalId = Uuid;
pub type ProjectId = Uuid;
pub type ProjectTaskId = Uuid;

static QUARTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Q[1-4] \d{4}$").expect("valid quarter regex"));

/// Returns whether `label` is a quarter label such as `Q3 2026`.
pub fn is_valid_quarter(label: &str) -> bool {
    QUARTER_RE.is_match(label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    pub is_archived: bool,
    /// Epoch ms; set when the goal is marked achieved.
    pub achieved_at: Option<i64>,
}

impl Goal {
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into().trim().to_string(),
            is_archived: false,
            achieved_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(EntityKind::Goal, &self.title)
    }

    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub user_id: UserId,
    pub goal_id: Option<GoalId>,
    pub title: String,
    /// Label such as `Q1 2026`.
    pub quarter: String,
    /// Epoch ms; `None` while the project is active.
    pub completed_at: Option<i64>,
}

impl Project {
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        quarter: impl Into<String>,
        goal_id: Option<GoalId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            goal_id,
            title: title.into().trim().to_string(),
            quarter: quarter.into().trim().to_string(),
            completed_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(EntityKind::Project, &self.title)?;
        if !is_valid_quarter(&self.quarter) {
            return Err(ValidationError::InvalidQuarter(self.quarter.clone()));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTask {
    pub id: ProjectTaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub sort_order: i64,
    pub is_done: bool,
    pub completed_at: Option<i64>,
}

impl ProjectTask {
    pub fn new(project_id: ProjectId, title: impl Into<String>, sort_order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into().trim().to_string(),
            sort_order,
            is_done: false,
            completed_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_title(EntityKind::ProjectTask, &self.title)
    }
}

/// A project together with its backlog, ordered by `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithTasks {
    pub project: Project,
    /// Title of the linked goal, when the goal still exists.
    pub goal_title: Option<String>,
    pub tasks: Vec<ProjectTask>,
}

/// A goal together with every project linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalWithProjects {
    pub goal: Goal,
    pub projects: Vec<ProjectWithTasks>,
}

/// Undone project task offered for pulling into today's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogItem {
    pub task: ProjectTask,
    pub project_title: String,
}

#[cfg(test)]
mod tests {
    use super::{is_valid_quarter, Project};
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn quarter_labels_follow_q_year_shape() {
        assert!(is_valid_quarter("Q1 2026"));
        assert!(is_valid_quarter("Q4 2031"));
        assert!(!is_valid_quarter("Q5 2026"));
        assert!(!is_valid_quarter("q1 2026"));
        assert!(!is_valid_quarter("Q1-2026"));
    }

    #[test]
    fn project_validation_rejects_blank_title_and_bad_quarter() {
        let user = Uuid::new_v4();
        let blank = Project::new(user, "   ", "Q1 2026", None);
        assert!(matches!(
            blank.validate(),
            Err(ValidationError::BlankTitle(_))
        ));

        let bad_quarter = Project::new(user, "Ship", "2026Q1", None);
        assert_eq!(
            bad_quarter.validate(),
            Err(ValidationError::InvalidQuarter("2026Q1".to_string()))
        );
    }
}
