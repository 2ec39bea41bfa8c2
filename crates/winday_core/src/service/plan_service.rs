//! Goals, quarterly projects and project backlogs.
//!
//! # Invariants
//! - At most `MAX_ACTIVE_GOALS` non-archived goals per user.
//! - Archiving and achieving are terminal; goals are never deleted here.
//! - Project task `sort_order` equals the backlog size at insert time.
//! - Rows owned by another user are reported as not found.

use crate::clock::Clock;
use crate::model::plan::{
    Goal, GoalId, GoalWithProjects, Project, ProjectId, ProjectTask, ProjectTaskId,
    ProjectWithTasks,
};
use crate::model::user::UserContext;
use crate::model::EntityKind;
use crate::repo::{PlanRepository, ProjectFilter};
use crate::service::progress::{goal_progress, project_progress, GoalProgress, Progress};
use crate::service::{ServiceError, ServiceResult};
use log::info;
use serde::Serialize;

pub const MAX_ACTIVE_GOALS: i64 = 5;

/// Goal with its derived progress, as listed on the goals screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalOverview {
    pub goal: GoalWithProjects,
    pub progress: GoalProgress,
}

/// Project with its derived progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectOverview {
    pub project: ProjectWithTasks,
    pub progress: Progress,
}

impl From<ProjectWithTasks> for ProjectOverview {
    fn from(project: ProjectWithTasks) -> Self {
        let progress = project_progress(&project);
        Self { project, progress }
    }
}

pub struct PlanService<R, C> {
    repo: R,
    clock: C,
}

impl<R: PlanRepository, C: Clock> PlanService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn add_goal(&self, user: &UserContext, title: &str) -> ServiceResult<Goal> {
        let active = self.repo.count_active_goals(user.user_id)?;
        if active >= MAX_ACTIVE_GOALS {
            return Err(ServiceError::LimitReached {
                entity: EntityKind::Goal,
                limit: MAX_ACTIVE_GOALS,
            });
        }

        let goal = Goal::new(user.user_id, title);
        goal.validate()?;
        self.repo.insert_goal(&goal)?;
        info!("event=goal_add module=plan status=ok active={}", active + 1);
        Ok(goal)
    }

    pub fn archive_goal(&self, user: &UserContext, goal_id: GoalId) -> ServiceResult<Goal> {
        self.owned_goal(user, goal_id)?;
        Ok(self.repo.archive_goal(goal_id, None)?)
    }

    /// Archives the goal and stamps `achieved_at`.
    pub fn achieve_goal(&self, user: &UserContext, goal_id: GoalId) -> ServiceResult<Goal> {
        self.owned_goal(user, goal_id)?;
        let goal = self
            .repo
            .archive_goal(goal_id, Some(self.clock.now_ms()))?;
        info!("event=goal_achieve module=plan status=ok");
        Ok(goal)
    }

    /// Active goals in creation order with progress over all linked projects.
    pub fn list_goals(&self, user: &UserContext) -> ServiceResult<Vec<GoalOverview>> {
        Ok(self
            .repo
            .list_goals_with_projects(user.user_id)?
            .into_iter()
            .map(|goal| {
                let progress = goal_progress(&goal);
                GoalOverview { goal, progress }
            })
            .collect())
    }

    pub fn add_project(
        &self,
        user: &UserContext,
        title: &str,
        quarter: &str,
        goal_id: Option<GoalId>,
    ) -> ServiceResult<ProjectOverview> {
        if let Some(goal_id) = goal_id {
            self.owned_goal(user, goal_id)?;
        }

        let project = Project::new(user.user_id, title, quarter, goal_id);
        project.validate()?;
        self.repo.insert_project(&project)?;
        self.project_overview(project.id)
    }

    /// Projects without a completion timestamp, in creation order.
    pub fn list_active_projects(&self, user: &UserContext) -> ServiceResult<Vec<ProjectOverview>> {
        self.list_projects(user, true)
    }

    /// Every project of the user, completed ones included.
    pub fn list_all_projects(&self, user: &UserContext) -> ServiceResult<Vec<ProjectOverview>> {
        self.list_projects(user, false)
    }

    pub fn complete_project(
        &self,
        user: &UserContext,
        project_id: ProjectId,
    ) -> ServiceResult<Project> {
        self.owned_project(user, project_id)?;
        let project = self
            .repo
            .complete_project(project_id, self.clock.now_ms())?;
        info!("event=project_complete module=plan status=ok");
        Ok(project)
    }

    pub fn add_project_task(
        &self,
        user: &UserContext,
        project_id: ProjectId,
        title: &str,
    ) -> ServiceResult<ProjectOverview> {
        self.owned_project(user, project_id)?;
        let sort_order = self.repo.count_project_tasks(project_id)?;
        let task = ProjectTask::new(project_id, title, sort_order);
        task.validate()?;
        self.repo.insert_project_task(&task)?;
        self.project_overview(project_id)
    }

    /// Flips a backlog task and returns the project with fresh progress.
    pub fn toggle_project_task(
        &self,
        user: &UserContext,
        task_id: ProjectTaskId,
    ) -> ServiceResult<ProjectOverview> {
        let task = self.owned_project_task(user, task_id)?;
        let is_done = !task.is_done;
        let completed_at = is_done.then(|| self.clock.now_ms());
        self.repo.set_project_task_done(task_id, is_done, completed_at)?;
        self.project_overview(task.project_id)
    }

    pub fn delete_project_task(
        &self,
        user: &UserContext,
        task_id: ProjectTaskId,
    ) -> ServiceResult<ProjectOverview> {
        let task = self.owned_project_task(user, task_id)?;
        self.repo.delete_project_task(task_id)?;
        self.project_overview(task.project_id)
    }

    fn list_projects(
        &self,
        user: &UserContext,
        active_only: bool,
    ) -> ServiceResult<Vec<ProjectOverview>> {
        let filter = ProjectFilter {
            active_only,
            goal_id: None,
        };
        Ok(self
            .repo
            .list_projects(user.user_id, &filter)?
            .into_iter()
            .map(ProjectOverview::from)
            .collect())
    }

    fn project_overview(&self, project_id: ProjectId) -> ServiceResult<ProjectOverview> {
        self.repo
            .get_project(project_id)?
            .map(ProjectOverview::from)
            .ok_or(ServiceError::not_found(EntityKind::Project, project_id))
    }

    fn owned_goal(&self, user: &UserContext, goal_id: GoalId) -> ServiceResult<Goal> {
        self.repo
            .get_goal(goal_id)?
            .filter(|goal| goal.user_id == user.user_id)
            .ok_or(ServiceError::not_found(EntityKind::Goal, goal_id))
    }

    fn owned_project(
        &self,
        user: &UserContext,
        project_id: ProjectId,
    ) -> ServiceResult<ProjectWithTasks> {
        self.repo
            .get_project(project_id)?
            .filter(|view| view.project.user_id == user.user_id)
            .ok_or(ServiceError::not_found(EntityKind::Project, project_id))
    }

    fn owned_project_task(
        &self,
        user: &UserContext,
        task_id: ProjectTaskId,
    ) -> ServiceResult<ProjectTask> {
        let task = self
            .repo
            .get_project_task(task_id)?
            .ok_or(ServiceError::not_found(EntityKind::ProjectTask, task_id))?;
        match self.owned_project(user, task.project_id) {
            Ok(_) => Ok(task),
            Err(ServiceError::NotFound { .. }) => {
                Err(ServiceError::not_found(EntityKind::ProjectTask, task_id))
            }
            Err(other) => Err(other),
        }
    }
}
