//! Goal, project and project-task persistence, including the embedded
//! `ProjectWithTasks` / `GoalWithProjects` fetches.
//!
//! # Invariants
//! - Goals and projects list in creation order (`created_at, rowid`).
//! - Project tasks list by `sort_order ASC, rowid ASC`.
//! - Deleting a goal row is never done here; goals are archived.

use super::{
    bool_to_int, int_to_bool, parse_optional_uuid, parse_uuid, RepoError, RepoResult, SqliteStore,
};
use crate::model::plan::{
    BacklogItem, Goal, GoalId, GoalWithProjects, Project, ProjectId, ProjectTask, ProjectTaskId,
    ProjectWithTasks,
};
use crate::model::user::UserId;
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const GOAL_SELECT_SQL: &str = "SELECT id, user_id, title, is_archived, achieved_at FROM goals";

const PROJECT_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.user_id AS user_id,
    p.goal_id AS goal_id,
    p.title AS title,
    p.quarter AS quarter,
    p.completed_at AS completed_at,
    g.title AS goal_title
FROM projects p
LEFT JOIN goals g ON g.id = p.goal_id";

const PROJECT_TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    title,
    sort_order,
    is_done,
    completed_at
FROM project_tasks";

/// Filter for project list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Only projects without `completed_at`.
    pub active_only: bool,
    /// Only projects linked to this goal.
    pub goal_id: Option<GoalId>,
}

pub trait PlanRepository {
    fn insert_goal(&self, goal: &Goal) -> RepoResult<()>;
    fn get_goal(&self, id: GoalId) -> RepoResult<Option<Goal>>;
    fn list_goals(&self, user_id: UserId, include_archived: bool) -> RepoResult<Vec<Goal>>;
    fn count_active_goals(&self, user_id: UserId) -> RepoResult<i64>;
    /// Archives a goal; `achieved_at` is recorded when provided.
    fn archive_goal(&self, id: GoalId, achieved_at: Option<i64>) -> RepoResult<Goal>;
    /// Active goals, each with every linked project and its tasks.
    fn list_goals_with_projects(&self, user_id: UserId) -> RepoResult<Vec<GoalWithProjects>>;

    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<ProjectWithTasks>>;
    fn list_projects(
        &self,
        user_id: UserId,
        filter: &ProjectFilter,
    ) -> RepoResult<Vec<ProjectWithTasks>>;
    fn complete_project(&self, id: ProjectId, completed_at: i64) -> RepoResult<Project>;

    fn list_project_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectTask>>;
    fn get_project_task(&self, id: ProjectTaskId) -> RepoResult<Option<ProjectTask>>;
    fn count_project_tasks(&self, project_id: ProjectId) -> RepoResult<i64>;
    fn insert_project_task(&self, task: &ProjectTask) -> RepoResult<()>;
    fn set_project_task_done(
        &self,
        id: ProjectTaskId,
        is_done: bool,
        completed_at: Option<i64>,
    ) -> RepoResult<ProjectTask>;
    fn delete_project_task(&self, id: ProjectTaskId) -> RepoResult<()>;
    /// Undone tasks of active projects, by `sort_order`.
    fn list_backlog(&self, user_id: UserId) -> RepoResult<Vec<BacklogItem>>;
}

impl PlanRepository for SqliteStore<'_> {
    fn insert_goal(&self, goal: &Goal) -> RepoResult<()> {
        goal.validate()?;
        self.conn().execute(
            "INSERT INTO goals (id, user_id, title, is_archived, achieved_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                goal.id.to_string(),
                goal.user_id.to_string(),
                goal.title.as_str(),
                bool_to_int(goal.is_archived),
                goal.achieved_at,
            ],
        )?;
        Ok(())
    }

    fn get_goal(&self, id: GoalId) -> RepoResult<Option<Goal>> {
        self.conn()
            .query_row(
                &format!("{GOAL_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_goal_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_goals(&self, user_id: UserId, include_archived: bool) -> RepoResult<Vec<Goal>> {
        let mut stmt = self.conn().prepare(&format!(
            "{GOAL_SELECT_SQL}
             WHERE user_id = ?1
               AND (?2 = 1 OR is_archived = 0)
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), bool_to_int(include_archived)])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(read_goal_row(row)?);
        }
        Ok(goals)
    }

    fn count_active_goals(&self, user_id: UserId) -> RepoResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM goals WHERE user_id = ?1 AND is_archived = 0;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn archive_goal(&self, id: GoalId, achieved_at: Option<i64>) -> RepoResult<Goal> {
        let changed = self.conn().execute(
            "UPDATE goals
             SET
                is_archived = 1,
                achieved_at = COALESCE(?2, achieved_at)
             WHERE id = ?1;",
            params![id.to_string(), achieved_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Goal, id));
        }

        self.get_goal(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Goal, id))
    }

    fn list_goals_with_projects(&self, user_id: UserId) -> RepoResult<Vec<GoalWithProjects>> {
        self.list_goals(user_id, false)?
            .into_iter()
            .map(|goal| -> RepoResult<GoalWithProjects> {
                let filter = ProjectFilter {
                    active_only: false,
                    goal_id: Some(goal.id),
                };
                let projects = self.list_projects(user_id, &filter)?;
                Ok(GoalWithProjects { goal, projects })
            })
            .collect()
    }

    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        self.conn().execute(
            "INSERT INTO projects (id, user_id, goal_id, title, quarter, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project.id.to_string(),
                project.user_id.to_string(),
                project.goal_id.map(|id| id.to_string()),
                project.title.as_str(),
                project.quarter.as_str(),
                project.completed_at,
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<ProjectWithTasks>> {
        let row = self
            .conn()
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE p.id = ?1;"),
                [id.to_string()],
                |row| Ok(read_project_row(row)),
            )
            .optional()?
            .transpose()?;

        match row {
            Some((project, goal_title)) => {
                let tasks = self.list_project_tasks(project.id)?;
                Ok(Some(ProjectWithTasks {
                    project,
                    goal_title,
                    tasks,
                }))
            }
            None => Ok(None),
        }
    }

    fn list_projects(
        &self,
        user_id: UserId,
        filter: &ProjectFilter,
    ) -> RepoResult<Vec<ProjectWithTasks>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE p.user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_id.to_string())];

        if filter.active_only {
            sql.push_str(" AND p.completed_at IS NULL");
        }
        if let Some(goal_id) = filter.goal_id {
            sql.push_str(" AND p.goal_id = ?");
            bind_values.push(Value::Text(goal_id.to_string()));
        }
        sql.push_str(" ORDER BY p.created_at ASC, p.rowid ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut headers = Vec::new();
        while let Some(row) = rows.next()? {
            headers.push(read_project_row(row)?);
        }

        headers
            .into_iter()
            .map(|(project, goal_title)| -> RepoResult<ProjectWithTasks> {
                let tasks = self.list_project_tasks(project.id)?;
                Ok(ProjectWithTasks {
                    project,
                    goal_title,
                    tasks,
                })
            })
            .collect()
    }

    fn complete_project(&self, id: ProjectId, completed_at: i64) -> RepoResult<Project> {
        let changed = self.conn().execute(
            "UPDATE projects
             SET completed_at = COALESCE(completed_at, ?2)
             WHERE id = ?1;",
            params![id.to_string(), completed_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Project, id));
        }

        self.get_project(id)?
            .map(|view| view.project)
            .ok_or_else(|| RepoError::not_found(EntityKind::Project, id))
    }

    fn list_project_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectTask>> {
        let mut stmt = self.conn().prepare(&format!(
            "{PROJECT_TASK_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY sort_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(read_project_task_row(row)?);
        }
        Ok(tasks)
    }

    fn get_project_task(&self, id: ProjectTaskId) -> RepoResult<Option<ProjectTask>> {
        self.conn()
            .query_row(
                &format!("{PROJECT_TASK_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_project_task_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn count_project_tasks(&self, project_id: ProjectId) -> RepoResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM project_tasks WHERE project_id = ?1;",
            [project_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn insert_project_task(&self, task: &ProjectTask) -> RepoResult<()> {
        task.validate()?;
        self.conn().execute(
            "INSERT INTO project_tasks (id, project_id, title, sort_order, is_done, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.title.as_str(),
                task.sort_order,
                bool_to_int(task.is_done),
                task.completed_at,
            ],
        )?;
        Ok(())
    }

    fn set_project_task_done(
        &self,
        id: ProjectTaskId,
        is_done: bool,
        completed_at: Option<i64>,
    ) -> RepoResult<ProjectTask> {
        let changed = self.conn().execute(
            "UPDATE project_tasks SET is_done = ?2, completed_at = ?3 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(is_done), completed_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::ProjectTask, id));
        }

        self.get_project_task(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::ProjectTask, id))
    }

    fn delete_project_task(&self, id: ProjectTaskId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM project_tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::ProjectTask, id));
        }
        Ok(())
    }

    fn list_backlog(&self, user_id: UserId) -> RepoResult<Vec<BacklogItem>> {
        let mut stmt = self.conn().prepare(
            "SELECT
                t.id AS id,
                t.project_id AS project_id,
                t.title AS title,
                t.sort_order AS sort_order,
                t.is_done AS is_done,
                t.completed_at AS completed_at,
                p.title AS project_title
             FROM project_tasks t
             INNER JOIN projects p ON p.id = t.project_id
             WHERE p.user_id = ?1
               AND p.completed_at IS NULL
               AND t.is_done = 0
             ORDER BY t.sort_order ASC, p.created_at ASC, t.rowid ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(BacklogItem {
                task: read_project_task_row(row)?,
                project_title: row.get("project_title")?,
            });
        }
        Ok(items)
    }
}

fn read_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    Ok(Goal {
        id: parse_uuid(&id_text, "goals.id")?,
        user_id: parse_uuid(&user_text, "goals.user_id")?,
        title: row.get("title")?,
        is_archived: int_to_bool(row.get("is_archived")?, "goals.is_archived")?,
        achieved_at: row.get("achieved_at")?,
    })
}

fn read_project_row(row: &Row<'_>) -> RepoResult<(Project, Option<String>)> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let project = Project {
        id: parse_uuid(&id_text, "projects.id")?,
        user_id: parse_uuid(&user_text, "projects.user_id")?,
        goal_id: parse_optional_uuid(row.get("goal_id")?, "projects.goal_id")?,
        title: row.get("title")?,
        quarter: row.get("quarter")?,
        completed_at: row.get("completed_at")?,
    };
    Ok((project, row.get("goal_title")?))
}

fn read_project_task_row(row: &Row<'_>) -> RepoResult<ProjectTask> {
    let id_text: String = row.get("id")?;
    let project_text: String = row.get("project_id")?;
    Ok(ProjectTask {
        id: parse_uuid(&id_text, "project_tasks.id")?,
        project_id: parse_uuid(&project_text, "project_tasks.project_id")?,
        title: row.get("title")?,
        sort_order: row.get("sort_order")?,
        is_done: int_to_bool(row.get("is_done")?, "project_tasks.is_done")?,
        completed_at: row.get("completed_at")?,
    })
}
