//! Checklist, daily task and habit log persistence.
//!
//! # Invariants
//! - `(user_id, date)` is unique; `insert_checklist_if_absent` never
//!   produces a second row for the same day.
//! - Task lists are ordered by `sort_order ASC, rowid ASC`.
//! - `mark_checklist_won` keeps the first `won_at` on repeated calls.

use super::{
    bool_to_int, date_to_db, int_to_bool, parse_date, parse_optional_uuid, parse_uuid, RepoError,
    RepoResult, SqliteStore,
};
use crate::model::checklist::{
    Checklist, ChecklistId, ChecklistWithEntries, DailyTask, HabitId, HabitLog, HabitLogId,
    TaskId, TaskType,
};
use crate::model::user::UserId;
use crate::model::EntityKind;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const CHECKLIST_SELECT_SQL: &str = "SELECT id, user_id, date, won_the_day, won_at FROM checklists";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    checklist_id,
    title,
    type,
    project_id,
    is_done,
    completed_at,
    sort_order
FROM tasks";

const HABIT_LOG_SELECT_SQL: &str = "SELECT id, checklist_id, habit_id, is_done FROM habit_logs";

/// Date ordering for checklist range queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecklistOrder {
    #[default]
    Ascending,
    Descending,
}

/// Range query over one user's checklists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistQuery {
    /// Inclusive lower bound.
    pub since: Option<NaiveDate>,
    pub order: ChecklistOrder,
    pub limit: Option<u32>,
}

pub trait ChecklistRepository {
    fn find_checklist(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Option<Checklist>>;
    fn get_checklist(&self, id: ChecklistId) -> RepoResult<Option<Checklist>>;
    /// Inserts the checklist unless one already exists for its user and date.
    ///
    /// Returns `true` when a row was written.
    fn insert_checklist_if_absent(&self, checklist: &Checklist) -> RepoResult<bool>;
    fn list_checklists(&self, user_id: UserId, query: &ChecklistQuery)
        -> RepoResult<Vec<Checklist>>;
    /// Checklists with embedded tasks and habit logs, ascending by date.
    fn list_checklists_with_entries(
        &self,
        user_id: UserId,
        since: NaiveDate,
    ) -> RepoResult<Vec<ChecklistWithEntries>>;
    fn mark_checklist_won(&self, id: ChecklistId, won_at: i64) -> RepoResult<Checklist>;

    fn list_tasks(&self, checklist_id: ChecklistId) -> RepoResult<Vec<DailyTask>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<DailyTask>>;
    fn count_tasks(&self, checklist_id: ChecklistId) -> RepoResult<i64>;
    fn insert_task(&self, task: &DailyTask) -> RepoResult<()>;
    fn set_task_done(
        &self,
        id: TaskId,
        is_done: bool,
        completed_at: Option<i64>,
    ) -> RepoResult<DailyTask>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;

    fn list_habit_logs(&self, checklist_id: ChecklistId) -> RepoResult<Vec<HabitLog>>;
    fn find_habit_log(
        &self,
        checklist_id: ChecklistId,
        habit_id: HabitId,
    ) -> RepoResult<Option<HabitLog>>;
    fn insert_habit_log(&self, log: &HabitLog) -> RepoResult<()>;
    fn set_habit_log_done(&self, id: HabitLogId, is_done: bool) -> RepoResult<HabitLog>;
}

impl ChecklistRepository for SqliteStore<'_> {
    fn find_checklist(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Option<Checklist>> {
        self.conn()
            .query_row(
                &format!("{CHECKLIST_SELECT_SQL} WHERE user_id = ?1 AND date = ?2;"),
                params![user_id.to_string(), date_to_db(date)],
                |row| Ok(read_checklist_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn get_checklist(&self, id: ChecklistId) -> RepoResult<Option<Checklist>> {
        self.conn()
            .query_row(
                &format!("{CHECKLIST_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_checklist_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn insert_checklist_if_absent(&self, checklist: &Checklist) -> RepoResult<bool> {
        let changed = self.conn().execute(
            "INSERT INTO checklists (id, user_id, date, won_the_day, won_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, date) DO NOTHING;",
            params![
                checklist.id.to_string(),
                checklist.user_id.to_string(),
                date_to_db(checklist.date),
                bool_to_int(checklist.won_the_day),
                checklist.won_at,
            ],
        )?;
        Ok(changed == 1)
    }

    fn list_checklists(
        &self,
        user_id: UserId,
        query: &ChecklistQuery,
    ) -> RepoResult<Vec<Checklist>> {
        let mut sql = format!("{CHECKLIST_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_id.to_string())];

        if let Some(since) = query.since {
            sql.push_str(" AND date >= ?");
            bind_values.push(Value::Text(date_to_db(since)));
        }

        match query.order {
            ChecklistOrder::Ascending => sql.push_str(" ORDER BY date ASC"),
            ChecklistOrder::Descending => sql.push_str(" ORDER BY date DESC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut checklists = Vec::new();
        while let Some(row) = rows.next()? {
            checklists.push(read_checklist_row(row)?);
        }
        Ok(checklists)
    }

    fn list_checklists_with_entries(
        &self,
        user_id: UserId,
        since: NaiveDate,
    ) -> RepoResult<Vec<ChecklistWithEntries>> {
        let query = ChecklistQuery {
            since: Some(since),
            order: ChecklistOrder::Ascending,
            limit: None,
        };
        self.list_checklists(user_id, &query)?
            .into_iter()
            .map(|checklist| -> RepoResult<ChecklistWithEntries> {
                let tasks = self.list_tasks(checklist.id)?;
                let habit_logs = self.list_habit_logs(checklist.id)?;
                Ok(ChecklistWithEntries {
                    checklist,
                    tasks,
                    habit_logs,
                })
            })
            .collect()
    }

    fn mark_checklist_won(&self, id: ChecklistId, won_at: i64) -> RepoResult<Checklist> {
        let changed = self.conn().execute(
            "UPDATE checklists
             SET
                won_the_day = 1,
                won_at = COALESCE(won_at, ?2)
             WHERE id = ?1;",
            params![id.to_string(), won_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Checklist, id));
        }

        self.get_checklist(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Checklist, id))
    }

    fn list_tasks(&self, checklist_id: ChecklistId) -> RepoResult<Vec<DailyTask>> {
        let mut stmt = self.conn().prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE checklist_id = ?1
             ORDER BY sort_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([checklist_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(read_task_row(row)?);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<DailyTask>> {
        self.conn()
            .query_row(
                &format!("{TASK_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_task_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn count_tasks(&self, checklist_id: ChecklistId) -> RepoResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM tasks WHERE checklist_id = ?1;",
            [checklist_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn insert_task(&self, task: &DailyTask) -> RepoResult<()> {
        task.validate()?;
        self.conn().execute(
            "INSERT INTO tasks (
                id,
                checklist_id,
                title,
                type,
                project_id,
                is_done,
                completed_at,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id.to_string(),
                task.checklist_id.to_string(),
                task.title.as_str(),
                task.kind.as_str(),
                task.project_id.map(|id| id.to_string()),
                bool_to_int(task.is_done),
                task.completed_at,
                task.sort_order,
            ],
        )?;
        Ok(())
    }

    fn set_task_done(
        &self,
        id: TaskId,
        is_done: bool,
        completed_at: Option<i64>,
    ) -> RepoResult<DailyTask> {
        let changed = self.conn().execute(
            "UPDATE tasks SET is_done = ?2, completed_at = ?3 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(is_done), completed_at],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Task, id));
        }

        self.get_task(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Task, id))
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Task, id));
        }
        Ok(())
    }

    fn list_habit_logs(&self, checklist_id: ChecklistId) -> RepoResult<Vec<HabitLog>> {
        let mut stmt = self.conn().prepare(&format!(
            "{HABIT_LOG_SELECT_SQL} WHERE checklist_id = ?1 ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([checklist_id.to_string()])?;
        let mut logs = Vec::new();
        while let Some(row) = rows.next()? {
            logs.push(read_habit_log_row(row)?);
        }
        Ok(logs)
    }

    fn find_habit_log(
        &self,
        checklist_id: ChecklistId,
        habit_id: HabitId,
    ) -> RepoResult<Option<HabitLog>> {
        self.conn()
            .query_row(
                &format!("{HABIT_LOG_SELECT_SQL} WHERE checklist_id = ?1 AND habit_id = ?2;"),
                params![checklist_id.to_string(), habit_id.to_string()],
                |row| Ok(read_habit_log_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn insert_habit_log(&self, log: &HabitLog) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO habit_logs (id, checklist_id, habit_id, is_done)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                log.id.to_string(),
                log.checklist_id.to_string(),
                log.habit_id.to_string(),
                bool_to_int(log.is_done),
            ],
        )?;
        Ok(())
    }

    fn set_habit_log_done(&self, id: HabitLogId, is_done: bool) -> RepoResult<HabitLog> {
        let changed = self.conn().execute(
            "UPDATE habit_logs SET is_done = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(is_done)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::HabitLog, id));
        }

        self.conn()
            .query_row(
                &format!("{HABIT_LOG_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_habit_log_row(row)),
            )
            .optional()?
            .transpose()?
            .ok_or_else(|| RepoError::not_found(EntityKind::HabitLog, id))
    }
}

fn read_checklist_row(row: &Row<'_>) -> RepoResult<Checklist> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let date_text: String = row.get("date")?;
    Ok(Checklist {
        id: parse_uuid(&id_text, "checklists.id")?,
        user_id: parse_uuid(&user_text, "checklists.user_id")?,
        date: parse_date(&date_text, "checklists.date")?,
        won_the_day: int_to_bool(row.get("won_the_day")?, "checklists.won_the_day")?,
        won_at: row.get("won_at")?,
    })
}

fn read_task_row(row: &Row<'_>) -> RepoResult<DailyTask> {
    let id_text: String = row.get("id")?;
    let checklist_text: String = row.get("checklist_id")?;
    let type_text: String = row.get("type")?;
    let kind = TaskType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task type `{type_text}` in tasks.type"))
    })?;

    Ok(DailyTask {
        id: parse_uuid(&id_text, "tasks.id")?,
        checklist_id: parse_uuid(&checklist_text, "tasks.checklist_id")?,
        title: row.get("title")?,
        kind,
        project_id: parse_optional_uuid(row.get("project_id")?, "tasks.project_id")?,
        is_done: int_to_bool(row.get("is_done")?, "tasks.is_done")?,
        completed_at: row.get("completed_at")?,
        sort_order: row.get("sort_order")?,
    })
}

fn read_habit_log_row(row: &Row<'_>) -> RepoResult<HabitLog> {
    let id_text: String = row.get("id")?;
    let checklist_text: String = row.get("checklist_id")?;
    let habit_text: String = row.get("habit_id")?;
    Ok(HabitLog {
        id: parse_uuid(&id_text, "habit_logs.id")?,
        checklist_id: parse_uuid(&checklist_text, "habit_logs.checklist_id")?,
        habit_id: parse_uuid(&habit_text, "habit_logs.habit_id")?,
        is_done: int_to_bool(row.get("is_done")?, "habit_logs.is_done")?,
    })
}
