//! Habit definitions. Logs live with the checklist repository.

use super::{parse_uuid, RepoError, RepoResult, SqliteStore};
use crate::model::checklist::{Habit, HabitId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use rusqlite::{params, OptionalExtension, Row};

const HABIT_SELECT_SQL: &str = "SELECT id, user_id, title, sort_order FROM habits";

pub trait HabitRepository {
    /// Lists habits ordered by `sort_order ASC`.
    fn list_habits(&self, user_id: UserId) -> RepoResult<Vec<Habit>>;
    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    fn count_habits(&self, user_id: UserId) -> RepoResult<i64>;
    fn insert_habit(&self, habit: &Habit) -> RepoResult<()>;
    /// Deletes the habit; its logs cascade.
    fn delete_habit(&self, id: HabitId) -> RepoResult<()>;
}

impl HabitRepository for SqliteStore<'_> {
    fn list_habits(&self, user_id: UserId) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn().prepare(&format!(
            "{HABIT_SELECT_SQL} WHERE user_id = ?1 ORDER BY sort_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(read_habit_row(row)?);
        }
        Ok(habits)
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        self.conn()
            .query_row(
                &format!("{HABIT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_habit_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn count_habits(&self, user_id: UserId) -> RepoResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM habits WHERE user_id = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn insert_habit(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;
        self.conn().execute(
            "INSERT INTO habits (id, user_id, title, sort_order) VALUES (?1, ?2, ?3, ?4);",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.title.as_str(),
                habit.sort_order,
            ],
        )?;
        Ok(())
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM habits WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Habit, id));
        }
        Ok(())
    }
}

fn read_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    Ok(Habit {
        id: parse_uuid(&id_text, "habits.id")?,
        user_id: parse_uuid(&user_text, "habits.user_id")?,
        title: row.get("title")?,
        sort_order: row.get("sort_order")?,
    })
}
