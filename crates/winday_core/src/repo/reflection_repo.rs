//! Evening reflection persistence (one row per checklist).

use super::{parse_date, parse_uuid, RepoError, RepoResult, SqliteStore};
use crate::model::checklist::{ChecklistId, DatedReflection, Reflection, ReflectionAnswers};
use crate::model::user::UserId;
use crate::model::EntityKind;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const REFLECTION_COLUMNS: &str = "
    r.id AS id,
    r.checklist_id AS checklist_id,
    r.proud AS proud,
    r.progress AS progress,
    r.learned AS learned,
    r.different AS different,
    r.grateful AS grateful,
    r.updated_at AS updated_at";

pub trait ReflectionRepository {
    fn find_reflection(&self, checklist_id: ChecklistId) -> RepoResult<Option<Reflection>>;
    /// Inserts or replaces the answers for a checklist, keeping the row id.
    fn upsert_reflection(
        &self,
        checklist_id: ChecklistId,
        answers: &ReflectionAnswers,
        updated_at: i64,
    ) -> RepoResult<Reflection>;
    /// Most recent reflections first, at most `limit`.
    fn list_reflection_history(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> RepoResult<Vec<DatedReflection>>;
}

impl ReflectionRepository for SqliteStore<'_> {
    fn find_reflection(&self, checklist_id: ChecklistId) -> RepoResult<Option<Reflection>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {REFLECTION_COLUMNS}
                     FROM reflections r
                     WHERE r.checklist_id = ?1;"
                ),
                [checklist_id.to_string()],
                |row| Ok(read_reflection_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn upsert_reflection(
        &self,
        checklist_id: ChecklistId,
        answers: &ReflectionAnswers,
        updated_at: i64,
    ) -> RepoResult<Reflection> {
        self.conn().execute(
            "INSERT INTO reflections (
                id,
                checklist_id,
                proud,
                progress,
                learned,
                different,
                grateful,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (checklist_id) DO UPDATE SET
                proud = excluded.proud,
                progress = excluded.progress,
                learned = excluded.learned,
                different = excluded.different,
                grateful = excluded.grateful,
                updated_at = excluded.updated_at;",
            params![
                Uuid::new_v4().to_string(),
                checklist_id.to_string(),
                answers.proud.as_str(),
                answers.progress.as_str(),
                answers.learned.as_str(),
                answers.different.as_str(),
                answers.grateful.as_str(),
                updated_at,
            ],
        )?;

        self.find_reflection(checklist_id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Reflection, checklist_id))
    }

    fn list_reflection_history(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> RepoResult<Vec<DatedReflection>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REFLECTION_COLUMNS}, c.date AS checklist_date
             FROM reflections r
             INNER JOIN checklists c ON c.id = r.checklist_id
             WHERE c.user_id = ?1
             ORDER BY c.date DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), i64::from(limit)])?;
        let mut history = Vec::new();
        while let Some(row) = rows.next()? {
            let date_text: String = row.get("checklist_date")?;
            history.push(DatedReflection {
                date: parse_date(&date_text, "checklists.date")?,
                reflection: read_reflection_row(row)?,
            });
        }
        Ok(history)
    }
}

fn read_reflection_row(row: &Row<'_>) -> RepoResult<Reflection> {
    let id_text: String = row.get("id")?;
    let checklist_text: String = row.get("checklist_id")?;
    Ok(Reflection {
        id: parse_uuid(&id_text, "reflections.id")?,
        checklist_id: parse_uuid(&checklist_text, "reflections.checklist_id")?,
        answers: ReflectionAnswers {
            proud: row.get("proud")?,
            progress: row.get("progress")?,
            learned: row.get("learned")?,
            different: row.get("different")?,
            grateful: row.get("grateful")?,
        },
        updated_at: row.get("updated_at")?,
    })
}
