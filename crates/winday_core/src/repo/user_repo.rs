//! User profile persistence.

use super::{bool_to_int, int_to_bool, parse_uuid, RepoError, RepoResult, SqliteStore};
use crate::model::user::{UserId, UserMetadataPatch, UserProfile};
use crate::model::EntityKind;
use rusqlite::{params, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, full_name, onboarding_complete FROM users";

pub trait UserRepository {
    fn create_user(&self, profile: &UserProfile) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserProfile>>;
    /// Case-insensitive lookup.
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserProfile>>;
    fn update_user_metadata(
        &self,
        id: UserId,
        patch: &UserMetadataPatch,
    ) -> RepoResult<UserProfile>;
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, profile: &UserProfile) -> RepoResult<()> {
        profile.validate()?;
        self.conn().execute(
            "INSERT INTO users (id, email, full_name, onboarding_complete)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                profile.id.to_string(),
                profile.email.as_str(),
                profile.full_name.as_deref(),
                bool_to_int(profile.onboarding_complete),
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserProfile>> {
        self.conn()
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(read_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserProfile>> {
        self.conn()
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"),
                [email.trim()],
                |row| Ok(read_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn update_user_metadata(
        &self,
        id: UserId,
        patch: &UserMetadataPatch,
    ) -> RepoResult<UserProfile> {
        let changed = self.conn().execute(
            "UPDATE users
             SET
                full_name = COALESCE(?2, full_name),
                onboarding_complete = COALESCE(?3, onboarding_complete)
             WHERE id = ?1;",
            params![
                id.to_string(),
                patch.full_name.as_deref().map(str::trim),
                patch.onboarding_complete.map(bool_to_int),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::User, id));
        }

        self.get_user(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::User, id))
    }
}

fn read_user_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    let id_text: String = row.get("id")?;
    Ok(UserProfile {
        id: parse_uuid(&id_text, "users.id")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        onboarding_complete: int_to_bool(
            row.get("onboarding_complete")?,
            "users.onboarding_complete",
        )?,
    })
}
