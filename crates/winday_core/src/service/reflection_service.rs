//! Evening reflection: five free-text answers per checklist.

use crate::clock::Clock;
use crate::model::checklist::{ChecklistId, DatedReflection, Reflection, ReflectionAnswers};
use crate::model::user::UserContext;
use crate::repo::{ChecklistRepository, ReflectionRepository};
use crate::service::checklist_service::ensure_checklist;
use crate::service::ServiceResult;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

/// Number of entries returned by `reflection_history`.
pub const HISTORY_LIMIT: u32 = 30;

/// Reflection form state for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReflection {
    pub checklist_id: ChecklistId,
    pub date: NaiveDate,
    pub answers: ReflectionAnswers,
    /// `None` until the first save.
    pub updated_at: Option<i64>,
}

pub struct ReflectionService<S, C> {
    store: S,
    clock: C,
}

impl<S, C> ReflectionService<S, C>
where
    S: ChecklistRepository + ReflectionRepository,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Saved answers for `date`, or empty answers when nothing was saved.
    ///
    /// Creates the day's checklist when absent.
    pub fn get_reflection(
        &self,
        user: &UserContext,
        date: NaiveDate,
    ) -> ServiceResult<DayReflection> {
        let checklist = ensure_checklist(&self.store, user, date)?;
        let saved = self.store.find_reflection(checklist.id)?;
        Ok(DayReflection {
            checklist_id: checklist.id,
            date,
            answers: saved
                .as_ref()
                .map(|reflection| reflection.answers.clone())
                .unwrap_or_default(),
            updated_at: saved.map(|reflection| reflection.updated_at),
        })
    }

    pub fn save_reflection(
        &self,
        user: &UserContext,
        date: NaiveDate,
        answers: &ReflectionAnswers,
    ) -> ServiceResult<Reflection> {
        let checklist = ensure_checklist(&self.store, user, date)?;
        let reflection =
            self.store
                .upsert_reflection(checklist.id, answers, self.clock.now_ms())?;
        info!(
            "event=reflection_save module=reflection status=ok empty={}",
            answers.is_empty()
        );
        Ok(reflection)
    }

    /// Most recent dated reflections, newest first.
    pub fn reflection_history(&self, user: &UserContext) -> ServiceResult<Vec<DatedReflection>> {
        Ok(self
            .store
            .list_reflection_history(user.user_id, HISTORY_LIMIT)?)
    }
}
