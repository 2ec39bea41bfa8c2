//! Checklist manager: one checklist per user per date, and the task /
//! habit-log / win mutations on it.
//!
//! # Invariants
//! - `get_or_create_checklist` is idempotent per `(user, date)`.
//! - A checklist holds at most one focus task; a second insert is rejected.
//! - `completed_at` is stamped on the transition to done and cleared on
//!   the transition back.
//! - The first habit interaction of a day always records "done".
//! - Winning twice keeps the first `won_at`.
//! - Rows owned by another user are reported as not found.

use crate::clock::Clock;
use crate::model::checklist::{
    Checklist, ChecklistId, DailyTask, HabitId, HabitLog, TaskId, TaskType,
};
use crate::model::plan::ProjectId;
use crate::model::user::UserContext;
use crate::model::EntityKind;
use crate::repo::{
    ChecklistRepository, HabitRepository, PlanRepository, ProjectFilter, RepoError,
};
use crate::service::day_view::{DayChange, DayView};
use crate::service::{ServiceError, ServiceResult};
use chrono::NaiveDate;
use log::{debug, info};
use uuid::Uuid;

/// Use-case service for the daily checklist.
pub struct ChecklistManager<S, C> {
    store: S,
    clock: C,
}

impl<S, C> ChecklistManager<S, C>
where
    S: ChecklistRepository + HabitRepository + PlanRepository,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Loads the checklist for `(user, date)`, creating it when absent.
    pub fn get_or_create_checklist(
        &self,
        user: &UserContext,
        date: NaiveDate,
    ) -> ServiceResult<Checklist> {
        ensure_checklist(&self.store, user, date)
    }

    /// Loads everything the daily screen shows for `date`.
    pub fn load_day(&self, user: &UserContext, date: NaiveDate) -> ServiceResult<DayView> {
        let checklist = self.get_or_create_checklist(user, date)?;
        let tasks = self.store.list_tasks(checklist.id)?;
        let habits = self.store.list_habits(user.user_id)?;
        let habit_logs = self.store.list_habit_logs(checklist.id)?;
        let filter = ProjectFilter {
            active_only: true,
            goal_id: None,
        };
        let active_projects = self
            .store
            .list_projects(user.user_id, &filter)?
            .into_iter()
            .map(|view| view.project)
            .collect();
        let project_backlog = self.store.list_backlog(user.user_id)?;

        debug!(
            "event=day_load module=checklist status=ok date={} tasks={} habits={}",
            date,
            tasks.len(),
            habits.len()
        );

        Ok(DayView {
            checklist,
            tasks,
            habits,
            habit_logs,
            active_projects,
            project_backlog,
        })
    }

    pub fn load_today(&self, user: &UserContext) -> ServiceResult<DayView> {
        self.load_day(user, self.clock.today())
    }

    /// Replaces `view` with a fresh read of the same day.
    ///
    /// Used after a failed mutation to discard anything the caller may
    /// have guessed locally.
    pub fn reconcile(&self, user: &UserContext, view: &mut DayView) -> ServiceResult<()> {
        *view = self.load_day(user, view.checklist.date)?;
        Ok(())
    }

    /// Flips the done flag of a task.
    pub fn toggle_task(&self, user: &UserContext, task_id: TaskId) -> ServiceResult<DayChange> {
        let task = self.owned_task(user, task_id)?;
        let is_done = !task.is_done;
        let completed_at = is_done.then(|| self.clock.now_ms());
        let updated = self.store.set_task_done(task_id, is_done, completed_at)?;
        debug!("event=task_toggle module=checklist status=ok is_done={is_done}");
        Ok(DayChange::TaskUpdated(updated))
    }

    /// Appends a task with `sort_order` equal to the current task count.
    pub fn add_task(
        &self,
        user: &UserContext,
        checklist_id: ChecklistId,
        title: &str,
        kind: TaskType,
        project_id: Option<ProjectId>,
    ) -> ServiceResult<DayChange> {
        let checklist = self.owned_checklist(user, checklist_id)?;

        if kind == TaskType::Focus {
            let has_focus = self
                .store
                .list_tasks(checklist.id)?
                .iter()
                .any(|task| task.kind == TaskType::Focus);
            if has_focus {
                return Err(ServiceError::FocusTaskExists(checklist.id));
            }
        }

        if let Some(project_id) = project_id {
            let owned = self
                .store
                .get_project(project_id)?
                .is_some_and(|view| view.project.user_id == user.user_id);
            if !owned {
                return Err(ServiceError::not_found(EntityKind::Project, project_id));
            }
        }

        let sort_order = self.store.count_tasks(checklist.id)?;
        let task = DailyTask::new(checklist.id, title, kind, project_id, sort_order);
        task.validate()?;
        self.store.insert_task(&task)?;
        debug!(
            "event=task_add module=checklist status=ok type={} sort_order={}",
            kind.as_str(),
            sort_order
        );
        Ok(DayChange::TaskAdded(task))
    }

    pub fn remove_task(&self, user: &UserContext, task_id: TaskId) -> ServiceResult<DayChange> {
        self.owned_task(user, task_id)?;
        self.store.delete_task(task_id)?;
        Ok(DayChange::TaskRemoved(task_id))
    }

    /// Flips an existing habit log, or records the habit as done.
    pub fn toggle_habit_log(
        &self,
        user: &UserContext,
        checklist_id: ChecklistId,
        habit_id: HabitId,
    ) -> ServiceResult<DayChange> {
        let checklist = self.owned_checklist(user, checklist_id)?;
        let habit_owned = self
            .store
            .get_habit(habit_id)?
            .is_some_and(|habit| habit.user_id == user.user_id);
        if !habit_owned {
            return Err(ServiceError::not_found(EntityKind::Habit, habit_id));
        }

        let log = match self.store.find_habit_log(checklist.id, habit_id)? {
            Some(existing) => self.store.set_habit_log_done(existing.id, !existing.is_done)?,
            None => {
                let log = HabitLog {
                    id: Uuid::new_v4(),
                    checklist_id: checklist.id,
                    habit_id,
                    is_done: true,
                };
                self.store.insert_habit_log(&log)?;
                log
            }
        };
        debug!(
            "event=habit_toggle module=checklist status=ok is_done={}",
            log.is_done
        );
        Ok(DayChange::HabitLogged(log))
    }

    /// Marks the day won. Does not look at the focus task; see
    /// `DayView::can_win_the_day` for the caller-side guard.
    pub fn win_the_day(
        &self,
        user: &UserContext,
        checklist_id: ChecklistId,
    ) -> ServiceResult<DayChange> {
        let checklist = self.owned_checklist(user, checklist_id)?;
        let updated = self
            .store
            .mark_checklist_won(checklist.id, self.clock.now_ms())?;
        info!(
            "event=day_won module=checklist status=ok date={} first_win={}",
            updated.date, !checklist.won_the_day
        );
        Ok(DayChange::ChecklistUpdated(updated))
    }

    fn owned_checklist(
        &self,
        user: &UserContext,
        checklist_id: ChecklistId,
    ) -> ServiceResult<Checklist> {
        self.store
            .get_checklist(checklist_id)?
            .filter(|checklist| checklist.user_id == user.user_id)
            .ok_or(ServiceError::not_found(EntityKind::Checklist, checklist_id))
    }

    fn owned_task(&self, user: &UserContext, task_id: TaskId) -> ServiceResult<DailyTask> {
        let task = self
            .store
            .get_task(task_id)?
            .ok_or(ServiceError::not_found(EntityKind::Task, task_id))?;
        match self.owned_checklist(user, task.checklist_id) {
            Ok(_) => Ok(task),
            Err(ServiceError::NotFound { .. }) => {
                Err(ServiceError::not_found(EntityKind::Task, task_id))
            }
            Err(other) => Err(other),
        }
    }
}

/// Finds or inserts the checklist for `(user, date)`.
///
/// The stored row wins over the candidate if another writer created the
/// day first.
pub(crate) fn ensure_checklist<R: ChecklistRepository>(
    repo: &R,
    user: &UserContext,
    date: NaiveDate,
) -> ServiceResult<Checklist> {
    if let Some(existing) = repo.find_checklist(user.user_id, date)? {
        return Ok(existing);
    }

    if repo.insert_checklist_if_absent(&Checklist::new(user.user_id, date))? {
        info!("event=checklist_create module=checklist status=ok date={date}");
    }

    repo.find_checklist(user.user_id, date)?.ok_or_else(|| {
        ServiceError::Remote(RepoError::InvalidData(format!(
            "checklist for {date} missing after insert"
        )))
    })
}
