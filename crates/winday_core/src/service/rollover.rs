//! Carry-over of yesterday's unfinished tasks into today.
//!
//! # Invariants
//! - Only non-focus, not-done tasks of the previous calendar day qualify.
//! - A candidate whose title exactly equals (case-sensitive) a title
//!   already on today's checklist is dropped.
//! - Candidates keep yesterday's sort order.
//! - Habit logs and reflections are never carried over.

use crate::clock::Clock;
use crate::model::checklist::{ChecklistId, DailyTask, TaskId, TaskType};
use crate::model::user::UserContext;
use crate::model::EntityKind;
use crate::repo::{ChecklistRepository, HabitRepository, PlanRepository};
use crate::service::checklist_service::ChecklistManager;
use crate::service::day_view::DayChange;
use crate::service::{ServiceError, ServiceResult};
use chrono::NaiveDate;
use log::info;
use std::collections::HashSet;

/// Carry-over candidates for one day, consumed by copying or dismissal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverSession {
    today_checklist_id: ChecklistId,
    candidates: Vec<DailyTask>,
}

impl RolloverSession {
    pub fn today_checklist_id(&self) -> ChecklistId {
        self.today_checklist_id
    }

    /// Yesterday's task rows still waiting to be copied.
    pub fn candidates(&self) -> &[DailyTask] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Copies one candidate into today and drops it from the list.
    ///
    /// The candidate stays listed when the copy fails.
    pub fn rollover_single<S, C>(
        &mut self,
        manager: &ChecklistManager<S, C>,
        user: &UserContext,
        task_id: TaskId,
    ) -> ServiceResult<DayChange>
    where
        S: ChecklistRepository + HabitRepository + PlanRepository,
        C: Clock,
    {
        let position = self
            .candidates
            .iter()
            .position(|task| task.id == task_id)
            .ok_or(ServiceError::not_found(EntityKind::Task, task_id))?;

        let change = copy_into(manager, user, self.today_checklist_id, &self.candidates[position])?;
        self.candidates.remove(position);
        Ok(change)
    }

    /// Copies every candidate in list order.
    ///
    /// Stops at the first failure; candidates copied before it are already
    /// removed from the session, so the caller should reconcile its view.
    pub fn rollover_all<S, C>(
        &mut self,
        manager: &ChecklistManager<S, C>,
        user: &UserContext,
    ) -> ServiceResult<Vec<DayChange>>
    where
        S: ChecklistRepository + HabitRepository + PlanRepository,
        C: Clock,
    {
        let mut changes = Vec::with_capacity(self.candidates.len());
        while let Some(candidate) = self.candidates.first() {
            let change = copy_into(manager, user, self.today_checklist_id, candidate)?;
            self.candidates.remove(0);
            changes.push(change);
        }
        info!(
            "event=rollover_all module=rollover status=ok copied={}",
            changes.len()
        );
        Ok(changes)
    }

    /// Forgets every candidate without copying.
    pub fn dismiss(&mut self) {
        self.candidates.clear();
    }
}

/// Computes the carry-over candidates for `today`.
///
/// Today's checklist is created first when it does not exist yet.
pub fn compute_rollover<S, C>(
    manager: &ChecklistManager<S, C>,
    user: &UserContext,
    today: NaiveDate,
) -> ServiceResult<RolloverSession>
where
    S: ChecklistRepository + HabitRepository + PlanRepository,
    C: Clock,
{
    let today_checklist = manager.get_or_create_checklist(user, today)?;
    let mut session = RolloverSession {
        today_checklist_id: today_checklist.id,
        candidates: Vec::new(),
    };

    let Some(yesterday) = today.pred_opt() else {
        return Ok(session);
    };
    let store = manager.store();
    let Some(previous) = store.find_checklist(user.user_id, yesterday)? else {
        return Ok(session);
    };

    let today_tasks = store.list_tasks(today_checklist.id)?;
    let today_titles: HashSet<&str> = today_tasks.iter().map(|task| task.title.as_str()).collect();

    session.candidates = store
        .list_tasks(previous.id)?
        .into_iter()
        .filter(|task| task.kind != TaskType::Focus && !task.is_done)
        .filter(|task| !today_titles.contains(task.title.as_str()))
        .collect();

    info!(
        "event=rollover_compute module=rollover status=ok date={} candidates={}",
        today,
        session.candidates.len()
    );
    Ok(session)
}

fn copy_into<S, C>(
    manager: &ChecklistManager<S, C>,
    user: &UserContext,
    today_checklist_id: ChecklistId,
    candidate: &DailyTask,
) -> ServiceResult<DayChange>
where
    S: ChecklistRepository + HabitRepository + PlanRepository,
    C: Clock,
{
    manager.add_task(
        user,
        today_checklist_id,
        &candidate.title,
        candidate.kind,
        candidate.project_id,
    )
}
