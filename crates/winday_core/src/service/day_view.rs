//! Local view state for one day and the change commands folded into it.
//!
//! # Invariants
//! - A `DayView` only ever holds rows belonging to its own checklist.
//! - Changes are applied after the store confirmed them; a failed call
//!   produces no change, so local state cannot drift from storage.
//! - `DayViewState` drops loads and changes tagged with an old generation.

use crate::model::checklist::{
    Checklist, DailyTask, Habit, HabitId, HabitLog, TaskId, TaskType,
};
use crate::model::plan::{BacklogItem, Project};
use serde::Serialize;

/// Everything the daily checklist screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub checklist: Checklist,
    /// Ordered by `sort_order`.
    pub tasks: Vec<DailyTask>,
    pub habits: Vec<Habit>,
    pub habit_logs: Vec<HabitLog>,
    /// Projects without a completion timestamp.
    pub active_projects: Vec<Project>,
    /// Undone tasks of the active projects.
    pub project_backlog: Vec<BacklogItem>,
}

/// Confirmed mutation result, ready to be folded into a `DayView`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "record", rename_all = "snake_case")]
pub enum DayChange {
    TaskAdded(DailyTask),
    TaskUpdated(DailyTask),
    TaskRemoved(TaskId),
    HabitLogged(HabitLog),
    ChecklistUpdated(Checklist),
}

impl DayView {
    /// First focus task by sort order; later ones are ignored everywhere.
    pub fn focus_task(&self) -> Option<&DailyTask> {
        self.tasks.iter().find(|task| task.kind == TaskType::Focus)
    }

    pub fn tasks_of(&self, kind: TaskType) -> impl Iterator<Item = &DailyTask> {
        self.tasks.iter().filter(move |task| task.kind == kind)
    }

    /// A habit without a log for the day counts as not done.
    pub fn habit_done(&self, habit_id: HabitId) -> bool {
        self.habit_logs
            .iter()
            .find(|log| log.habit_id == habit_id)
            .is_some_and(|log| log.is_done)
    }

    /// Caller-side guard for "won the day": a focus task exists and is done.
    pub fn can_win_the_day(&self) -> bool {
        !self.checklist.won_the_day && self.focus_task().is_some_and(|task| task.is_done)
    }

    /// Folds a confirmed change into the view.
    ///
    /// Returns `false` when the change targets another checklist.
    pub fn apply(&mut self, change: DayChange) -> bool {
        match change {
            DayChange::TaskAdded(task) => {
                if task.checklist_id != self.checklist.id {
                    return false;
                }
                if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                    *existing = task;
                } else {
                    let position = self
                        .tasks
                        .partition_point(|t| t.sort_order <= task.sort_order);
                    self.tasks.insert(position, task);
                }
                true
            }
            DayChange::TaskUpdated(task) => {
                if task.checklist_id != self.checklist.id {
                    return false;
                }
                match self.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(existing) => {
                        *existing = task;
                        true
                    }
                    None => false,
                }
            }
            DayChange::TaskRemoved(task_id) => {
                let before = self.tasks.len();
                self.tasks.retain(|task| task.id != task_id);
                self.tasks.len() != before
            }
            DayChange::HabitLogged(log) => {
                if log.checklist_id != self.checklist.id {
                    return false;
                }
                match self.habit_logs.iter_mut().find(|l| l.id == log.id) {
                    Some(existing) => *existing = log,
                    None => self.habit_logs.push(log),
                }
                true
            }
            DayChange::ChecklistUpdated(checklist) => {
                if checklist.id != self.checklist.id {
                    return false;
                }
                self.checklist = checklist;
                true
            }
        }
    }
}

/// Holder for the current day view with a stale-response guard.
#[derive(Debug, Default)]
pub struct DayViewState {
    generation: u64,
    view: Option<DayView>,
}

impl DayViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&DayView> {
        self.view.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a load; only the returned generation may complete it.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Stores a loaded view unless a newer load or `invalidate` happened.
    pub fn finish_load(&mut self, generation: u64, view: DayView) -> bool {
        if generation != self.generation {
            return false;
        }
        self.view = Some(view);
        true
    }

    /// Applies a change issued under `generation`.
    pub fn apply(&mut self, generation: u64, change: DayChange) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.view.as_mut() {
            Some(view) => view.apply(change),
            None => false,
        }
    }

    /// Called when the screen goes away; in-flight results are discarded.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.view = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{DayChange, DayView, DayViewState};
    use crate::model::checklist::{Checklist, DailyTask, HabitLog, TaskType};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn empty_view() -> DayView {
        let date = NaiveDate::from_ymd_opt(2026, 5, 4).expect("valid date");
        DayView {
            checklist: Checklist::new(Uuid::new_v4(), date),
            tasks: Vec::new(),
            habits: Vec::new(),
            habit_logs: Vec::new(),
            active_projects: Vec::new(),
            project_backlog: Vec::new(),
        }
    }

    #[test]
    fn can_win_requires_done_focus_task() {
        let mut view = empty_view();
        assert!(!view.can_win_the_day());

        let mut focus = DailyTask::new(view.checklist.id, "deep work", TaskType::Focus, None, 0);
        view.apply(DayChange::TaskAdded(focus.clone()));
        assert!(!view.can_win_the_day());

        focus.is_done = true;
        focus.completed_at = Some(10);
        assert!(view.apply(DayChange::TaskUpdated(focus)));
        assert!(view.can_win_the_day());

        let mut won = view.checklist.clone();
        won.won_the_day = true;
        view.apply(DayChange::ChecklistUpdated(won));
        assert!(!view.can_win_the_day());
    }

    #[test]
    fn added_tasks_keep_sort_order() {
        let mut view = empty_view();
        let id = view.checklist.id;
        view.apply(DayChange::TaskAdded(DailyTask::new(id, "b", TaskType::Other, None, 1)));
        view.apply(DayChange::TaskAdded(DailyTask::new(id, "a", TaskType::Other, None, 0)));
        view.apply(DayChange::TaskAdded(DailyTask::new(id, "c", TaskType::Other, None, 2)));

        let titles: Vec<&str> = view.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn changes_for_other_checklists_are_ignored() {
        let mut view = empty_view();
        let foreign = DailyTask::new(Uuid::new_v4(), "x", TaskType::Other, None, 0);
        assert!(!view.apply(DayChange::TaskAdded(foreign)));
        assert!(view.tasks.is_empty());

        let log = HabitLog {
            id: Uuid::new_v4(),
            checklist_id: Uuid::new_v4(),
            habit_id: Uuid::new_v4(),
            is_done: true,
        };
        assert!(!view.apply(DayChange::HabitLogged(log)));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut state = DayViewState::new();
        let first = state.begin_load();
        let second = state.begin_load();

        assert!(!state.finish_load(first, empty_view()));
        assert!(state.view().is_none());
        assert!(state.finish_load(second, empty_view()));

        let checklist_id = state.view().map(|view| view.checklist.id).expect("view");
        let task = DailyTask::new(checklist_id, "late", TaskType::Other, None, 0);
        state.invalidate();
        assert!(!state.apply(second, DayChange::TaskAdded(task)));
        assert!(state.view().is_none());
    }
}
