//! Progress aggregation over already-fetched data.
//!
//! Pure functions: no storage access, no clock reads.
//!
//! # Invariants
//! - Percentages round half up to the nearest integer.
//! - A zero denominator yields 0, never a division.
//! - Goal progress weighs every task equally across all of the goal's
//!   projects; it is not an average of per-project percentages.

use crate::model::checklist::{Checklist, ChecklistWithEntries, HabitId, HabitLog};
use crate::model::plan::{GoalWithProjects, ProjectWithTasks};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub done: u32,
    pub total: u32,
    pub pct: u32,
}

impl Progress {
    pub fn new(done: u32, total: u32) -> Self {
        Self {
            done,
            total,
            pct: percentage(done, total),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub done: u32,
    pub total: u32,
    pub pct: u32,
    pub project_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRate {
    pub won_days: u32,
    pub total_days: u32,
    pub pct: u32,
}

/// `round(done / total * 100)` with half-up rounding; 0 when `total == 0`.
pub fn percentage(done: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(done) * 100;
    let total = u64::from(total);
    ((scaled + total / 2) / total) as u32
}

pub fn project_progress(project: &ProjectWithTasks) -> Progress {
    let total = project.tasks.len() as u32;
    let done = project.tasks.iter().filter(|task| task.is_done).count() as u32;
    Progress::new(done, total)
}

/// Sums task completion across every project carried by the goal view.
pub fn goal_progress(goal: &GoalWithProjects) -> GoalProgress {
    let (done, total) = goal
        .projects
        .iter()
        .map(project_progress)
        .fold((0, 0), |(done, total), progress| {
            (done + progress.done, total + progress.total)
        });

    GoalProgress {
        done,
        total,
        pct: percentage(done, total),
        project_count: goal.projects.len() as u32,
    }
}

/// Share of supplied days marked won. Order of the input does not matter.
pub fn win_rate<'a>(checklists: impl IntoIterator<Item = &'a Checklist>) -> WinRate {
    let (won_days, total_days) = checklists
        .into_iter()
        .fold((0u32, 0u32), |(won, total), checklist| {
            (won + u32::from(checklist.won_the_day), total + 1)
        });

    WinRate {
        won_days,
        total_days,
        pct: percentage(won_days, total_days),
    }
}

/// Consecutive won days ending today or yesterday.
///
/// Checklists dated after `today` are ignored; the checklist dated `today`
/// is ignored unless `include_today` is set. The walk starts from `today`
/// and stops at the first day not won or at the first calendar gap, so a
/// run whose newest day is older than yesterday counts as zero. Input
/// order does not matter.
pub fn current_streak<'a>(
    checklists: impl IntoIterator<Item = &'a Checklist>,
    today: NaiveDate,
    include_today: bool,
) -> u32 {
    let mut days: Vec<&Checklist> = checklists
        .into_iter()
        .filter(|checklist| checklist.date < today || (include_today && checklist.date == today))
        .collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));

    let mut streak = 0;
    let mut newer = today;
    for checklist in days {
        if !checklist.won_the_day || (newer - checklist.date).num_days() > 1 {
            break;
        }
        streak += 1;
        newer = checklist.date;
    }
    streak
}

/// Completion over the logs that exist for `habit_id`; days without a log
/// are not counted.
pub fn habit_completion_rate<'a>(
    habit_id: HabitId,
    logs: impl IntoIterator<Item = &'a HabitLog>,
) -> Progress {
    let (done, total) = logs
        .into_iter()
        .filter(|log| log.habit_id == habit_id)
        .fold((0u32, 0u32), |(done, total), log| {
            (done + u32::from(log.is_done), total + 1)
        });
    Progress::new(done, total)
}

/// Tri-state classification of one heatmap square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapCell {
    Done,
    Missed,
    NoData,
}

/// Habit completion keyed by `(date, habit)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitLogMap {
    entries: HashMap<(NaiveDate, HabitId), bool>,
}

impl HabitLogMap {
    pub fn from_checklists<'a>(
        checklists: impl IntoIterator<Item = &'a ChecklistWithEntries>,
    ) -> Self {
        let mut map = Self::default();
        for entry in checklists {
            for log in &entry.habit_logs {
                map.insert(entry.checklist.date, log.habit_id, log.is_done);
            }
        }
        map
    }

    pub fn insert(&mut self, date: NaiveDate, habit_id: HabitId, is_done: bool) {
        self.entries.insert((date, habit_id), is_done);
    }

    pub fn get(&self, date: NaiveDate, habit_id: HabitId) -> Option<bool> {
        self.entries.get(&(date, habit_id)).copied()
    }
}

pub fn habit_heatmap_cell(date: NaiveDate, habit_id: HabitId, logs: &HabitLogMap) -> HeatmapCell {
    match logs.get(date, habit_id) {
        Some(true) => HeatmapCell::Done,
        Some(false) => HeatmapCell::Missed,
        None => HeatmapCell::NoData,
    }
}
