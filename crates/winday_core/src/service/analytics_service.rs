//! Analytics report and sidebar streak.
//!
//! # Invariants
//! - Only the 7, 30 and 90 day windows are served.
//! - The report streak counts today; the sidebar streak does not.
//! - Nothing is written; every figure is derived on read.

use crate::clock::Clock;
use crate::model::checklist::{ChecklistWithEntries, Habit, HabitId};
use crate::model::user::UserContext;
use crate::model::ValidationError;
use crate::repo::{
    ChecklistOrder, ChecklistQuery, ChecklistRepository, HabitRepository, PlanRepository,
    ProjectFilter,
};
use crate::service::plan_service::ProjectOverview;
use crate::service::progress::{
    current_streak, habit_completion_rate, habit_heatmap_cell, win_rate, HabitLogMap,
    HeatmapCell, Progress, WinRate,
};
use crate::service::ServiceResult;
use chrono::{Days, NaiveDate};
use log::debug;
use serde::Serialize;

pub const SUPPORTED_RANGES: [u32; 3] = [7, 30, 90];

/// Checklists read for the sidebar streak.
pub const SIDEBAR_STREAK_WINDOW: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStat {
    pub habit: Habit,
    pub completion: Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyWin {
    pub date: NaiveDate,
    pub won: bool,
    pub tasks_done: u32,
}

/// One heatmap row; `cells[i]` belongs to `AnalyticsReport::heatmap_days[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitHeatmapRow {
    pub habit_id: HabitId,
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    pub range_days: u32,
    /// Inclusive lower bound of the checklists read.
    pub since: NaiveDate,
    pub win_rate: WinRate,
    pub current_streak: u32,
    pub habits: Vec<HabitStat>,
    pub tasks: Progress,
    pub daily: Vec<DailyWin>,
    pub projects: Vec<ProjectOverview>,
    pub heatmap_days: Vec<NaiveDate>,
    pub heatmap: Vec<HabitHeatmapRow>,
}

pub fn validate_range(range_days: u32) -> Result<u32, ValidationError> {
    if SUPPORTED_RANGES.contains(&range_days) {
        Ok(range_days)
    } else {
        Err(ValidationError::UnsupportedRange(range_days))
    }
}

pub struct AnalyticsService<S, C> {
    store: S,
    clock: C,
}

impl<S, C> AnalyticsService<S, C>
where
    S: ChecklistRepository + HabitRepository + PlanRepository,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn analytics_report(
        &self,
        user: &UserContext,
        range_days: u32,
    ) -> ServiceResult<AnalyticsReport> {
        let range_days = validate_range(range_days)?;
        let today = self.clock.today();
        let since = days_before(today, range_days);

        let entries = self
            .store
            .list_checklists_with_entries(user.user_id, since)?;
        let habits = self.store.list_habits(user.user_id)?;
        let projects = self
            .store
            .list_projects(
                user.user_id,
                &ProjectFilter {
                    active_only: false,
                    goal_id: None,
                },
            )?
            .into_iter()
            .map(ProjectOverview::from)
            .collect();

        let checklists = entries.iter().map(|entry| &entry.checklist);
        let habit_stats = habits
            .iter()
            .map(|habit| HabitStat {
                habit: habit.clone(),
                completion: habit_completion_rate(
                    habit.id,
                    entries.iter().flat_map(|entry| entry.habit_logs.iter()),
                ),
            })
            .collect();

        let heatmap_days: Vec<NaiveDate> = days_before(today, range_days - 1)
            .iter_days()
            .take(range_days as usize)
            .collect();
        let logs = HabitLogMap::from_checklists(&entries);
        let heatmap = habits
            .iter()
            .map(|habit| HabitHeatmapRow {
                habit_id: habit.id,
                cells: heatmap_days
                    .iter()
                    .map(|day| habit_heatmap_cell(*day, habit.id, &logs))
                    .collect(),
            })
            .collect();

        debug!(
            "event=analytics_report module=analytics status=ok range={range_days} days={}",
            entries.len()
        );
        Ok(AnalyticsReport {
            range_days,
            since,
            win_rate: win_rate(checklists.clone()),
            current_streak: current_streak(checklists, today, true),
            habits: habit_stats,
            tasks: task_totals(&entries),
            daily: entries.iter().map(daily_win).collect(),
            projects,
            heatmap_days,
            heatmap,
        })
    }

    /// Streak shown next to the avatar; today is still in progress.
    pub fn sidebar_streak(&self, user: &UserContext) -> ServiceResult<u32> {
        let query = ChecklistQuery {
            since: None,
            order: ChecklistOrder::Descending,
            limit: Some(SIDEBAR_STREAK_WINDOW),
        };
        let recent = self.store.list_checklists(user.user_id, &query)?;
        Ok(current_streak(&recent, self.clock.today(), false))
    }
}

fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

fn task_totals(entries: &[ChecklistWithEntries]) -> Progress {
    let (done, total) = entries
        .iter()
        .flat_map(|entry| entry.tasks.iter())
        .fold((0u32, 0u32), |(done, total), task| {
            (done + u32::from(task.is_done), total + 1)
        });
    Progress::new(done, total)
}

fn daily_win(entry: &ChecklistWithEntries) -> DailyWin {
    DailyWin {
        date: entry.checklist.date,
        won: entry.checklist.won_the_day,
        tasks_done: entry.tasks.iter().filter(|task| task.is_done).count() as u32,
    }
}
