//! Core domain logic for Win the Day.
//!
//! Daily checklist, carry-over of unfinished work, quarterly planning,
//! habits, reflection and progress analytics over a SQLite store. This
//! crate is the single source of truth for business invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{UserContext, UserProfile};
pub use model::{EntityKind, ValidationError};
pub use repo::{RepoError, RepoResult, SqliteStore};
pub use service::analytics_service::{AnalyticsReport, AnalyticsService};
pub use service::checklist_service::ChecklistManager;
pub use service::day_view::{DayChange, DayView, DayViewState};
pub use service::habit_service::HabitService;
pub use service::onboarding_service::{OnboardingPlan, OnboardingService};
pub use service::plan_service::PlanService;
pub use service::reflection_service::ReflectionService;
pub use service::rollover::{compute_rollover, RolloverSession};
pub use service::session::{AuthEvent, SessionHub, Subscription};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
