//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the checklist, rollover, planning,
//!   habit, reflection, analytics and onboarding use-cases.
//! - Surface the storage collaborator's failures unchanged; no retries.
//!
//! # Invariants
//! - Every user-scoped call takes an explicit `UserContext`.
//! - Mutations return the resulting records; callers fold them into local
//!   state only after success.

pub mod analytics_service;
pub mod checklist_service;
pub mod day_view;
pub mod habit_service;
pub mod onboarding_service;
pub mod plan_service;
pub mod progress;
pub mod reflection_service;
pub mod rollover;
pub mod session;

use crate::model::checklist::ChecklistId;
use crate::model::{EntityKind, ValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to callers of the service layer.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced entity does not exist.
    NotFound { entity: EntityKind, id: Uuid },
    /// No active session where one is required.
    Unauthenticated,
    /// Storage collaborator failure other than not-found.
    Remote(RepoError),
    /// Input rejected before reaching storage.
    Invalid(ValidationError),
    /// Per-user cap reached (5 active goals, 10 habits).
    LimitReached { entity: EntityKind, limit: i64 },
    /// The checklist already has a focus task.
    FocusTaskExists(ChecklistId),
    /// No user registered under the email.
    UnknownEmail(String),
    /// Email already registered.
    EmailTaken(String),
}

impl ServiceError {
    pub(crate) fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Unauthenticated => write!(f, "no active session"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::LimitReached { entity, limit } => {
                write!(f, "{entity} limit of {limit} reached")
            }
            Self::FocusTaskExists(id) => {
                write!(f, "checklist {id} already has a focus task")
            }
            Self::UnknownEmail(email) => write!(f, "no account for `{email}`"),
            Self::EmailTaken(email) => write!(f, "account already exists for `{email}`"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Invalid(err),
            other => Self::Remote(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}
