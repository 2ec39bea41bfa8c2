//! User profile and explicit per-call user context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

pub type UserId = Uuid;

/// Stored profile for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub onboarding_complete: bool,
}

impl UserProfile {
    pub fn new(email: impl Into<String>, full_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into().trim().to_string(),
            full_name: full_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            onboarding_complete: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    /// Two-letter badge shown next to the streak counter.
    pub fn initials(&self) -> String {
        let source = self
            .full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(self.email.as_str());
        let initials: String = source.chars().take(2).collect::<String>().to_uppercase();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}

/// Identity passed explicitly into every service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: UserId,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl From<&UserProfile> for UserContext {
    fn from(value: &UserProfile) -> Self {
        Self::new(value.id)
    }
}

/// Partial metadata update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMetadataPatch {
    pub full_name: Option<String>,
    pub onboarding_complete: Option<bool>,
}
