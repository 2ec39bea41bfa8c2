//! Habit list management.
//!
//! # Invariants
//! - At most `MAX_HABITS` habits per user.
//! - New habits go to the end of the list.

use crate::model::checklist::{Habit, HabitId};
use crate::model::user::UserContext;
use crate::model::EntityKind;
use crate::repo::HabitRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub const MAX_HABITS: i64 = 10;

pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_habits(&self, user: &UserContext) -> ServiceResult<Vec<Habit>> {
        Ok(self.repo.list_habits(user.user_id)?)
    }

    pub fn add_habit(&self, user: &UserContext, title: &str) -> ServiceResult<Habit> {
        let count = self.repo.count_habits(user.user_id)?;
        if count >= MAX_HABITS {
            return Err(ServiceError::LimitReached {
                entity: EntityKind::Habit,
                limit: MAX_HABITS,
            });
        }

        let habit = Habit::new(user.user_id, title, count);
        habit.validate()?;
        self.repo.insert_habit(&habit)?;
        info!("event=habit_add module=habit status=ok count={}", count + 1);
        Ok(habit)
    }

    /// Deletes a habit together with its logs.
    pub fn remove_habit(&self, user: &UserContext, habit_id: HabitId) -> ServiceResult<()> {
        let owned = self
            .repo
            .get_habit(habit_id)?
            .is_some_and(|habit| habit.user_id == user.user_id);
        if !owned {
            return Err(ServiceError::not_found(EntityKind::Habit, habit_id));
        }
        self.repo.delete_habit(habit_id)?;
        Ok(())
    }
}
