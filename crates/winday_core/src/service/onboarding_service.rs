//! First-run setup: optional goal, optional project, starter habits.

use crate::clock::Clock;
use crate::model::checklist::Habit;
use crate::model::plan::Goal;
use crate::model::user::{UserContext, UserMetadataPatch, UserProfile};
use crate::repo::{HabitRepository, PlanRepository, UserRepository};
use crate::service::habit_service::HabitService;
use crate::service::plan_service::{PlanService, ProjectOverview};
use crate::service::ServiceResult;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProject {
    pub title: String,
    pub quarter: String,
}

/// Answers collected by the onboarding wizard. Blank entries are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingPlan {
    pub goal_title: Option<String>,
    pub project: Option<OnboardingProject>,
    pub habits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingOutcome {
    pub profile: UserProfile,
    pub goal: Option<Goal>,
    pub project: Option<ProjectOverview>,
    pub habits: Vec<Habit>,
}

/// Writes happen one by one; a failure leaves earlier records in place and
/// the onboarding flag unset.
pub struct OnboardingService<S, C> {
    store: S,
    clock: C,
}

impl<S, C> OnboardingService<S, C>
where
    S: UserRepository + PlanRepository + HabitRepository + Copy,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Creates the planned records, then marks onboarding complete.
    ///
    /// Callers holding a `SessionHub` should `refresh()` it afterwards.
    pub fn finish_onboarding(
        &self,
        user: &UserContext,
        plan: &OnboardingPlan,
    ) -> ServiceResult<OnboardingOutcome> {
        let plans = PlanService::new(self.store, &self.clock);
        let habit_service = HabitService::new(self.store);

        let goal = match non_blank(plan.goal_title.as_deref()) {
            Some(title) => Some(plans.add_goal(user, title)?),
            None => None,
        };

        let project = match &plan.project {
            Some(project) if non_blank(Some(project.title.as_str())).is_some() => {
                let goal_id = goal.as_ref().map(|goal| goal.id);
                Some(plans.add_project(user, &project.title, &project.quarter, goal_id)?)
            }
            _ => None,
        };

        let habits = plan
            .habits
            .iter()
            .filter_map(|title| non_blank(Some(title.as_str())))
            .map(|title| habit_service.add_habit(user, title))
            .collect::<ServiceResult<Vec<_>>>()?;

        let profile = self.mark_complete(user)?;
        info!(
            "event=onboarding_finish module=onboarding status=ok goal={} project={} habits={}",
            goal.is_some(),
            project.is_some(),
            habits.len()
        );
        Ok(OnboardingOutcome {
            profile,
            goal,
            project,
            habits,
        })
    }

    pub fn skip_onboarding(&self, user: &UserContext) -> ServiceResult<UserProfile> {
        let profile = self.mark_complete(user)?;
        info!("event=onboarding_skip module=onboarding status=ok");
        Ok(profile)
    }

    fn mark_complete(&self, user: &UserContext) -> ServiceResult<UserProfile> {
        let patch = UserMetadataPatch {
            full_name: None,
            onboarding_complete: Some(true),
        };
        Ok(self.store.update_user_metadata(user.user_id, &patch)?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
