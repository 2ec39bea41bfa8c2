//! Local session state and auth-state notifications.
//!
//! # Responsibility
//! - Track the signed-in user for one process.
//! - Register, look up and update user profiles.
//! - Notify listeners on sign-in, sign-out and profile refresh.
//!
//! Credential checks belong to the external identity provider; `sign_in`
//! only resolves a registered email to its profile.

use crate::model::user::{UserContext, UserMetadataPatch, UserProfile};
use crate::model::EntityKind;
use crate::repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(UserContext),
    SignedOut,
    /// Profile metadata changed for the signed-in user.
    SessionRefreshed(UserContext),
}

type Listener = Box<dyn FnMut(&AuthEvent)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
    /// Set while `emit` holds the callbacks outside the map.
    emitting: bool,
    /// Ids unsubscribed during the current `emit`.
    detached: BTreeSet<u64>,
}

/// Handle returned by `SessionHub::subscribe`; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut listeners = listeners.borrow_mut();
            if listeners.entries.remove(&self.id).is_none() && listeners.emitting {
                listeners.detached.insert(self.id);
            }
        }
    }
}

pub struct SessionHub<R: UserRepository> {
    repo: R,
    current: Option<UserProfile>,
    listeners: Rc<RefCell<Listeners>>,
}

impl<R: UserRepository> SessionHub<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            current: None,
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// Registers a new profile and signs it in.
    pub fn sign_up(&mut self, email: &str, full_name: Option<String>) -> ServiceResult<UserProfile> {
        let profile = UserProfile::new(email, full_name);
        profile.validate()?;
        if self.repo.find_user_by_email(&profile.email)?.is_some() {
            return Err(ServiceError::EmailTaken(profile.email));
        }

        self.repo.create_user(&profile)?;
        info!("event=user_sign_up module=session status=ok");
        self.establish(profile.clone());
        Ok(profile)
    }

    pub fn sign_in(&mut self, email: &str) -> ServiceResult<UserContext> {
        let email = email.trim();
        let profile = self
            .repo
            .find_user_by_email(email)?
            .ok_or_else(|| ServiceError::UnknownEmail(email.to_string()))?;
        let context = UserContext::from(&profile);
        self.establish(profile);
        Ok(context)
    }

    /// Clears the session. Signing out twice notifies once.
    pub fn sign_out(&mut self) {
        if self.current.take().is_some() {
            info!("event=user_sign_out module=session status=ok");
            self.emit(&AuthEvent::SignedOut);
        }
    }

    pub fn current_user(&self) -> ServiceResult<UserContext> {
        self.current
            .as_ref()
            .map(UserContext::from)
            .ok_or(ServiceError::Unauthenticated)
    }

    pub fn current_profile(&self) -> Option<&UserProfile> {
        self.current.as_ref()
    }

    /// Re-reads the signed-in profile from storage.
    pub fn refresh(&mut self) -> ServiceResult<UserProfile> {
        let context = self.current_user()?;
        let profile = self
            .repo
            .get_user(context.user_id)?
            .ok_or(ServiceError::not_found(EntityKind::User, context.user_id))?;
        self.current = Some(profile.clone());
        self.emit(&AuthEvent::SessionRefreshed(context));
        Ok(profile)
    }

    pub fn update_user_metadata(
        &mut self,
        patch: &UserMetadataPatch,
    ) -> ServiceResult<UserProfile> {
        let context = self.current_user()?;
        let profile = self.repo.update_user_metadata(context.user_id, patch)?;
        info!("event=user_metadata_update module=session status=ok");
        self.current = Some(profile.clone());
        self.emit(&AuthEvent::SessionRefreshed(context));
        Ok(profile)
    }

    /// Listeners run synchronously, in subscription order. A callback may
    /// drop its own or any other `Subscription`; a listener dropped that way
    /// is not called again, including later in the same notification.
    pub fn subscribe(&self, listener: impl FnMut(&AuthEvent) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Box::new(listener));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    fn establish(&mut self, profile: UserProfile) {
        let context = UserContext::from(&profile);
        self.current = Some(profile);
        self.emit(&AuthEvent::SignedIn(context));
    }

    fn emit(&self, event: &AuthEvent) {
        let mut running = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.emitting = true;
            std::mem::take(&mut listeners.entries)
        };
        for (id, listener) in running.iter_mut() {
            if !self.listeners.borrow().detached.contains(id) {
                listener(event);
            }
        }

        let detached = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.emitting = false;
            std::mem::take(&mut listeners.detached)
        };
        let finished: Vec<Listener> = detached
            .iter()
            .filter_map(|id| running.remove(id))
            .collect();
        self.listeners.borrow_mut().entries.append(&mut running);
        // Callbacks may own other subscriptions; drop them with the map released.
        drop(finished);
    }
}
