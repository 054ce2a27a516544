use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::bridge::SessionBridge;
use super::config::{Settings, TaskdeckConfig};
use super::gate::RequestAuthGate;
use super::resolver::IdentityResolver;
use super::traits::{AccountStore, PasswordHasher, SessionStore, TaskStore};
use crate::token::CredentialAuthority;

/// Shared state for every route handler.
pub struct AppState<A, T, S> {
    pub(crate) resolver: IdentityResolver<A>,
    pub(crate) accounts: Arc<A>,
    pub(crate) tasks: Arc<T>,
    pub(crate) sessions: Arc<S>,
    pub(crate) hasher: Arc<dyn PasswordHasher>,
    pub(crate) settings: Settings,
}

// Manual Clone: avoid derive adding `A: Clone, T: Clone, S: Clone` bounds.
impl<A, T, S> Clone for AppState<A, T, S> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            accounts: self.accounts.clone(),
            tasks: self.tasks.clone(),
            sessions: self.sessions.clone(),
            hasher: self.hasher.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<A: AccountStore, T: TaskStore, S: SessionStore> AppState<A, T, S> {
    /// Stores are taken as `Arc`s so callers can keep a handle (seeding, tests).
    #[must_use]
    pub fn new(
        config: TaskdeckConfig,
        accounts: Arc<A>,
        tasks: Arc<T>,
        sessions: Arc<S>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let resolver = IdentityResolver::new(Arc::new(config.authority), accounts.clone());
        Self {
            resolver,
            accounts,
            tasks,
            sessions,
            hasher,
            settings: config.settings,
        }
    }

    #[must_use]
    pub fn authority(&self) -> &CredentialAuthority {
        self.resolver.authority()
    }

    pub(crate) fn bridge(&self) -> SessionBridge<'_, A, S> {
        SessionBridge::new(&self.resolver, &self.sessions)
    }

    pub(crate) fn gate(&self) -> RequestAuthGate<'_, A> {
        RequestAuthGate::new(&self.resolver)
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<A, T, S> FromRef<AppState<A, T, S>> for Key {
    fn from_ref(state: &AppState<A, T, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
