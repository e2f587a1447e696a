//! Session state shared by the auth store, the HTTP client, and the router.
//!
//! DESIGN
//! ======
//! `SessionContext` is the single owner of the current user and bearer
//! token. It is injected (behind an `Arc`) wherever session state is needed
//! instead of living in a global. The token is mirrored into durable
//! storage on every change so a restarted client can rehydrate.
//!
//! Locks are held only for field reads and writes, never across an await.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::net::http::TokenProvider;
use crate::net::types::User;
use crate::storage::{Storage, TOKEN_KEY};

/// Snapshot of the authentication state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
}

impl Session {
    /// Authenticated iff both a token and a user are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

pub struct SessionContext {
    state: RwLock<Session>,
    storage: Arc<dyn Storage>,
}

impl SessionContext {
    /// Create a session seeded with any token left in `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let token = storage.get_item(TOKEN_KEY).filter(|t| !t.is_empty());
        tracing::debug!(has_token = token.is_some(), "session initialized from storage");
        Self { state: RwLock::new(Session { token, ..Session::default() }), storage }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Mark the session busy until the returned guard is dropped.
    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        self.write().loading = true;
        LoadingGuard { session: self }
    }

    /// Install a fresh credential and its user, persisting the token.
    pub(crate) fn establish(&self, token: String, user: User) {
        if let Err(e) = self.storage.set_item(TOKEN_KEY, &token) {
            tracing::warn!(error = %e, "failed to persist token");
        }
        let mut state = self.write();
        state.token = Some(token);
        state.user = Some(user);
    }

    pub(crate) fn replace_user(&self, user: User) {
        self.write().user = Some(user);
    }

    /// Drop user and token from memory and durable storage.
    pub(crate) fn clear(&self) {
        {
            let mut state = self.write();
            state.user = None;
            state.token = None;
        }
        if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to remove persisted token");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenProvider for SessionContext {
    fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    fn invalidate(&self) {
        tracing::info!("credential rejected by backend; clearing session");
        self.clear();
    }
}

/// Resets `loading` on drop, whichever way the owning operation exits.
pub(crate) struct LoadingGuard<'a> {
    session: &'a SessionContext,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.session.write().loading = false;
    }
}
