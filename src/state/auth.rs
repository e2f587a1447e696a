#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use super::session::{Session, SessionContext};
use crate::net::api::Api;
use crate::net::types::{Credentials, LoginResponse, ProfileUpdate, RegisterRequest, User};
use crate::notify::{Notice, Notifier};

pub const MSG_LOGIN_OK: &str = "Login successful";
pub const MSG_LOGIN_FAILED: &str = "Login failed, please check your username and password";
pub const MSG_REGISTER_OK: &str = "Registration successful, please log in";
pub const MSG_REGISTER_FAILED: &str = "Registration failed, please try again";
pub const MSG_LOGGED_OUT: &str = "Logged out";
pub const MSG_PROFILE_OK: &str = "Profile updated";
pub const MSG_PROFILE_FAILED: &str = "Update failed, please try again";

/// Session lifecycle: login, registration, logout, rehydration, profile edits.
///
/// Operations report their outcome to the user through the notifier and
/// return `true`/`false`; errors never propagate past the store. Concurrent
/// calls are not deduplicated, so the last response to land wins.
#[derive(Clone)]
pub struct AuthStore {
    session: Arc<SessionContext>,
    api: Api,
    notifier: Arc<dyn Notifier>,
}

impl AuthStore {
    pub fn new(session: Arc<SessionContext>, api: Api, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, api, notifier }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.snapshot().token
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub async fn login(&self, credentials: &Credentials) -> bool {
        let _loading = self.session.begin_loading();
        match self.api.auth().login(credentials).await {
            Ok(LoginResponse { access_token, user, .. }) => {
                tracing::info!(user_id = user.id, name = %user.display_name(), "logged in");
                self.session.establish(access_token, user);
                self.notifier.notify(Notice::success(MSG_LOGIN_OK));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, username = %credentials.username, "login failed");
                self.notifier.notify(Notice::error(e.detail().unwrap_or(MSG_LOGIN_FAILED)));
                false
            }
        }
    }

    /// Create an account. The session is left untouched; the user logs in next.
    pub async fn register(&self, request: &RegisterRequest) -> bool {
        let _loading = self.session.begin_loading();
        match self.api.auth().register(request).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "registered");
                self.notifier.notify(Notice::success(MSG_REGISTER_OK));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, username = %request.username, "registration failed");
                self.notifier.notify(Notice::error(e.detail().unwrap_or(MSG_REGISTER_FAILED)));
                false
            }
        }
    }

    /// Forget the session locally. The backend is not contacted.
    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("logged out");
        self.notifier.notify(Notice::success(MSG_LOGGED_OUT));
    }

    /// Rehydrate the user from a stored token.
    ///
    /// Returns `false` without side effects when there is no token. A
    /// rejected or unreachable refresh logs the session out.
    pub async fn initialize_auth(&self) -> bool {
        if self.token().is_none() {
            return false;
        }
        match self.api.auth().current_user().await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, name = %user.display_name(), "session restored");
                self.session.replace_user(user);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "token validation failed");
                self.logout();
                false
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> bool {
        let _loading = self.session.begin_loading();
        match self.api.users().update_profile(update).await {
            Ok(user) => {
                self.session.replace_user(user);
                self.notifier.notify(Notice::success(MSG_PROFILE_OK));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile update failed");
                self.notifier.notify(Notice::error(e.detail().unwrap_or(MSG_PROFILE_FAILED)));
                false
            }
        }
    }
}
