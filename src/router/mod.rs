//! Client-side routing with an authentication guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation passes through [`Router::before_each`]:
//!
//! 1. A stored token without a loaded user triggers a session refresh. The
//!    refresh outcome never blocks navigation; a failed refresh has already
//!    logged the session out, which the next step observes.
//! 2. Protected routes redirect unauthenticated visitors to `/login`.
//! 3. `/login` and `/register` redirect authenticated users home.
//! 4. Everything else proceeds unchanged.


pub mod history;
pub mod routes;

use std::sync::Arc;

use history::History;
pub use routes::{Matched, Route};

use crate::state::auth::AuthStore;

pub const LOGIN_PATH: &str = "/login";

/// Redirect hops allowed before a navigation is abandoned.
const MAX_REDIRECTS: usize = 8;

/// Guard decision for one navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("navigation to {from} exceeded {hops} redirects")]
    RedirectLoop { from: String, hops: usize },
}

/// Where a navigation finally landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Location committed to history.
    pub location: String,
    /// Matched leaf route; `None` for paths outside the table.
    pub route: Option<Route>,
}

#[derive(Clone)]
pub struct Router {
    auth: AuthStore,
    history: Arc<History>,
}

impl Router {
    pub fn new(auth: AuthStore, history: Arc<History>) -> Self {
        Self { auth, history }
    }

    #[must_use]
    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// Decide whether navigation to `to` may proceed.
    pub async fn before_each(&self, to: Option<Matched>) -> Navigation {
        let session = self.auth.session();
        if session.token.is_some() && session.user.is_none() && !self.auth.initialize_auth().await {
            tracing::warn!("session refresh failed during navigation; continuing");
        }

        let authenticated = self.auth.is_authenticated();
        match to {
            Some(m) if m.requires_auth && !authenticated => Navigation::Redirect(Route::Login),
            Some(m) if m.route.is_anonymous_only() && authenticated => Navigation::Redirect(Route::Home),
            _ => Navigation::Proceed,
        }
    }

    /// Run the guard for `location`, follow redirects, and commit the result.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::RedirectLoop`] if redirects never settle.
    pub async fn navigate(&self, location: &str) -> Result<Resolved, NavigationError> {
        let mut target = location.to_owned();
        for _ in 0..=MAX_REDIRECTS {
            let matched = routes::resolve(&target);
            match self.before_each(matched).await {
                Navigation::Proceed => {
                    self.history.push(&target);
                    tracing::debug!(location = %target, route = ?matched.map(|m| m.route), "navigated");
                    return Ok(Resolved { location: target, route: matched.map(|m| m.route) });
                }
                Navigation::Redirect(route) => {
                    tracing::debug!(from = %target, to = route.path(), "navigation redirected");
                    route.path().clone_into(&mut target);
                }
            }
        }
        Err(NavigationError::RedirectLoop { from: location.to_owned(), hops: MAX_REDIRECTS })
    }
}
