//! Application wiring.
//!
//! DESIGN
//! ======
//! `App` builds the object graph once: one session, one HTTP client reading
//! its token from that session, one auth store, one router. Hosts choose the
//! storage backend, the notice sink, and the starting location.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::net::api::Api;
use crate::net::error::ApiError;
use crate::net::http::HttpClient;
use crate::notify::Notifier;
use crate::router::Router;
use crate::router::history::History;
use crate::state::auth::AuthStore;
use crate::state::session::SessionContext;
use crate::storage::Storage;

#[derive(Clone)]
pub struct App {
    pub config: AppConfig,
    pub session: Arc<SessionContext>,
    pub history: Arc<History>,
    pub api: Api,
    pub auth: AuthStore,
    pub router: Router,
}

impl App {
    /// # Errors
    ///
    /// Returns [`ApiError::Build`] if the HTTP client cannot be constructed.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        history: Arc<History>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(SessionContext::new(storage));
        let http = HttpClient::new(&config, session.clone(), notifier.clone(), history.clone())?;
        let api = Api::new(http);
        let auth = AuthStore::new(session.clone(), api.clone(), notifier);
        let router = Router::new(auth.clone(), history.clone());
        tracing::info!(title = %config.app_title, version = %config.app_version, base_url = %config.api_base_url, "client ready");
        Ok(Self { config, session, history, api, auth, router })
    }
}
