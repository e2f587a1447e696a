//! Configured HTTP client with request and response interception.
//!
//! SYSTEM CONTEXT
//! ==============
//! All backend traffic goes through one `HttpClient`. Outgoing requests get
//! the current bearer token from a `TokenProvider` at call time, so the
//! session and the client share no hidden header state. Every failed
//! response is classified into an `ApiError` and reported exactly once:
//!
//! - 401: the token is invalidated and, unless the user is already on the
//!   login page, a session-expired notice is shown and the client is
//!   force-navigated to `/login`.
//! - 403 / 404 / 5xx: a fixed notice.
//! - anything else: the backend `detail`, or a generic notice.
//!
//! The error is returned to the caller afterwards in every case.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::fmt;
use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, extract_detail};
use crate::config::AppConfig;
use crate::notify::{Notice, Notifier};
use crate::router::LOGIN_PATH;
use crate::router::history::Navigator;

/// Source of the bearer credential attached to outgoing requests.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Drop the credential after the backend rejected it.
    fn invalidate(&self);
}

/// Ordered query parameters, passed through to the URL unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &str, value: impl fmt::Display) {
        self.pairs.push((key.to_owned(), value.to_string()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    /// Build a client for `config.api_base_url` with its request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Build`] if the underlying client cannot be built.
    pub fn new(
        config: &AppConfig,
        tokens: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Build(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            tokens,
            notifier,
            navigator,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/activities/`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =========================================================================
    // VERBS
    // =========================================================================

    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Option<&Query>) -> Result<T, ApiError> {
        let mut builder = self.request(Method::GET, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            builder = builder.query(query.pairs());
        }
        self.execute(builder).await
    }

    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    /// POST without a request body.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path)).await
    }

    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    /// PUT without a request body.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::PUT, path)).await
    }

    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    /// POST a multipart form; the form sets its own content type.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after it has been reported.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path).multipart(form)).await
    }

    // =========================================================================
    // INTERCEPTION
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.intercept(builder.send().await).await?;
        let bytes = response.bytes().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn intercept(&self, outcome: Result<Response, reqwest::Error>) -> Result<Response, ApiError> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, timeout = e.is_timeout(), "api request produced no response");
                let err = ApiError::Transport(e.to_string());
                self.report(&err);
                return Err(err);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let path = response.url().path().to_owned();
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), extract_detail(&body));
        tracing::warn!(status = status.as_u16(), %path, error = %err, "api request failed");
        self.report(&err);
        Err(err)
    }

    fn report(&self, err: &ApiError) {
        if let ApiError::AuthenticationExpired { .. } = err {
            self.tokens.invalidate();
            let current = self.navigator.current_path();
            if strip_location(&current) != LOGIN_PATH {
                self.notifier.notify(Notice::error(err.user_message()));
                self.navigator.force_navigate(LOGIN_PATH);
            }
            return;
        }
        self.notifier.notify(Notice::error(err.user_message()));
    }
}

/// Path portion of a location, without query or fragment.
fn strip_location(location: &str) -> &str {
    location.split(['?', '#']).next().unwrap_or(location)
}
