//! Application configuration resolved from environment variables.
//!
//! DESIGN
//! ======
//! Every recognized option has a hardcoded fallback, so resolution never
//! fails: absent or malformed values fall back to the default, and an
//! unrecognized `CLASSHUB_MODE` is logged before falling back.
//! `from_lookup` takes the variable source as a closure so callers (and
//! tests) can resolve without touching the process environment.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_APP_TITLE: &str = "Class Community";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_UPLOAD_TYPES: [&str; 5] = ["image/jpeg", "image/png", "image/gif", "video/mp4", "video/mov"];

/// Build mode, the native stand-in for the bundler's dev/prod flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

/// Default list paging shown by views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: u32,
    pub page_sizes: Vec<u32>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, page_sizes: PAGE_SIZES.to_vec() }
    }
}

impl Pagination {
    #[must_use]
    pub fn is_allowed(&self, size: u32) -> bool {
        self.page_sizes.contains(&size)
    }
}

/// Why a candidate upload was refused before it reached the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejected {
    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("file type {0} is not allowed")]
    UnsupportedType(String),
}

/// Upload constraints for media files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum file size in bytes.
    pub max_size: u64,
    /// Accepted MIME types.
    pub allowed_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_size: MAX_UPLOAD_BYTES,
            allowed_types: ALLOWED_UPLOAD_TYPES.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

impl UploadLimits {
    /// Check a file of `size` bytes and MIME type `mime` against the limits.
    ///
    /// # Errors
    ///
    /// Returns the first violated limit, type before size.
    pub fn check(&self, size: u64, mime: &str) -> Result<(), UploadRejected> {
        if !self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(mime)) {
            return Err(UploadRejected::UnsupportedType(mime.to_owned()));
        }
        if size > self.max_size {
            return Err(UploadRejected::TooLarge { size, max: self.max_size });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL without a trailing slash, e.g. `http://host/api`.
    pub api_base_url: String,
    pub app_title: String,
    pub app_version: String,
    pub mode: Mode,
    pub request_timeout: Duration,
    pub pagination: Pagination,
    pub upload: UploadLimits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            app_title: DEFAULT_APP_TITLE.to_owned(),
            app_version: env!("CARGO_PKG_VERSION").to_owned(),
            mode: Mode::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            pagination: Pagination::default(),
            upload: UploadLimits::default(),
        }
    }
}

impl AppConfig {
    /// Build config from process environment variables.
    ///
    /// Optional:
    /// - `CLASSHUB_API_BASE_URL`: backend base URL
    /// - `CLASSHUB_APP_TITLE`: display title
    /// - `CLASSHUB_MODE`: `development` (default) or `production`
    /// - `CLASSHUB_REQUEST_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source. Empty values count as absent.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env_url = var("CLASSHUB_API_BASE_URL");
        let api_base_url = env_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let app_title = var("CLASSHUB_APP_TITLE").unwrap_or_else(|| DEFAULT_APP_TITLE.to_owned());
        let mode = parse_mode(var("CLASSHUB_MODE").as_deref());
        let timeout_secs = var("CLASSHUB_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        tracing::info!(
            env_value = env_url.as_deref().unwrap_or("<unset>"),
            fallback = DEFAULT_API_BASE_URL,
            resolved = %api_base_url,
            "api base url configured"
        );
        tracing::debug!(%app_title, ?mode, timeout_secs, "app config resolved");

        Self {
            api_base_url,
            app_title,
            mode,
            request_timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }
}

fn parse_mode(raw: Option<&str>) -> Mode {
    match raw.unwrap_or("development") {
        "development" | "dev" => Mode::Development,
        "production" | "prod" => Mode::Production,
        other => {
            tracing::warn!(value = other, "unknown CLASSHUB_MODE; using development");
            Mode::Development
        }
    }
}
