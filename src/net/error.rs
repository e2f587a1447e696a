//! Error taxonomy for backend calls.
//!
//! ERROR HANDLING
//! ==============
//! Every failed call becomes exactly one `ApiError`. The HTTP wrapper turns
//! it into a user-visible notice once; callers still receive the error and
//! decide whether to add their own contextual message.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

pub const MSG_SESSION_EXPIRED: &str = "Your session has expired, please log in again";
pub const MSG_PERMISSION_DENIED: &str = "Permission denied";
pub const MSG_NOT_FOUND: &str = "The requested resource does not exist";
pub const MSG_SERVER_ERROR: &str = "Server error, please try again later";
pub const MSG_REQUEST_FAILED: &str = "Request failed";

/// Errors produced by REST calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401: the bearer token is missing, expired, or rejected.
    #[error("authentication expired")]
    AuthenticationExpired { detail: Option<String> },

    /// 403.
    #[error("permission denied")]
    PermissionDenied { detail: Option<String> },

    /// 404.
    #[error("resource not found")]
    NotFound { detail: Option<String> },

    /// 5xx.
    #[error("server error: status {status}")]
    ServerError { status: u16, detail: Option<String> },

    /// Any other non-success status (400, 409, 422, ...).
    #[error("request failed: status {status}")]
    RequestFailed { status: u16, detail: Option<String> },

    /// The request never produced a response (connect failure, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// A success response carried a body that did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The HTTP client or a request part could not be constructed.
    #[error("http client build failed: {0}")]
    Build(String),
}

impl ApiError {
    /// Classify a non-success status together with its backend detail.
    #[must_use]
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            401 => Self::AuthenticationExpired { detail },
            403 => Self::PermissionDenied { detail },
            404 => Self::NotFound { detail },
            500..=599 => Self::ServerError { status, detail },
            _ => Self::RequestFailed { status, detail },
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationExpired { .. } => Some(401),
            Self::PermissionDenied { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::ServerError { status, .. } | Self::RequestFailed { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) | Self::Build(_) => None,
        }
    }

    /// Backend-provided `detail` message, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::AuthenticationExpired { detail }
            | Self::PermissionDenied { detail }
            | Self::NotFound { detail }
            | Self::ServerError { detail, .. }
            | Self::RequestFailed { detail, .. } => detail.as_deref(),
            Self::Transport(_) | Self::Decode(_) | Self::Build(_) => None,
        }
    }

    /// Message shown to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationExpired { .. } => MSG_SESSION_EXPIRED.to_owned(),
            Self::PermissionDenied { .. } => MSG_PERMISSION_DENIED.to_owned(),
            Self::NotFound { .. } => MSG_NOT_FOUND.to_owned(),
            Self::ServerError { .. } => MSG_SERVER_ERROR.to_owned(),
            Self::RequestFailed { detail, .. } => detail.clone().unwrap_or_else(|| MSG_REQUEST_FAILED.to_owned()),
            Self::Transport(_) | Self::Decode(_) | Self::Build(_) => MSG_REQUEST_FAILED.to_owned(),
        }
    }
}

/// Extract the backend's `detail` from an error body.
///
/// A string detail is returned verbatim; a validation list yields the first
/// entry's `msg`. Anything else (including non-JSON bodies) yields `None`.
#[must_use]
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|item| item.get("msg")?.as_str().map(str::to_owned)),
        _ => None,
    }
}
