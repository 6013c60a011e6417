/*
[INPUT]:  Error sources (HTTP, backend API, serialization, storage, wallet SDK)
[OUTPUT]: Structured error types with status and detail helpers
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Surv client
#[derive(Error, Debug)]
pub enum SurvError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status
    #[error("API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    /// Backend returned 401; stored credentials have been cleared
    #[error("Session is no longer authorized, please sign in again")]
    Unauthorized,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Local storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The wallet SDK reported a failure
    #[error("Wallet SDK error: {0}")]
    Sdk(String),

    /// An adapter method was called before `initialize`
    #[error("Lemma SDK is not initialized")]
    NotInitialized,

    /// Lemma is not configured on the backend
    #[error("Authentication system not configured")]
    NotConfigured,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Required form field missing
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Waited too long for an external signal
    #[error("Timed out after {duration_ms}ms waiting for {what}")]
    Timeout { what: String, duration_ms: u64 },
}

impl SurvError {
    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SurvError::Unauthorized)
            || matches!(self, SurvError::Api { status, .. } if *status == 403)
    }

    /// Backend does not know the requested resource (or identity)
    pub fn is_not_found(&self) -> bool {
        matches!(self, SurvError::Api { status, .. } if *status == 404)
    }

    /// Backend `detail` text when the error came from an API response
    pub fn detail(&self) -> Option<&str> {
        match self {
            SurvError::Api { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Create an API error from status code and detail message
    pub fn api_error(status: StatusCode, detail: impl Into<String>) -> Self {
        SurvError::Api {
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    pub(crate) fn sdk(err: impl std::fmt::Display) -> Self {
        SurvError::Sdk(err.to_string())
    }
}

/// Extract the user-facing message from a FastAPI error body.
///
/// `detail` is either a plain string or a list of validation entries with a
/// `msg` field. Anything else falls back to the raw body.
pub(crate) fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

/// Result type alias for Surv operations
pub type Result<T> = std::result::Result<T, SurvError>;
