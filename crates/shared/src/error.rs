//! Shared error types including RFC7807 Problem Details.

use serde::{Deserialize, Serialize};

/// RFC7807 Problem Details (application/problem+json)
///
/// The development backend answers every failed `/api/*` call with this
/// envelope so clients can show the reason instead of failing to decode a
/// success type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    fn new(slug: &str, title: &str, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_url: format!("https://wiredesk.dev/problems/{slug}"),
            title: title.to_string(),
            status,
            detail: Some(detail.into()),
            instance: None,
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new("unauthorized", "Unauthorized", 401, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new("validation", "Validation error", 422, detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new("internal-error", "Internal Server Error", 500, detail)
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

/// FastAPI-style bodies: `{"detail": ".."}` or `{"error": ".."}`.
#[derive(Deserialize)]
struct LooseError {
    detail: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

/// Attempt to parse an error body into a user-facing message.
/// Prefers problem `detail`, then `title`, then a bare `detail`/`error` string.
pub fn try_problem_detail(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ProblemDetails>(body) {
        if let Some(detail) = parsed.detail {
            if !detail.trim().is_empty() {
                return Some(detail);
            }
        }
        if !parsed.title.trim().is_empty() {
            return Some(parsed.title);
        }
    }
    let loose = serde_json::from_str::<LooseError>(body).ok()?;
    [loose.detail, loose.error]
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            ApiError::Deserialize(_) => "The server sent an unexpected response.".to_string(),
            ApiError::Http { status, body } => {
                try_problem_detail(body).unwrap_or_else(|| match status {
                    401 => "Your session has expired. Please sign in again.".to_string(),
                    403 => "You do not have permission to do that.".to_string(),
                    404 => "The requested record was not found.".to_string(),
                    400 | 422 => "The request was rejected as invalid.".to_string(),
                    500..=599 => "The server encountered an error. Please try again.".to_string(),
                    _ => format!("Request failed with status {status}."),
                })
            }
        }
    }
}
