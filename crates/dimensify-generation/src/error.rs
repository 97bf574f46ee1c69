use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

pub(crate) const MISSING_CREDENTIAL_MESSAGE: &str =
    "API token not configured. Please check your environment variables.";
pub(crate) const AUTHENTICATION_MESSAGE: &str = "Invalid API token. Please check your credentials.";
pub(crate) const AUTHORIZATION_MESSAGE: &str = "Access forbidden. Please check your API permissions.";
pub(crate) const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub(crate) const BACKEND_FALLBACK_MESSAGE: &str = "Unknown error occurred";
pub(crate) const JOB_FAILED_FALLBACK_MESSAGE: &str = "Generation failed. Please try again.";
pub(crate) const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the API. Please check your internet connection.";
pub(crate) const TIMEOUT_MESSAGE: &str = "Generation timed out. Please try again.";
pub(crate) const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Closed set of failure categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter)]
pub enum ErrorKind {
    /// Local precondition failed; no network call was attempted
    #[strum(serialize = "configuration_error")]
    Configuration,
    /// Backend rejected the credential (HTTP 401)
    #[strum(serialize = "authentication_error")]
    Authentication,
    /// Credential lacks permission (HTTP 403)
    #[strum(serialize = "authorization_error")]
    Authorization,
    /// Backend throttled the request (HTTP 429)
    #[strum(serialize = "rate_limit_error")]
    RateLimit,
    /// Backend ran and reported failure, or answered with another status
    #[strum(serialize = "backend_error")]
    Backend,
    /// No response reached the caller
    #[strum(serialize = "connectivity_error")]
    Connectivity,
    /// Async job did not finish within the poll ceiling
    #[strum(serialize = "timeout_error")]
    Timeout,
    /// Anything that fits no other category
    #[strum(serialize = "unknown_error")]
    Unknown,
}

/// A classified generation failure carrying a user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    RateLimit(String),

    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Connectivity(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Unknown(String),
}

impl GenerationError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::RateLimit(_) => ErrorKind::RateLimit,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Connectivity(_) => ErrorKind::Connectivity,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(m)
            | Self::Authentication(m)
            | Self::Authorization(m)
            | Self::RateLimit(m)
            | Self::Backend(m)
            | Self::Connectivity(m)
            | Self::Timeout(m)
            | Self::Unknown(m) => m,
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Backend | ErrorKind::Connectivity => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Configuration | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn missing_credential() -> Self {
        Self::Configuration(MISSING_CREDENTIAL_MESSAGE.to_string())
    }

    pub(crate) fn timed_out() -> Self {
        Self::Timeout(TIMEOUT_MESSAGE.to_string())
    }

    /// Backend reported a failed job, with or without detail
    pub(crate) fn job_failed(detail: Option<String>) -> Self {
        let message = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| JOB_FAILED_FALLBACK_MESSAGE.to_string());
        Self::Backend(message)
    }

    pub(crate) fn unexpected() -> Self {
        Self::Unknown(UNEXPECTED_MESSAGE.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: ErrorDetails<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetails<'a> {
    message: &'a str,
    r#type: &'a str,
    code: u16,
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let body = ErrorResponse {
            error: ErrorDetails {
                message: self.message(),
                r#type: kind.as_ref(),
                code: status.as_u16(),
            },
        };

        (status, Json(body)).into_response()
    }
}
