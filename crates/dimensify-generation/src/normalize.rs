//! Classification of transport failures into [`GenerationError`]

use serde_json::Value;

use crate::error::{
    AUTHENTICATION_MESSAGE, AUTHORIZATION_MESSAGE, BACKEND_FALLBACK_MESSAGE, CONNECTIVITY_MESSAGE,
    GenerationError, RATE_LIMIT_MESSAGE,
};

/// A failure observed while talking to a backend, before classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure<'a> {
    /// No credential configured; the call was never made
    MissingCredential,
    /// The backend answered with a non-success status
    Status { status: u16, body: &'a [u8] },
    /// The request went out but no response came back
    NoResponse,
    /// Anything else
    Unexpected,
}

/// Map a transport failure to exactly one classified error
///
/// Pure: no logging, no retries.
pub fn classify(failure: TransportFailure<'_>) -> GenerationError {
    match failure {
        TransportFailure::MissingCredential => GenerationError::missing_credential(),
        TransportFailure::Status { status: 401, .. } => {
            GenerationError::Authentication(AUTHENTICATION_MESSAGE.to_string())
        }
        TransportFailure::Status { status: 403, .. } => {
            GenerationError::Authorization(AUTHORIZATION_MESSAGE.to_string())
        }
        TransportFailure::Status { status: 429, .. } => GenerationError::RateLimit(RATE_LIMIT_MESSAGE.to_string()),
        TransportFailure::Status { body, .. } => GenerationError::Backend(
            error_field(body).unwrap_or_else(|| BACKEND_FALLBACK_MESSAGE.to_string()),
        ),
        TransportFailure::NoResponse => GenerationError::Connectivity(CONNECTIVITY_MESSAGE.to_string()),
        TransportFailure::Unexpected => GenerationError::unexpected(),
    }
}

/// Failure raised by `RequestBuilder::send`
///
/// Redirect failures had a response, so they are not connectivity problems.
pub(crate) fn send_failure(error: &reqwest::Error) -> TransportFailure<'static> {
    if error.is_builder() || error.is_redirect() {
        TransportFailure::Unexpected
    } else {
        TransportFailure::NoResponse
    }
}

/// Failure raised while reading a response body
pub(crate) fn body_failure(error: &reqwest::Error) -> TransportFailure<'static> {
    if error.is_timeout() || error.is_connect() {
        TransportFailure::NoResponse
    } else {
        TransportFailure::Unexpected
    }
}

/// Pull the `error` field out of a JSON error body
///
/// Accepts `{"error": "text"}` and `{"error": {"message": "text"}}`.
fn error_field(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let message = match value.get("error")? {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj.get("message")?.as_str()?.to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };

    (!message.trim().is_empty()).then_some(message)
}
