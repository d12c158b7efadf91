//! Error types for the cache and invoker
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::llm::LlmError;
use crate::models::ErrorResponse;

// == Key Error ==
/// Failure to derive a cache key from a request.
#[derive(Error, Debug)]
pub enum KeyError {
    /// A request component could not be serialized
    #[error("Cache key serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// == Invoke Error ==
/// Failure of a single `invoke` call.
///
/// The upstream error is carried unchanged, whether it was terminal on the
/// first attempt or the last of several retryable failures.
#[derive(Debug)]
pub enum InvokeError<E> {
    /// The cache key could not be derived; no upstream call was made
    Key(KeyError),
    /// The external call failed
    Call(E),
}

impl<E> InvokeError<E> {
    /// Returns the upstream error, if that is what failed.
    pub fn into_call(self) -> Option<E> {
        match self {
            InvokeError::Call(e) => Some(e),
            InvokeError::Key(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for InvokeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::Key(e) => write!(f, "{}", e),
            InvokeError::Call(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for InvokeError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvokeError::Key(e) => Some(e),
            InvokeError::Call(e) => Some(e),
        }
    }
}

impl<E> From<KeyError> for InvokeError<E> {
    fn from(e: KeyError) -> Self {
        InvokeError::Key(e)
    }
}

// == Api Error ==
/// Error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No cache registered under the given name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    /// The LLM call failed after any retries
    #[error("{0}")]
    Upstream(#[from] LlmError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<InvokeError<LlmError>> for ApiError {
    fn from(e: InvokeError<LlmError>) -> Self {
        match e {
            InvokeError::Call(e) => ApiError::Upstream(e),
            InvokeError::Key(e) => ApiError::Internal(e.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownCache(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_error_displays_upstream_message_unchanged() {
        let err: InvokeError<String> = InvokeError::Call("503 Service Unavailable".to_string());
        assert_eq!(err.to_string(), "503 Service Unavailable");
        assert_eq!(err.into_call().as_deref(), Some("503 Service Unavailable"));
    }

    #[test]
    fn test_key_error_is_not_a_call_error() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: InvokeError<String> = KeyError::from(bad).into();
        assert!(err.to_string().starts_with("Cache key serialization failed"));
        assert!(err.into_call().is_none());
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::UnknownCache("x".into()), StatusCode::NOT_FOUND),
            (
                ApiError::Upstream(LlmError::Decode("x".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
