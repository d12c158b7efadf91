//! LLM Module
//!
//! The external calls behind the invokers: provider traits for chat and
//! image generation, and an OpenAI-compatible HTTP client.

mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::invoker::{is_retryable, is_retryable_status, RetryableError};
use crate::models::{ChatRequest, ChatResponse, ImageRequest};

pub use openai::OpenAiCompatClient;

/// Failure of a single LLM call.
///
/// Display strings lead with the HTTP status code and reason phrase. Retry
/// classification uses the status itself and never the upstream body.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Request could not be sent or the connection failed
    #[error("LLM request failed: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("LLM request timeout: {0}")]
    Timeout(String),

    /// Upstream answered with a non-success status
    #[error("LLM invoke failed: {status} {reason}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// Upstream answered 2xx with an unusable body
    #[error("Failed to parse LLM response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_decode() {
            LlmError::Decode(e.to_string())
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

impl RetryableError for LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Status { status, .. } => is_retryable_status(*status),
            LlmError::Timeout(_) => true,
            LlmError::Transport(message) => is_retryable(message),
            LlmError::Decode(_) => false,
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Produces one assistant answer for the conversation in `request`.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;
}

/// An image generation backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates one image for `request` and returns its URL.
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = LlmError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
            body: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "LLM invoke failed: 503 Service Unavailable: overloaded"
        );
        assert!(err.is_retryable());
    }

    fn status(status: u16, reason: &str, body: &str) -> LlmError {
        LlmError::Status {
            status,
            reason: reason.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_client_errors_are_terminal() {
        assert!(!status(401, "Unauthorized", "invalid key").is_retryable());
        assert!(!LlmError::Decode("missing choices".to_string()).is_retryable());
    }

    #[test]
    fn test_client_error_body_is_not_classified() {
        let err = status(400, "Bad Request", "messages: at most 500 items, retry later");
        assert!(!err.is_retryable());

        let err = status(401, "Unauthorized", r#"{"request_id": "req_4291", "error": "timeout"}"#);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_every_server_error_is_retryable() {
        for code in [500, 501, 502, 503, 504, 520, 529] {
            assert!(status(code, "Whatever", "overloaded").is_retryable(), "{code}");
        }
        assert!(status(429, "Too Many Requests", "").is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        assert!(LlmError::Timeout("operation timed out".to_string()).is_retryable());
    }

    #[test]
    fn test_transport_falls_back_to_message() {
        assert!(LlmError::Transport("connection timed out".to_string()).is_retryable());
        assert!(!LlmError::Transport("invalid URL".to_string()).is_retryable());
    }
}
