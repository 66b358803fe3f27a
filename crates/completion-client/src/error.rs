//! Error types for completion-client

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a completion service call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// API key missing, rejected, or lacking permission
    #[error("completion service rejected credentials: {0}")]
    Authentication(String),

    /// Too many requests; `retry_after_secs` comes from the `Retry-After` header
    #[error("completion service rate limit exceeded (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The call did not finish within the configured timeout
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or DNS failure
    #[error("completion transport error: {0}")]
    Transport(String),

    /// Any other non-success status
    #[error("completion service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Body was not the expected JSON shape
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// Request could not be built from the supplied configuration
    #[error("invalid completion request: {0}")]
    InvalidRequest(String),
}

impl CompletionError {
    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::RateLimited { .. }
            | CompletionError::Timeout(_)
            | CompletionError::Transport(_) => true,
            CompletionError::Http { status, .. } => *status >= 500,
            CompletionError::Authentication(_)
            | CompletionError::MalformedResponse(_)
            | CompletionError::InvalidRequest(_) => false,
        }
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::MalformedResponse(err.to_string())
    }
}
