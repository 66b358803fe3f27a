//! Error taxonomy for the compliance pipeline.

use completion_client::CompletionError;

/// Errors produced by review and record handling.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("completion service error: {0}")]
    Completion(#[from] CompletionError),

    #[error("semantic reviewer returned an unreadable verdict: {0}")]
    MalformedVerdict(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComplianceError {
    /// True when the review could not run, as opposed to bad input or storage.
    ///
    /// Operational errors are retryable outages, never compliance failures.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            ComplianceError::Completion(_) | ComplianceError::MalformedVerdict(_)
        )
    }

    /// Whether a later retry of the same review could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ComplianceError::Completion(e) => e.is_retryable(),
            ComplianceError::MalformedVerdict(_) => true,
            _ => false,
        }
    }
}

/// Result type for compliance operations.
pub type Result<T> = std::result::Result<T, ComplianceError>;

/// Errors from summarizing a single section.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("section has no prose after markup removal")]
    EmptyContent,

    #[error("completion service returned an empty summary")]
    EmptyResponse,

    #[error("completion service error: {0}")]
    Completion(#[from] CompletionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_failures_are_operational() {
        let err: ComplianceError = CompletionError::RateLimited {
            retry_after_secs: Some(1),
        }
        .into();
        assert!(err.is_operational());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("rate limit"));

        let err = ComplianceError::InvalidRecord("no name".to_string());
        assert!(!err.is_operational());
        assert!(!err.is_retryable());
    }

    #[test]
    fn auth_failure_is_operational_but_not_retryable() {
        let err: ComplianceError = CompletionError::Authentication("bad key".into()).into();
        assert!(err.is_operational());
        assert!(!err.is_retryable());
    }

    #[test]
    fn digest_mismatch_message() {
        let err = ComplianceError::DigestMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }
}
