//! Persistence error types.

use thiserror::Error;

/// Errors raised while saving or loading documents.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The API base URL is invalid.
    #[error("invalid document API URL: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, status).
    #[error("document API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload could not be encoded or decoded.
    #[error("failed to parse document payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem access failed.
    #[error("document file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The store answered but refused the save.
    #[error("save rejected: {0}")]
    Rejected(String),

    /// No document exists under the id.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The response did not have the expected shape.
    #[error("unexpected document API response: {0}")]
    UnexpectedResponse(String),
}

impl PersistenceError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // No status means the request never completed.
            Self::Http(e) => match e.status() {
                Some(status) => status.is_server_error(),
                None => true,
            },
            _ => false,
        }
    }
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_http_errors_are_final() {
        assert!(!PersistenceError::Rejected("quota".into()).is_retryable());
        assert!(!PersistenceError::NotFound("doc".into()).is_retryable());
        assert!(!PersistenceError::InvalidUrl("x".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = PersistenceError::Rejected("read-only".into());
        assert_eq!(err.to_string(), "save rejected: read-only");
    }
}
