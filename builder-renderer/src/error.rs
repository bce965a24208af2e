//! Renderer error types.

use builder_core::BuilderError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Snapshot serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A drag update or drop arrived with no drag in progress.
    #[error("No drag in progress")]
    NoDragInProgress,

    /// A gesture was rejected by the editor session.
    #[error(transparent)]
    Builder(#[from] BuilderError),
}
