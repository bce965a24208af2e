//! Error types for builder operations.

use thiserror::Error;

use crate::ElementType;

/// Result type for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Errors that can occur in builder operations.
///
/// Addressing an element that does not exist is not an error anywhere in the
/// builder; those paths return `None` instead.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Creation requested with an element type outside the supported set.
    #[error("Invalid element type: {0}")]
    InvalidType(String),

    /// A property key that is not part of the element type's schema.
    #[error("Property '{key}' is not defined for {element_type} elements")]
    UnknownProperty {
        /// Type of the element being edited.
        element_type: ElementType,
        /// The rejected key.
        key: String,
    },

    /// A property value with the wrong shape for its key.
    #[error("Invalid value for property '{key}': expected {expected}")]
    InvalidPropertyValue {
        /// The property key.
        key: String,
        /// Human readable description of the accepted values.
        expected: &'static str,
    },

    /// Snapshot serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
