//! Error types for store operations.

use crate::value::Shape;
use thiserror::Error;

/// Error type returned by caller-supplied named handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown state key: {0}")]
    UnknownKey(String),

    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    #[error("Shape mismatch on `{key}`: expected {expected}, found {found}")]
    ShapeMismatch {
        key: String,
        expected: Shape,
        found: Shape,
    },

    #[error("Index {index} out of range for `{key}` (length {len})")]
    OutOfRange { key: String, index: usize, len: usize },

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Invalid initial state: {0}")]
    InvalidState(String),

    #[error("No store provided in the current scope")]
    MissingProvider,

    #[error("Handler `{name}` failed: {source}")]
    HandlerRejected {
        name: String,
        #[source]
        source: HandlerError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
