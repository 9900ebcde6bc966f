//! Error types for path resolution and dispatch.

use thiserror::Error;

/// Result type alias using DispatchError.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Primary error type for resolution and dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No metadata level produced a matching rule for the path.
    #[error("Unrecognised path: {0}")]
    UnrecognizedPath(String),

    /// A matched rule names an operation that is not in the registry.
    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    #[error("Invalid path template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Invalid metadata in '{path}': {message}")]
    InvalidMetadata { path: String, message: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Failed to read metadata: {0}")]
    Io(#[from] std::io::Error),

    /// Failure propagated unchanged from a dispatched operation.
    #[error("{0}")]
    Operation(#[from] anyhow::Error),
}
