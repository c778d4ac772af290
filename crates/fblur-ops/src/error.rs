//! Error types for convolution operations.

use thiserror::Error;

/// Error type for convolution operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Images have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A field buffer could not be allocated.
    #[error("failed to allocate {requested} complex samples: {reason}")]
    AllocationFailed {
        /// Number of complex samples requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// The transform thread pool could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for convolution operations.
pub type OpsResult<T> = Result<T, OpsError>;
