//! Error types for fblur-core operations.
//!
//! # Usage
//!
//! ```rust
//! use fblur_core::{Error, RgbImage};
//!
//! let err = RgbImage::from_raw(2, 2, vec![0; 5]).unwrap_err();
//! assert!(matches!(err, Error::BufferSize { expected: 12, got: 5 }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when wrapping a raw pixel buffer.
#[derive(Debug, Error)]
pub enum Error {
    /// The dimensions cannot describe a buffer in memory.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Raw pixel buffer has the wrong length for the given dimensions.
    #[error("buffer size mismatch: expected {expected} bytes, got {got}")]
    BufferSize {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}
