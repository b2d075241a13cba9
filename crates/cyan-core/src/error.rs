//! Error types for cyan-core operations.
//!
//! Buffer construction is the only fallible thing in this crate: a sample
//! vector has to match the declared geometry exactly.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised while building or reshaping image buffers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid image dimensions.
    ///
    /// Returned when width or height is zero, or the sample count would
    /// overflow `usize`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Sample buffer length does not match `width * height * channels`.
    #[error("buffer size mismatch: expected {expected} samples, got {got}")]
    BufferSize {
        /// Expected sample count
        expected: usize,
        /// Actual sample count
        got: usize,
    },

    /// Unknown colorspace name.
    #[error("unknown colorspace: {0}")]
    UnknownColorspace(String),
}

impl CoreError {
    /// Creates a [`CoreError::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::BufferSize {
            expected: 12,
            got: 9,
        };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains("9"));

        let err = CoreError::invalid_dimensions(0, 10, "zero width");
        assert!(err.to_string().contains("0x10"));
    }
}
