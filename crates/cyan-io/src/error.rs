//! Error types for codec operations.

use std::io;
use thiserror::Error;

/// Codec error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported or unrecognized format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt or unreadable image data.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Unsupported pixel layout or bit depth.
    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    /// Decoding would exceed the configured memory ceiling.
    #[error("image needs {needed} bytes, limit is {limit}")]
    LimitExceeded {
        /// Bytes the decoded image would occupy.
        needed: u64,
        /// Configured ceiling.
        limit: u64,
    },
}

/// Result type for codec operations.
pub type IoResult<T> = Result<T, IoError>;

impl From<cyan_core::CoreError> for IoError {
    fn from(e: cyan_core::CoreError) -> Self {
        IoError::DecodeError(e.to_string())
    }
}
