//! Error types for canvas, project and session operations.
//!
//! Every failure maps onto one [`ErrorKind`], which is what an embedding
//! application uses to pick between a warning and an error report.

use crate::LayerId;
use cyan_icc::IccError;
use cyan_io::IoError;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`CanvasError`].
pub type CanvasResult<T> = std::result::Result<T, CanvasError>;

/// Broad failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An image file could not be decoded.
    Decode,
    /// A profile was missing, unreadable or of the wrong colorspace.
    Profile,
    /// Pixels could not be transformed between profiles.
    ColorTransform,
    /// A layer id does not belong to the canvas.
    LayerNotFound,
    /// A structural rule was violated (last layer, bad project file, ...).
    Structure,
    /// Filesystem failure.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Decode => "decode",
            ErrorKind::Profile => "profile",
            ErrorKind::ColorTransform => "color transform",
            ErrorKind::LayerNotFound => "layer not found",
            ErrorKind::Structure => "structure",
            ErrorKind::Io => "I/O",
        })
    }
}

/// Canvas error.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Codec failure while reading or writing an image.
    #[error(transparent)]
    Codec(#[from] IoError),

    /// Profile failure outside of a pixel transform.
    #[error(transparent)]
    Profile(#[from] IccError),

    /// Pixel transform failure.
    #[error("color transform failed: {0}")]
    ColorTransform(String),

    /// No layer with this id.
    #[error("layer {0} not found")]
    LayerNotFound(LayerId),

    /// The only remaining layer cannot be removed.
    #[error("cannot remove the last layer of a canvas")]
    LastLayer,

    /// Stacking position out of range.
    #[error("position {position} out of range for {len} layers")]
    InvalidPosition {
        /// Requested position.
        position: usize,
        /// Number of layers.
        len: usize,
    },

    /// Image does not fit the canvas.
    #[error("incompatible layer: {0}")]
    Incompatible(String),

    /// Malformed project file or invalid canvas description.
    #[error("invalid structure: {0}")]
    Structure(String),

    /// Settings could not be read or written.
    #[error("settings: {0}")]
    Settings(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CanvasError {
    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CanvasError::Codec(IoError::Io(_)) | CanvasError::Codec(IoError::EncodeError(_)) => {
                ErrorKind::Io
            }
            CanvasError::Codec(_) => ErrorKind::Decode,
            CanvasError::Profile(IccError::TransformFailed(_)) => ErrorKind::ColorTransform,
            CanvasError::Profile(IccError::Io(_)) => ErrorKind::Io,
            CanvasError::Profile(_) => ErrorKind::Profile,
            CanvasError::ColorTransform(_) => ErrorKind::ColorTransform,
            CanvasError::LayerNotFound(_) => ErrorKind::LayerNotFound,
            CanvasError::LastLayer
            | CanvasError::InvalidPosition { .. }
            | CanvasError::Incompatible(_)
            | CanvasError::Structure(_) => ErrorKind::Structure,
            CanvasError::Settings(_) | CanvasError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn structure(msg: impl Into<String>) -> Self {
        CanvasError::Structure(msg.into())
    }
}

impl From<cyan_core::CoreError> for CanvasError {
    fn from(e: cyan_core::CoreError) -> Self {
        CanvasError::Structure(e.to_string())
    }
}

impl From<cyan_ops::OpsError> for CanvasError {
    fn from(e: cyan_ops::OpsError) -> Self {
        CanvasError::Incompatible(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(CanvasError::LastLayer.kind(), ErrorKind::Structure);
        assert_eq!(CanvasError::LayerNotFound(LayerId(3)).kind(), ErrorKind::LayerNotFound);
        assert_eq!(
            CanvasError::from(IoError::DecodeError("bad huffman".into())).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            CanvasError::from(IoError::Io(std::io::Error::other("disk"))).kind(),
            ErrorKind::Io
        );
        assert_eq!(
            CanvasError::from(IccError::MissingProfile("CMYK".into())).kind(),
            ErrorKind::Profile
        );
        assert_eq!(CanvasError::ColorTransform("x".into()).kind(), ErrorKind::ColorTransform);
    }

    #[test]
    fn test_display() {
        let err = CanvasError::InvalidPosition { position: 7, len: 2 };
        assert_eq!(err.to_string(), "position 7 out of range for 2 layers");
        assert_eq!(CanvasError::LayerNotFound(LayerId(4)).to_string(), "layer #4 not found");
    }
}
