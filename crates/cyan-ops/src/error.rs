//! Error types for compositing.

use thiserror::Error;

/// Error type for compositing operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Layer and surface are in different colorspaces.
    #[error("colorspace mismatch: surface is {surface}, layer is {layer}")]
    ColorspaceMismatch {
        /// Surface colorspace.
        surface: String,
        /// Layer colorspace.
        layer: String,
    },

    /// Unknown composite operator name or id.
    #[error("unknown composite operator: {0}")]
    UnknownOperator(String),

    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Result type for compositing operations.
pub type OpsResult<T> = Result<T, OpsError>;
