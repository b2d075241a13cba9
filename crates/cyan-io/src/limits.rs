//! Decode resource ceilings.

use crate::{IoError, IoResult};

const GIB: u64 = 1024 * 1024 * 1024;

/// Memory ceiling applied before pixel data is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeLimits {
    /// Maximum decoded buffer size in bytes; `None` is unlimited.
    pub max_bytes: Option<u64>,
}

impl DecodeLimits {
    /// No ceiling.
    pub const fn unlimited() -> Self {
        Self { max_bytes: None }
    }

    /// Ceiling in GiB; zero means unlimited.
    pub const fn from_gib(gib: u32) -> Self {
        if gib == 0 {
            Self::unlimited()
        } else {
            Self {
                max_bytes: Some(gib as u64 * GIB),
            }
        }
    }

    /// Fails when a `width` x `height` image with `channels` samples of
    /// `bytes_per_sample` each would not fit.
    pub fn check(&self, width: u32, height: u32, channels: u32, bytes_per_sample: usize) -> IoResult<()> {
        let Some(limit) = self.max_bytes else {
            return Ok(());
        };
        let needed = (width as u64)
            .saturating_mul(height as u64)
            .saturating_mul(channels as u64)
            .saturating_mul(bytes_per_sample as u64);
        if needed > limit {
            tracing::warn!(width, height, needed, limit, "decode refused by memory limit");
            return Err(IoError::LimitExceeded { needed, limit });
        }
        Ok(())
    }
}
