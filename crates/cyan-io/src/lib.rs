//! # cyan-io
//!
//! Codec collaborator for the Cyan layered canvas.
//!
//! Decodes files into [`cyan_core::ImageData`] with the embedded ICC profile
//! attached, and encodes images back to bytes. The decode ceiling from
//! [`DecodeLimits`] is checked from the header, before any pixel buffer is
//! allocated.
//!
//! # Supported Formats
//!
//! | Format | Read | Write | ICC | Feature |
//! |--------|------|-------|-----|---------|
//! | PNG    | gray/RGB ±alpha, 8/16-bit | same | read | `png` |
//! | JPEG   | gray/RGB/CMYK | gray/RGB/CMYK | read/write | `jpeg` |
//! | TIFF   | gray/RGB/CMYK, 8/16-bit, float RGB | same | read/write | `tiff` |
//!
//! # Example
//!
//! ```rust,no_run
//! use cyan_io::{DecodeLimits, Format};
//!
//! let image = cyan_io::decode("photo.jpg", &DecodeLimits::from_gib(8)).unwrap();
//! let bytes = cyan_io::encode(&image, Format::Tiff).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
mod limits;

#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "tiff")]
pub mod tiff;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use limits::DecodeLimits;

use cyan_core::ImageData;
use std::path::Path;

/// Decodes an image file.
///
/// The format is detected from magic bytes, then the extension. The label
/// of the result is the file stem.
pub fn decode<P: AsRef<Path>>(path: P, limits: &DecodeLimits) -> IoResult<ImageData> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let format = Format::sniff(&bytes, path);
    let mut image = decode_bytes(&bytes, format, limits)?;
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        image.label = Some(stem.to_string());
    }
    tracing::debug!(
        path = %path.display(),
        %format,
        width = image.width,
        height = image.height,
        colorspace = %image.colorspace,
        icc = image.icc_profile.is_some(),
        "decoded"
    );
    Ok(image)
}

/// Decodes in-memory bytes of a known format.
pub fn decode_bytes(bytes: &[u8], format: Format, limits: &DecodeLimits) -> IoResult<ImageData> {
    match format {
        #[cfg(feature = "png")]
        Format::Png => png::decode(bytes, limits),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::decode(bytes, limits),
        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::decode(bytes, limits),
        other => {
            let _ = (bytes, limits);
            Err(IoError::UnsupportedFormat(other.to_string()))
        }
    }
}

/// Encodes an image to bytes.
pub fn encode(image: &ImageData, format: Format) -> IoResult<Vec<u8>> {
    match format {
        #[cfg(feature = "png")]
        Format::Png => png::encode(image),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::encode(image),
        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::encode(image),
        other => {
            let _ = image;
            Err(IoError::UnsupportedFormat(other.to_string()))
        }
    }
}

/// Encodes an image and writes it to `path`, format from the extension.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageData) -> IoResult<Format> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    let bytes = encode(image, format)?;
    std::fs::write(path, bytes)?;
    Ok(format)
}
