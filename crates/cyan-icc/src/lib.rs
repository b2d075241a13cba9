//! # cyan-icc
//!
//! ICC color management for the Cyan layered canvas, built on Little CMS 2.
//!
//! # Features
//!
//! - [`ColorProfile`] - ICC bytes plus description, manufacturer, copyright
//!   and declared colorspace; identity is the byte content
//! - [`ProfileCache`] - shares profiles loaded from disk by content digest
//! - [`convert_image`] - pixel conversion between profiles with a rendering
//!   intent and optional black-point compensation; alpha is never touched
//! - [`ProfileCatalog`] - scans the well-known profile directories
//! - [`edit_profile`] - rewrites the description and copyright tags
//! - [`ColorSettings`] - default profiles, intent and black-point flag
//!
//! # Example
//!
//! ```rust,no_run
//! use cyan_core::{Colorspace, ImageData, SampleFormat};
//! use cyan_icc::{ColorProfile, Intent, convert_image};
//!
//! let image = ImageData::filled(8, 8, Colorspace::Rgb, true, SampleFormat::U8, &[0.5, 0.3, 0.2, 1.0]).unwrap();
//! let gray = ColorProfile::gray(2.2).unwrap();
//! let converted = convert_image(&image, None, &gray, Intent::Perceptual, true).unwrap();
//! assert_eq!(converted.colorspace, Colorspace::Gray);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod catalog;
mod error;
mod profile;
mod settings;
mod transform;

pub use cache::ProfileCache;
pub use catalog::{ProfileCatalog, ProfileEntry, ProfileScan, default_profile, edit_profile};
pub use error::{IccError, IccResult};
pub use profile::{ColorProfile, ProfileColorspace, ProfileInfo, describe_file, describe_profile};
pub use settings::ColorSettings;
pub use transform::convert_image;

use std::fmt;
use std::str::FromStr;

/// Rendering intent for color transformations.
///
/// Determines how out-of-gamut colors are handled during conversion. The
/// integer codes are the ones persisted in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Intent {
    /// No explicit choice; resolved to perceptual by the engine.
    Undefined = 0,

    /// Maintains saturation at the expense of accuracy.
    ///
    /// Best for business graphics where vivid colors are more important
    /// than exact color matching.
    Saturation = 1,

    /// Compresses the entire source gamut to fit within the destination.
    ///
    /// Best for photographic images.
    #[default]
    Perceptual = 2,

    /// Keeps in-gamut colors exact without white point adaptation.
    ///
    /// Best for spot color matching.
    Absolute = 3,

    /// Keeps in-gamut colors exact, mapping source white to destination white.
    ///
    /// Best for proofing.
    Relative = 4,
}

impl Intent {
    /// All intents in menu order.
    pub const ALL: [Intent; 5] = [
        Intent::Undefined,
        Intent::Saturation,
        Intent::Perceptual,
        Intent::Absolute,
        Intent::Relative,
    ];

    /// Integer code used in settings.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up an intent by its settings code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Intent::Undefined),
            1 => Some(Intent::Saturation),
            2 => Some(Intent::Perceptual),
            3 => Some(Intent::Absolute),
            4 => Some(Intent::Relative),
            _ => None,
        }
    }
}

impl From<Intent> for u8 {
    fn from(intent: Intent) -> Self {
        intent.code()
    }
}

impl TryFrom<u8> for Intent {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Intent::from_code(code).ok_or_else(|| format!("unknown rendering intent code {code}"))
    }
}

impl From<Intent> for lcms2::Intent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Undefined | Intent::Perceptual => lcms2::Intent::Perceptual,
            Intent::Saturation => lcms2::Intent::Saturation,
            Intent::Absolute => lcms2::Intent::AbsoluteColorimetric,
            Intent::Relative => lcms2::Intent::RelativeColorimetric,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Undefined => "Undefined",
            Intent::Saturation => "Saturation",
            Intent::Perceptual => "Perceptual",
            Intent::Absolute => "Absolute",
            Intent::Relative => "Relative",
        };
        f.write_str(name)
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "undefined" => Ok(Intent::Undefined),
            "saturation" => Ok(Intent::Saturation),
            "perceptual" => Ok(Intent::Perceptual),
            "absolute" | "absolute-colorimetric" => Ok(Intent::Absolute),
            "relative" | "relative-colorimetric" => Ok(Intent::Relative),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(Intent::from_code)
                .ok_or_else(|| format!("unknown rendering intent: {s}")),
        }
    }
}
