//! Working colorspaces.
//!
//! A canvas and every layer in it live in exactly one of three device
//! colorspaces. The colorspace decides the color channel count; alpha is
//! tracked separately on [`crate::ImageData`].

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device colorspace of an image or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colorspace {
    /// Additive red, green, blue.
    #[default]
    Rgb,
    /// Subtractive cyan, magenta, yellow, key.
    Cmyk,
    /// Single luminance channel.
    Gray,
}

impl Colorspace {
    /// All colorspaces, in menu order.
    pub const ALL: [Colorspace; 3] = [Colorspace::Rgb, Colorspace::Cmyk, Colorspace::Gray];

    /// Number of color channels (alpha excluded).
    #[inline]
    pub const fn color_channels(self) -> u32 {
        match self {
            Colorspace::Rgb => 3,
            Colorspace::Cmyk => 4,
            Colorspace::Gray => 1,
        }
    }

    /// Short lowercase name, also used in settings keys (`rgb_profile`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Colorspace::Rgb => "rgb",
            Colorspace::Cmyk => "cmyk",
            Colorspace::Gray => "gray",
        }
    }

    /// True for subtractive (ink) colorspaces.
    #[inline]
    pub const fn is_subtractive(self) -> bool {
        matches!(self, Colorspace::Cmyk)
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Colorspace::Rgb => "RGB",
            Colorspace::Cmyk => "CMYK",
            Colorspace::Gray => "GRAY",
        };
        f.write_str(label)
    }
}

impl FromStr for Colorspace {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" | "srgb" => Ok(Colorspace::Rgb),
            "cmyk" => Ok(Colorspace::Cmyk),
            "gray" | "grey" | "grayscale" => Ok(Colorspace::Gray),
            other => Err(CoreError::UnknownColorspace(other.to_string())),
        }
    }
}
