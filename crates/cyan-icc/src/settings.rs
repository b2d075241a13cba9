//! Color management preferences.

use crate::Intent;
use cyan_core::Colorspace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The `color` settings group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Default RGB profile path.
    pub rgb_profile: Option<PathBuf>,
    /// Default CMYK profile path.
    pub cmyk_profile: Option<PathBuf>,
    /// Default gray profile path.
    pub gray_profile: Option<PathBuf>,
    /// Default rendering intent, stored as its integer code.
    pub intent: Intent,
    /// Black-point compensation on conversions.
    pub blackpoint: bool,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            rgb_profile: None,
            cmyk_profile: None,
            gray_profile: None,
            intent: Intent::Perceptual,
            blackpoint: true,
        }
    }
}

impl ColorSettings {
    /// Configured default profile path for `cs`.
    pub fn profile_path(&self, cs: Colorspace) -> Option<&Path> {
        match cs {
            Colorspace::Rgb => self.rgb_profile.as_deref(),
            Colorspace::Cmyk => self.cmyk_profile.as_deref(),
            Colorspace::Gray => self.gray_profile.as_deref(),
        }
    }

    /// Sets (or clears) the default profile path for `cs`.
    pub fn set_profile_path(&mut self, cs: Colorspace, path: Option<PathBuf>) {
        let slot = match cs {
            Colorspace::Rgb => &mut self.rgb_profile,
            Colorspace::Cmyk => &mut self.cmyk_profile,
            Colorspace::Gray => &mut self.gray_profile,
        };
        *slot = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ColorSettings::default();
        assert!(s.blackpoint);
        assert_eq!(s.intent, Intent::Perceptual);
        assert!(s.profile_path(Colorspace::Rgb).is_none());
    }

    #[test]
    fn test_set_profile_path() {
        let mut s = ColorSettings::default();
        s.set_profile_path(Colorspace::Cmyk, Some(PathBuf::from("/tmp/coated.icc")));
        assert_eq!(s.profile_path(Colorspace::Cmyk), Some(Path::new("/tmp/coated.icc")));
        assert!(s.profile_path(Colorspace::Gray).is_none());
    }
}
