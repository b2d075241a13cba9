//! Persisted application settings.
//!
//! Settings are a plain value: load them once, pass them to the operations
//! that need them, save them explicitly. The file is RON:
//!
//! ```text
//! (
//!     color: (
//!         rgb_profile: Some("/usr/share/color/icc/sRGB.icc"),
//!         cmyk_profile: None,
//!         gray_profile: None,
//!         intent: 2,
//!         blackpoint: true,
//!     ),
//!     engine: (
//!         memory_limit: 8,
//!     ),
//! )
//! ```

use crate::{CanvasError, CanvasResult};
use cyan_icc::ColorSettings;
use cyan_io::DecodeLimits;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Engine resource settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Decode memory ceiling in GiB; 0 is unlimited.
    pub memory_limit: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { memory_limit: 8 }
    }
}

/// All persisted settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color management defaults.
    pub color: ColorSettings,
    /// Resource limits.
    pub engine: EngineSettings,
}

impl Settings {
    /// Platform location of the settings file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("Cyan").join("settings.ron"))
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error so that a typo never silently resets the user's choices.
    pub fn load(path: &Path) -> CanvasResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(CanvasError::Settings(format!("{}: {}", path.display(), e))),
        };
        ron::from_str(&text).map_err(|e| CanvasError::Settings(format!("{}: {}", path.display(), e)))
    }

    /// Saves settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> CanvasResult<()> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CanvasError::Settings(e.to_string()))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.persist(path).map_err(|e| CanvasError::Io(e.error))?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Codec ceiling from [`EngineSettings::memory_limit`].
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits::from_gib(self.engine.memory_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyan_core::Colorspace;
    use cyan_icc::Intent;

    #[test]
    fn test_missing_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(&dir.path().join("none.ron")).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.engine.memory_limit, 8);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.ron");
        let mut s = Settings::default();
        s.color.set_profile_path(Colorspace::Cmyk, Some(PathBuf::from("/icc/coated.icc")));
        s.color.intent = Intent::Relative;
        s.color.blackpoint = false;
        s.engine.memory_limit = 0;
        s.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("intent: 4"), "{text}");
        let back = Settings::load(&path).unwrap();
        assert_eq!(back, s);
        assert_eq!(back.decode_limits(), DecodeLimits::unlimited());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "(color: (intent: 1))").unwrap();
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.color.intent, Intent::Saturation);
        assert!(s.color.blackpoint);
        assert_eq!(s.engine, EngineSettings::default());
    }

    #[test]
    fn test_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "(color: (intent: 9))").unwrap();
        assert!(matches!(Settings::load(&path), Err(CanvasError::Settings(_))));
        std::fs::write(&path, "{{{").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
