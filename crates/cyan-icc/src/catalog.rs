//! Profile discovery, defaults and tag editing.
//!
//! The catalog walks a fixed list of directories (platform, user and
//! application-private) for `.icc`/`.icm` files and reports the ones whose
//! header declares the requested colorspace.

use crate::{ColorProfile, ColorSettings, IccError, IccResult, ProfileCache, ProfileColorspace, describe_file};
use cyan_core::Colorspace;
use lcms2::{Locale, MLU, Profile as LcmsProfile, Tag, TagSignature};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One listed profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileEntry {
    /// Canonical path of the profile file.
    pub path: PathBuf,
    /// Profile description (never empty).
    pub description: String,
}

/// A deduplicated set of directories holding ICC profiles.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    dirs: Vec<PathBuf>,
}

impl ProfileCatalog {
    /// Catalog over explicit directories.
    ///
    /// Directories are canonicalized where possible and duplicates dropped,
    /// so a symlink to a listed directory is scanned once.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for dir in dirs {
            let dir = dir.into();
            let key = dir.canonicalize().unwrap_or_else(|_| dir.clone());
            if seen.insert(key.clone()) {
                out.push(key);
            }
        }
        Self { dirs: out }
    }

    /// Catalog over the well-known profile locations of this machine.
    pub fn system() -> Self {
        let mut found: Vec<PathBuf> = Vec::new();
        if cfg!(windows) {
            if let Some(root) = std::env::var_os("SystemRoot") {
                found.push(PathBuf::from(root).join("System32/spool/drivers/color"));
            }
        }
        if cfg!(target_os = "macos") {
            found.push(PathBuf::from("/Library/ColorSync/Profiles"));
        }
        found.push(PathBuf::from("/usr/share/color/icc"));
        found.push(PathBuf::from("/usr/local/share/color/icc"));
        if let Some(home) = dirs::home_dir() {
            if cfg!(target_os = "macos") {
                found.push(home.join("Library/ColorSync/Profiles"));
            }
            found.push(home.join(".color/icc"));
        }
        if let Some(config) = dirs::config_dir() {
            found.push(config.join("Cyan").join("icc"));
        }
        Self::new(found)
    }

    /// Scanned directories, in scan order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Lazily lists profiles declaring `cs`.
    ///
    /// Unreadable files and profiles without a description are skipped.
    pub fn list(&self, cs: Colorspace) -> ProfileScan {
        ProfileScan {
            dirs: self.dirs.clone(),
            want: cs.into(),
            next_dir: 0,
            walker: None,
            seen: HashSet::new(),
        }
    }
}

/// Iterator returned by [`ProfileCatalog::list`].
///
/// Never yields the same `(path, description)` pair twice, including when a
/// file is reachable through several symlinked directories.
pub struct ProfileScan {
    dirs: Vec<PathBuf>,
    want: ProfileColorspace,
    next_dir: usize,
    walker: Option<walkdir::IntoIter>,
    seen: HashSet<ProfileEntry>,
}

impl ProfileScan {
    /// Starts the scan over from the first directory.
    pub fn restart(&mut self) {
        self.next_dir = 0;
        self.walker = None;
        self.seen.clear();
    }

    fn next_file(&mut self) -> Option<PathBuf> {
        loop {
            if self.walker.is_none() {
                let dir = self.dirs.get(self.next_dir)?;
                self.next_dir += 1;
                if !dir.is_dir() {
                    continue;
                }
                self.walker = Some(WalkDir::new(dir).follow_links(true).into_iter());
            }
            let walker = self.walker.as_mut()?;
            match walker.next() {
                None => self.walker = None,
                Some(Ok(entry)) if entry.file_type().is_file() && is_profile_name(entry.path()) => {
                    return Some(entry.into_path());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::debug!(error = %e, "skipping unreadable entry"),
            }
        }
    }
}

impl Iterator for ProfileScan {
    type Item = ProfileEntry;

    fn next(&mut self) -> Option<ProfileEntry> {
        while let Some(path) = self.next_file() {
            let info = describe_file(&path);
            if info.colorspace != self.want || info.description.is_empty() {
                continue;
            }
            let path = path.canonicalize().unwrap_or(path);
            let entry = ProfileEntry {
                path,
                description: info.description,
            };
            if self.seen.insert(entry.clone()) {
                return Some(entry);
            }
        }
        None
    }
}

impl std::fmt::Debug for ProfileScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileScan")
            .field("want", &self.want)
            .field("next_dir", &self.next_dir)
            .field("seen", &self.seen.len())
            .finish_non_exhaustive()
    }
}

fn is_profile_name(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("icc") || e.eq_ignore_ascii_case("icm"))
}

/// Writes a copy of the profile at `path` to `output` with new text tags.
///
/// Only the supplied tags are rewritten; all other tags are kept. `output`
/// may equal `path`. The target is written through a temporary file in the
/// same directory and renamed into place.
///
/// # Errors
///
/// [`IccError::NothingToEdit`] when neither field is supplied,
/// [`IccError::LoadFailed`] when the source is not a readable profile.
pub fn edit_profile(
    path: &Path,
    output: &Path,
    description: Option<&str>,
    copyright: Option<&str>,
) -> IccResult<()> {
    if description.is_none() && copyright.is_none() {
        return Err(IccError::NothingToEdit);
    }
    let mut profile = LcmsProfile::new_file(path)
        .map_err(|e| IccError::LoadFailed(format!("{}: {}", path.display(), e)))?;

    let mut rewrite = |sig: TagSignature, text: &str| -> IccResult<()> {
        let mut mlu = MLU::new(1);
        if !mlu.set_text(text, Locale::new("en_US")) {
            return Err(IccError::CreateFailed(format!("cannot encode text for {sig:?}")));
        }
        if !profile.write_tag(sig, Tag::MLU(&mlu)) {
            return Err(IccError::CreateFailed(format!("cannot write tag {sig:?}")));
        }
        Ok(())
    };
    if let Some(text) = description {
        rewrite(TagSignature::ProfileDescriptionTag, text)?;
    }
    if let Some(text) = copyright {
        rewrite(TagSignature::CopyrightTag, text)?;
    }

    let bytes = profile.icc().map_err(|e| IccError::CreateFailed(e.to_string()))?;
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| IccError::Io(e.error))?;
    tracing::debug!(source = %path.display(), output = %output.display(), "profile edited");
    Ok(())
}

/// Loads the configured default profile for `cs`.
///
/// Returns `None` when no path is configured, or when the file is unreadable,
/// not a profile, or declares another colorspace (logged as a warning).
pub fn default_profile(settings: &ColorSettings, cs: Colorspace, cache: &ProfileCache) -> Option<ColorProfile> {
    let path = settings.profile_path(cs)?;
    match cache.load(path) {
        Ok(p) if p.matches(cs) => Some(p),
        Ok(p) => {
            tracing::warn!(
                path = %path.display(),
                expected = %cs,
                actual = %p.info().colorspace,
                "default profile has wrong colorspace"
            );
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "default profile unusable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe_profile;

    fn write_profile(dir: &Path, name: &str, profile: &ColorProfile) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, profile.bytes()).unwrap();
        path
    }

    #[test]
    fn test_list_filters_colorspace() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "srgb.icc", &ColorProfile::srgb().unwrap());
        write_profile(dir.path(), "gray.ICM", &ColorProfile::gray(2.2).unwrap());
        std::fs::write(dir.path().join("junk.icc"), b"junk").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"srgb").unwrap();

        let catalog = ProfileCatalog::new([dir.path()]);
        let rgb: Vec<_> = catalog.list(Colorspace::Rgb).collect();
        assert_eq!(rgb.len(), 1);
        assert!(rgb[0].path.ends_with("srgb.icc"));
        assert_eq!(catalog.list(Colorspace::Gray).count(), 1);
        assert_eq!(catalog.list(Colorspace::Cmyk).count(), 0);
    }

    #[test]
    fn test_duplicate_dirs_collapse() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "srgb.icc", &ColorProfile::srgb().unwrap());
        let catalog = ProfileCatalog::new([dir.path(), dir.path()]);
        assert_eq!(catalog.dirs().len(), 1);
        assert_eq!(catalog.list(Colorspace::Rgb).count(), 1);
    }

    #[test]
    fn test_restart() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "srgb.icc", &ColorProfile::srgb().unwrap());
        let catalog = ProfileCatalog::new([dir.path()]);
        let mut scan = catalog.list(Colorspace::Rgb);
        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        scan.restart();
        assert!(scan.next().is_some());
    }

    #[test]
    fn test_edit_profile() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_profile(dir.path(), "srgb.icc", &ColorProfile::srgb().unwrap());
        let out = dir.path().join("edited.icc");
        edit_profile(&src, &out, Some("Edited sRGB"), None).unwrap();

        let before = describe_file(&src);
        let after = describe_profile(&std::fs::read(&out).unwrap());
        assert_eq!(after.description, "Edited sRGB");
        assert_eq!(after.copyright, before.copyright);
        assert_eq!(after.colorspace, ProfileColorspace::Rgb);
    }

    #[test]
    fn test_edit_requires_field() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_profile(dir.path(), "srgb.icc", &ColorProfile::srgb().unwrap());
        let err = edit_profile(&src, &src, None, None).unwrap_err();
        assert!(matches!(err, IccError::NothingToEdit));
    }

    #[test]
    fn test_edit_invalid_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.icc");
        std::fs::write(&src, b"bad").unwrap();
        let out = dir.path().join("out.icc");
        assert!(edit_profile(&src, &out, Some("x"), None).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let gray = write_profile(dir.path(), "gray.icc", &ColorProfile::gray(2.2).unwrap());
        let cache = ProfileCache::new();
        let mut settings = ColorSettings::default();
        assert!(default_profile(&settings, Colorspace::Gray, &cache).is_none());

        settings.gray_profile = Some(gray.clone());
        assert!(default_profile(&settings, Colorspace::Gray, &cache).is_some());

        settings.rgb_profile = Some(gray);
        assert!(default_profile(&settings, Colorspace::Rgb, &cache).is_none());
    }
}
