//! Content-addressed profile sharing.

use crate::{ColorProfile, IccResult};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

type Key = [u8; 32];

/// Shares [`ColorProfile`] values by SHA-256 of their bytes.
///
/// Loading the same profile twice, from disk or from an embedded tag, yields
/// clones of one value. Clones of the cache share the same table.
#[derive(Debug, Clone, Default)]
pub struct ProfileCache {
    entries: Arc<Mutex<HashMap<Key, ColorProfile>>>,
}

impl ProfileCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a profile file through the cache.
    pub fn load(&self, path: &Path) -> IccResult<ColorProfile> {
        let bytes = std::fs::read(path).map_err(|e| {
            crate::IccError::LoadFailed(format!("{}: {}", path.display(), e))
        })?;
        self.intern(&bytes).map_err(|e| {
            crate::IccError::LoadFailed(format!("{}: {}", path.display(), e))
        })
    }

    /// Returns the cached profile for `bytes`, parsing them on first sight.
    pub fn intern(&self, bytes: &[u8]) -> IccResult<ColorProfile> {
        let key: Key = Sha256::digest(bytes).into();
        if let Some(hit) = self.lock().get(&key) {
            return Ok(hit.clone());
        }
        let profile = ColorProfile::from_icc(bytes.to_vec())?;
        tracing::trace!(description = profile.description(), "profile cached");
        Ok(self.lock().entry(key).or_insert(profile).clone())
    }

    /// Number of distinct profiles held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Key, ColorProfile>> {
        // A poisoned table still holds valid profiles.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let cache = ProfileCache::new();
        let srgb = ColorProfile::srgb().unwrap();
        let a = cache.intern(srgb.bytes()).unwrap();
        let b = cache.intern(srgb.bytes()).unwrap();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.shared_bytes(), &b.shared_bytes()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.icc");
        std::fs::write(&path, ColorProfile::gray(2.2).unwrap().bytes()).unwrap();
        let cache = ProfileCache::new();
        assert!(cache.load(&path).unwrap().matches(cyan_core::Colorspace::Gray));
        assert!(cache.load(&dir.path().join("missing.icc")).is_err());
    }
}
