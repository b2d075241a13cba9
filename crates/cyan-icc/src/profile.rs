//! ICC profile values.
//!
//! A [`ColorProfile`] owns the raw ICC bytes plus the metadata read from them
//! once at construction. Two profiles are the same profile when their bytes
//! are the same; the metadata is derived and never compared.

use crate::{IccError, IccResult};
use cyan_core::Colorspace;
use lcms2::{ColorSpaceSignature, InfoType, Locale, Profile as LcmsProfile};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, OnceLock};

const HEADER_LEN: usize = 128;
/// Creation date and time (`dateTimeNumber`).
const DATE_FIELD: std::ops::Range<usize> = 24..36;
/// MD5 profile id; all zero means "not computed".
const ID_FIELD: std::ops::Range<usize> = 84..100;

/// Colorspace declared in a profile header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProfileColorspace {
    /// RGB device data.
    Rgb,
    /// CMYK device data.
    Cmyk,
    /// Gray device data.
    Gray,
    /// Anything else (Lab, XYZ, n-color, ...).
    #[default]
    Unknown,
}

impl ProfileColorspace {
    /// Canvas colorspace this profile can serve, if any.
    pub fn colorspace(self) -> Option<Colorspace> {
        match self {
            ProfileColorspace::Rgb => Some(Colorspace::Rgb),
            ProfileColorspace::Cmyk => Some(Colorspace::Cmyk),
            ProfileColorspace::Gray => Some(Colorspace::Gray),
            ProfileColorspace::Unknown => None,
        }
    }

    fn from_signature(sig: ColorSpaceSignature) -> Self {
        match sig {
            ColorSpaceSignature::RgbData => ProfileColorspace::Rgb,
            ColorSpaceSignature::CmykData => ProfileColorspace::Cmyk,
            ColorSpaceSignature::GrayData => ProfileColorspace::Gray,
            _ => ProfileColorspace::Unknown,
        }
    }
}

impl From<Colorspace> for ProfileColorspace {
    fn from(cs: Colorspace) -> Self {
        match cs {
            Colorspace::Rgb => ProfileColorspace::Rgb,
            Colorspace::Cmyk => ProfileColorspace::Cmyk,
            Colorspace::Gray => ProfileColorspace::Gray,
        }
    }
}

impl fmt::Display for ProfileColorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.colorspace() {
            Some(cs) => write!(f, "{cs}"),
            None => f.write_str("UNKNOWN"),
        }
    }
}

/// Metadata read from a profile.
///
/// Every text field is empty when the tag is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Profile description tag (`desc`), en_US.
    pub description: String,
    /// Device manufacturer tag (`dmnd`).
    pub manufacturer: String,
    /// Copyright tag (`cprt`).
    pub copyright: String,
    /// Colorspace from the profile header.
    pub colorspace: ProfileColorspace,
}

/// An ICC color profile.
///
/// Cheap to clone; the bytes are shared.
///
/// # Example
///
/// ```rust
/// use cyan_icc::{ColorProfile, ProfileColorspace};
///
/// let srgb = ColorProfile::srgb().unwrap();
/// assert_eq!(srgb.info().colorspace, ProfileColorspace::Rgb);
/// assert!(!srgb.info().description.is_empty());
/// ```
#[derive(Clone)]
pub struct ColorProfile {
    bytes: Arc<[u8]>,
    info: Arc<ProfileInfo>,
}

impl ColorProfile {
    /// Wraps raw ICC data after checking that Little CMS accepts it.
    pub fn from_icc(bytes: impl Into<Arc<[u8]>>) -> IccResult<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let lcms = LcmsProfile::new_icc(&bytes).map_err(|e| IccError::InvalidProfile(e.to_string()))?;
        let info = read_info(&lcms);
        Ok(Self {
            bytes,
            info: Arc::new(info),
        })
    }

    /// Reads a profile from an `.icc`/`.icm` file.
    pub fn from_file(path: &Path) -> IccResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| IccError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        Self::from_icc(bytes)
            .map_err(|e| IccError::LoadFailed(format!("{}: {}", path.display(), e)))
    }

    /// Built-in sRGB profile.
    pub fn srgb() -> IccResult<Self> {
        Self::from_lcms(&LcmsProfile::new_srgb())
    }

    /// Built-in gray profile with a D50 white point and a pure gamma curve.
    pub fn gray(gamma: f64) -> IccResult<Self> {
        let curve = lcms2::ToneCurve::new(gamma);
        let lcms = LcmsProfile::new_gray(&lcms2::CIExyY::d50(), &curve)
            .map_err(|e| IccError::CreateFailed(e.to_string()))?;
        Self::from_lcms(&lcms)
    }

    /// Built-in fallback for a colorspace, when one exists.
    ///
    /// RGB falls back to sRGB and gray to gamma 2.2. There is no built-in
    /// CMYK characterization, so CMYK yields `None`.
    ///
    /// The profiles are built once per process and share their bytes.
    pub fn builtin(cs: Colorspace) -> IccResult<Option<Self>> {
        static RGB: OnceLock<ColorProfile> = OnceLock::new();
        static GRAY: OnceLock<ColorProfile> = OnceLock::new();
        let (cell, make): (&OnceLock<ColorProfile>, fn() -> IccResult<ColorProfile>) = match cs {
            Colorspace::Rgb => (&RGB, Self::srgb),
            Colorspace::Gray => (&GRAY, || Self::gray(2.2)),
            Colorspace::Cmyk => return Ok(None),
        };
        if let Some(p) = cell.get() {
            return Ok(Some(p.clone()));
        }
        let profile = make()?;
        Ok(Some(cell.get_or_init(|| profile).clone()))
    }

    /// Serializes a generated profile with a fixed header.
    ///
    /// Little CMS stamps the creation time into the header, which would make
    /// the same built-in differ from one run to the next.
    fn from_lcms(lcms: &LcmsProfile) -> IccResult<Self> {
        let mut bytes = lcms.icc().map_err(|e| IccError::CreateFailed(e.to_string()))?;
        if bytes.len() < HEADER_LEN {
            return Err(IccError::CreateFailed(format!("short profile header ({} bytes)", bytes.len())));
        }
        bytes[DATE_FIELD].fill(0);
        bytes[ID_FIELD].fill(0);
        Self::from_icc(bytes).map_err(|e| IccError::CreateFailed(e.to_string()))
    }

    /// Raw ICC bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the raw bytes, suitable for embedding in an image.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Metadata read at construction.
    pub fn info(&self) -> &ProfileInfo {
        &self.info
    }

    /// Description tag; empty when absent.
    pub fn description(&self) -> &str {
        &self.info.description
    }

    /// True when the profile characterizes `cs`.
    pub fn matches(&self, cs: Colorspace) -> bool {
        self.info.colorspace == ProfileColorspace::from(cs)
    }

    /// Opens a Little CMS handle on the bytes.
    pub(crate) fn lcms(&self) -> IccResult<LcmsProfile> {
        LcmsProfile::new_icc(&self.bytes).map_err(|e| IccError::InvalidProfile(e.to_string()))
    }
}

impl PartialEq for ColorProfile {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes) || self.bytes == other.bytes
    }
}

impl Eq for ColorProfile {}

impl Hash for ColorProfile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for ColorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorProfile")
            .field("description", &self.info.description)
            .field("colorspace", &self.info.colorspace)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Reads profile metadata from raw bytes.
///
/// Invalid data yields an empty [`ProfileInfo`] rather than an error, so
/// scanners can skip junk files without special handling.
pub fn describe_profile(bytes: &[u8]) -> ProfileInfo {
    match LcmsProfile::new_icc(bytes) {
        Ok(lcms) => read_info(&lcms),
        Err(_) => ProfileInfo::default(),
    }
}

/// Reads profile metadata from a file; unreadable files give an empty info.
pub fn describe_file(path: &Path) -> ProfileInfo {
    match std::fs::read(path) {
        Ok(bytes) => describe_profile(&bytes),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "cannot read profile");
            ProfileInfo::default()
        }
    }
}

fn read_info(lcms: &LcmsProfile) -> ProfileInfo {
    let text = |kind: InfoType| {
        lcms.info(kind, Locale::new("en_US"))
            .map(|s| s.trim_end_matches('\0').trim().to_string())
            .unwrap_or_default()
    };
    ProfileInfo {
        description: text(InfoType::Description),
        manufacturer: text(InfoType::Manufacturer),
        copyright: text(InfoType::Copyright),
        colorspace: ProfileColorspace::from_signature(lcms.color_space()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_info() {
        let p = ColorProfile::srgb().unwrap();
        assert!(p.matches(Colorspace::Rgb));
        assert!(!p.description().is_empty());
    }

    #[test]
    fn test_gray() {
        let p = ColorProfile::gray(2.2).unwrap();
        assert_eq!(p.info().colorspace, ProfileColorspace::Gray);
    }

    #[test]
    fn test_identity_is_bytes() {
        let a = ColorProfile::srgb().unwrap();
        let b = ColorProfile::from_icc(a.bytes().to_vec()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ColorProfile::gray(2.2).unwrap());
    }

    #[test]
    fn test_invalid_bytes() {
        assert!(ColorProfile::from_icc(vec![1u8, 2, 3]).is_err());
        assert_eq!(describe_profile(b"not a profile"), ProfileInfo::default());
    }

    #[test]
    fn test_builtin_shared_and_cmyk_absent() {
        assert!(ColorProfile::builtin(Colorspace::Cmyk).unwrap().is_none());
        let a = ColorProfile::builtin(Colorspace::Gray).unwrap().unwrap();
        let b = ColorProfile::builtin(Colorspace::Gray).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a.shared_bytes(), &b.shared_bytes()));
    }

    #[test]
    fn test_generated_header_is_fixed() {
        let first = ColorProfile::srgb().unwrap();
        assert!(first.bytes()[DATE_FIELD].iter().all(|&b| b == 0));
        assert!(first.bytes()[ID_FIELD].iter().all(|&b| b == 0));
        // header dates have one-second resolution
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(ColorProfile::srgb().unwrap(), first);
        assert_eq!(ColorProfile::gray(2.2).unwrap(), ColorProfile::gray(2.2).unwrap());
    }
}
