//! Format detection.
//!
//! Magic bytes win; the extension is only consulted when the header is not
//! recognized.

use std::path::Path;

/// Raster formats the codec handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// TIFF format.
    Tiff,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Detects the format of file contents: magic bytes, then the
    /// extension of `path`.
    pub fn sniff<P: AsRef<Path>>(bytes: &[u8], path: P) -> Self {
        match Self::from_bytes(bytes) {
            Format::Unknown => Self::from_extension(path),
            format => format,
        }
    }

    /// Detects format from file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("png") => Format::Png,
            Some("jpg") | Some("jpeg") | Some("jpe") => Format::Jpeg,
            Some("tif") | Some("tiff") => Format::Tiff,
            _ => Format::Unknown,
        }
    }

    /// Detects format from raw header bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        // PNG: 0x89 'P' 'N' 'G' CR LF SUB LF
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Format::Png;
        }
        // JPEG: SOI followed by a marker
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Format::Jpeg;
        }
        // TIFF: II*\0 or MM\0*
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
            return Format::Tiff;
        }
        Format::Unknown
    }

    /// Typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Tiff => "tif",
            Format::Unknown => "",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Png => "PNG",
            Format::Jpeg => "JPEG",
            Format::Tiff => "TIFF",
            Format::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Format {
    type Err = crate::IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_extension(format!("x.{s}")) {
            Format::Unknown => Err(crate::IoError::UnsupportedFormat(s.to_string())),
            f => Ok(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic() {
        assert_eq!(Format::from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]), Format::Png);
        assert_eq!(Format::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Format::Jpeg);
        assert_eq!(Format::from_bytes(b"MM\0*"), Format::Tiff);
        assert_eq!(Format::from_bytes(b"GIF8"), Format::Unknown);
    }

    #[test]
    fn test_extension() {
        assert_eq!(Format::from_extension("a/b/photo.JPEG"), Format::Jpeg);
        assert_eq!(Format::from_extension("scan.tif"), Format::Tiff);
        assert_eq!(Format::from_extension("noext"), Format::Unknown);
        assert_eq!("png".parse::<Format>().unwrap(), Format::Png);
    }

    #[test]
    fn test_magic_beats_extension() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0];
        assert_eq!(Format::sniff(&png, "lying.jpg"), Format::Png);
        assert_eq!(Format::sniff(b"????", "scan.TIFF"), Format::Tiff);
        assert_eq!(Format::sniff(b"", "notes.txt"), Format::Unknown);
    }
}
