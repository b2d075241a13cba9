//! Single-file project format.
//!
//! # Layout
//!
//! ```text
//! magic     8 bytes   \x89 C Y N \r \n \x1a \n
//! version   u32 LE
//! length    u64 LE    manifest length in bytes
//! manifest  JSON      canvas and layer metadata
//! blob      bytes     profile and layer samples, addressed by the manifest
//! ```
//!
//! Layer samples are stored little-endian in their original sample format,
//! so a project reads back pixel-identical. Opacity is written as a float in
//! `[0, 1]`; an integer is read as a percentage.
//!
//! Reading validates the whole manifest against the blob before any layer is
//! materialized. The embedded profile goes through a [`ProfileCache`], so
//! projects sharing a profile share one value. Writing goes through a
//! temporary file in the target directory that is renamed into place.
//!
//! The layer id counter is stored with the layers, so ids of removed layers
//! are not handed out again after a reload.

use crate::{Canvas, CanvasError, CanvasResult, Layer, LayerId};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use cyan_core::{Colorspace, ImageData, PixelData, SampleFormat};
use cyan_icc::{ColorProfile, ProfileCache};
use cyan_ops::CompositeOp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// File signature.
pub const MAGIC: &[u8; 8] = b"\x89CYN\r\n\x1a\n";

/// Current format version.
pub const VERSION: u32 = 1;

/// Project file extension.
pub const EXTENSION: &str = "cyan";

const HEADER_LEN: u64 = 8 + 4 + 8;

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    label: String,
    width: u32,
    height: u32,
    colorspace: Colorspace,
    profile: Option<Span>,
    /// Absent in files from before the counter was stored.
    #[serde(default)]
    next_id: Option<u64>,
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Span {
    offset: u64,
    length: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerEntry {
    id: u64,
    label: String,
    composite: u16,
    opacity: Opacity,
    visible: bool,
    position: usize,
    #[serde(default)]
    offset_x: i32,
    #[serde(default)]
    offset_y: i32,
    width: u32,
    height: u32,
    alpha: bool,
    format: SampleFormat,
    data: Span,
}

/// Stored opacity: percentage integer or unit float.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum Opacity {
    Percent(u64),
    Fraction(f64),
}

impl Opacity {
    fn to_unit(self) -> f64 {
        match self {
            Opacity::Percent(p) => p.min(100) as f64 / 100.0,
            Opacity::Fraction(f) => crate::layer::clamp_opacity(f),
        }
    }
}

/// Writes `canvas` to `path`.
///
/// The previous file at `path`, if any, stays intact until the new one is
/// completely written.
pub fn write(canvas: &Canvas, path: &Path) -> CanvasResult<()> {
    let mut blob = Vec::new();
    let profile = canvas.profile().map(|p| append(&mut blob, p.bytes()));

    let mut layers = Vec::with_capacity(canvas.layer_count());
    for layer in canvas.layers() {
        let image = layer.image();
        let data = append(&mut blob, &encode_samples(&image.data));
        layers.push(LayerEntry {
            id: layer.id().get(),
            label: layer.label().to_string(),
            composite: layer.composite().code(),
            opacity: Opacity::Fraction(layer.opacity()),
            visible: layer.visible(),
            position: layer.position(),
            offset_x: layer.offset().0,
            offset_y: layer.offset().1,
            width: image.width,
            height: image.height,
            alpha: image.alpha,
            format: image.format(),
            data,
        });
    }

    let manifest = Manifest {
        label: canvas.label().to_string(),
        width: canvas.width(),
        height: canvas.height(),
        colorspace: canvas.colorspace(),
        profile,
        next_id: Some(canvas.next_layer_id()),
        layers,
    };
    let json = serde_json::to_vec(&manifest).map_err(|e| CanvasError::structure(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let out = tmp.as_file_mut();
        out.write_all(MAGIC)?;
        out.write_u32::<LittleEndian>(VERSION)?;
        out.write_u64::<LittleEndian>(json.len() as u64)?;
        out.write_all(&json)?;
        out.write_all(&blob)?;
        out.sync_all()?;
    }
    tmp.persist(path).map_err(|e| CanvasError::Io(e.error))?;
    tracing::debug!(
        path = %path.display(),
        layers = canvas.layer_count(),
        bytes = HEADER_LEN + json.len() as u64 + blob.len() as u64,
        "project written"
    );
    Ok(())
}

/// Reads a project file, sharing its profile through `cache`.
///
/// # Errors
///
/// [`CanvasError::Structure`] when the file is not a valid project; no
/// canvas is built in that case.
pub fn read(path: &Path, cache: &ProfileCache) -> CanvasResult<Canvas> {
    let bytes = std::fs::read(path)?;
    let canvas = parse(&bytes, cache)?;
    tracing::debug!(path = %path.display(), layers = canvas.layer_count(), "project read");
    Ok(canvas)
}

/// True when `path` has the project extension and signature.
///
/// Only the first bytes are read.
pub fn is_project_file(path: &Path) -> bool {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXTENSION));
    if !ext_ok {
        return false;
    }
    let mut head = [0u8; 8];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut head))
        .map(|_| &head == MAGIC)
        .unwrap_or(false)
}

/// Parses an in-memory project.
pub fn parse(bytes: &[u8], cache: &ProfileCache) -> CanvasResult<Canvas> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 8];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| CanvasError::structure("file too short"))?;
    if &magic != MAGIC {
        return Err(CanvasError::structure("not a project file"));
    }
    let version = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| CanvasError::structure("truncated header"))?;
    if version != VERSION {
        return Err(CanvasError::structure(format!("unsupported version {version}")));
    }
    let manifest_len = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| CanvasError::structure("truncated header"))?;
    let manifest_end = HEADER_LEN
        .checked_add(manifest_len)
        .filter(|&end| end <= bytes.len() as u64)
        .ok_or_else(|| CanvasError::structure("manifest exceeds file"))?;
    let json = &bytes[HEADER_LEN as usize..manifest_end as usize];
    let blob = &bytes[manifest_end as usize..];

    let manifest: Manifest =
        serde_json::from_slice(json).map_err(|e| CanvasError::structure(format!("manifest: {e}")))?;
    validate(&manifest, blob)?;

    let profile = match manifest.profile {
        Some(span) => {
            let profile = cache
                .intern(slice(blob, span)?)
                .map_err(|e| CanvasError::structure(format!("embedded profile: {e}")))?;
            if !profile.matches(manifest.colorspace) {
                return Err(CanvasError::structure(format!(
                    "profile is {} but canvas is {}",
                    profile.info().colorspace,
                    manifest.colorspace
                )));
            }
            Some(profile)
        }
        None => None,
    };

    let mut entries = manifest.layers;
    entries.sort_by_key(|e| e.position);
    let mut layers = Vec::with_capacity(entries.len());
    for entry in entries {
        let data = decode_samples(slice(blob, entry.data)?, entry.format);
        let mut image = ImageData::from_data(entry.width, entry.height, manifest.colorspace, entry.alpha, data)?;
        image.icc_profile = profile.as_ref().map(ColorProfile::shared_bytes);
        let mut layer = Layer::new(LayerId(entry.id), image, entry.label);
        layer.composite = CompositeOp::from_code(entry.composite).unwrap_or_default();
        layer.opacity = entry.opacity.to_unit();
        layer.visible = entry.visible;
        layer.offset = (entry.offset_x, entry.offset_y);
        layers.push(layer);
    }
    Canvas::from_parts(
        manifest.width,
        manifest.height,
        manifest.colorspace,
        profile,
        manifest.label,
        layers,
        manifest.next_id,
    )
}

fn validate(manifest: &Manifest, blob: &[u8]) -> CanvasResult<()> {
    if manifest.width == 0 || manifest.height == 0 {
        return Err(CanvasError::structure("zero canvas dimensions"));
    }
    if manifest.layers.is_empty() {
        return Err(CanvasError::structure("project has no layers"));
    }
    if let Some(span) = manifest.profile {
        slice(blob, span)?;
    }
    let n = manifest.layers.len();
    let mut ids = HashSet::with_capacity(n);
    let mut positions = vec![false; n];
    for entry in &manifest.layers {
        if !ids.insert(entry.id) {
            return Err(CanvasError::structure(format!("duplicate layer id {}", entry.id)));
        }
        if manifest.next_id.is_some_and(|next| entry.id >= next) {
            return Err(CanvasError::structure(format!(
                "layer id {} is not below the next id counter",
                entry.id
            )));
        }
        match positions.get_mut(entry.position) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(CanvasError::structure(format!(
                    "layer {} has invalid position {}",
                    entry.id, entry.position
                )));
            }
        }
        if CompositeOp::from_code(entry.composite).is_none() {
            return Err(CanvasError::structure(format!(
                "layer {} has unknown composite {}",
                entry.id, entry.composite
            )));
        }
        if matches!(entry.opacity, Opacity::Fraction(f) if !f.is_finite()) {
            return Err(CanvasError::structure(format!("layer {} opacity is not finite", entry.id)));
        }
        if entry.width == 0 || entry.height == 0 {
            return Err(CanvasError::structure(format!("layer {} has zero size", entry.id)));
        }
        let samples = (entry.width as u64)
            .checked_mul(entry.height as u64)
            .and_then(|n| n.checked_mul((manifest.colorspace.color_channels() + entry.alpha as u32) as u64))
            .and_then(|n| n.checked_mul(entry.format.bytes_per_sample() as u64));
        if samples != Some(entry.data.length) {
            return Err(CanvasError::structure(format!(
                "layer {} data length {} does not match {}x{}",
                entry.id, entry.data.length, entry.width, entry.height
            )));
        }
        slice(blob, entry.data)?;
    }
    Ok(())
}

fn append(blob: &mut Vec<u8>, bytes: &[u8]) -> Span {
    let span = Span {
        offset: blob.len() as u64,
        length: bytes.len() as u64,
    };
    blob.extend_from_slice(bytes);
    span
}

fn slice(blob: &[u8], span: Span) -> CanvasResult<&[u8]> {
    let end = span
        .offset
        .checked_add(span.length)
        .filter(|&end| end <= blob.len() as u64)
        .ok_or_else(|| CanvasError::structure("data range exceeds file"))?;
    Ok(&blob[span.offset as usize..end as usize])
}

fn encode_samples(data: &PixelData) -> Vec<u8> {
    match data {
        PixelData::U8(v) => v.clone(),
        PixelData::U16(v) => {
            let mut out = vec![0u8; v.len() * 2];
            LittleEndian::write_u16_into(v, &mut out);
            out
        }
        PixelData::F32(v) => {
            let mut out = vec![0u8; v.len() * 4];
            LittleEndian::write_f32_into(v, &mut out);
            out
        }
    }
}

/// `bytes` length was checked against the format in [`validate`].
fn decode_samples(bytes: &[u8], format: SampleFormat) -> PixelData {
    match format {
        SampleFormat::U8 => PixelData::U8(bytes.to_vec()),
        SampleFormat::U16 => {
            let mut out = vec![0u16; bytes.len() / 2];
            LittleEndian::read_u16_into(bytes, &mut out);
            PixelData::U16(out)
        }
        SampleFormat::F32 => {
            let mut out = vec![0f32; bytes.len() / 4];
            LittleEndian::read_f32_into(bytes, &mut out);
            PixelData::F32(out)
        }
    }
}
