//! Integration tests for Cyan crates.
//!
//! End-to-end checks of the canvas model across the ICC, codec, compositing
//! and project crates. ICC fixtures are generated from the Little CMS
//! built-ins at test time.

use cyan_core::{Colorspace, ImageData, SampleFormat};
use std::path::{Path, PathBuf};

#[cfg(test)]
mod canvas;
#[cfg(test)]
mod catalog;
#[cfg(test)]
mod color;
#[cfg(test)]
mod project;

/// Solid image of `value` in every color channel.
pub fn solid(width: u32, height: u32, cs: Colorspace, format: SampleFormat, value: f32) -> ImageData {
    let pixel = vec![value; cs.color_channels() as usize];
    ImageData::filled(width, height, cs, false, format, &pixel).unwrap_or_else(|e| panic!("fixture: {e}"))
}

/// Horizontal ramp with a trailing alpha ramp going the other way.
pub fn ramp(width: u32, height: u32, cs: Colorspace, format: SampleFormat) -> ImageData {
    let channels = cs.color_channels() as usize;
    let mut samples = Vec::with_capacity(width as usize * height as usize * (channels + 1));
    for _ in 0..height {
        for x in 0..width {
            let t = x as f32 / (width.max(2) - 1) as f32;
            samples.extend(std::iter::repeat_n(t, channels));
            samples.push(1.0 - t * 0.5);
        }
    }
    let data = cyan_core::PixelData::from_f32(format, &samples);
    ImageData::from_data(width, height, cs, true, data).unwrap_or_else(|e| panic!("fixture: {e}"))
}

/// Writes `bytes` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()));
    path
}
