//! Decoded raster buffers.
//!
//! [`ImageData`] is the pixel buffer every other crate passes around: the
//! codec produces it, the color transform rewrites its color channels, the
//! compositor reads it and the project serializer stores it verbatim.
//!
//! Samples keep the precision they were decoded with ([`PixelData`]), so an
//! 8-bit layer written to a project reads back byte-identical.

use crate::{Colorspace, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage type of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// 8-bit unsigned integer per channel.
    U8,
    /// 16-bit unsigned integer per channel.
    U16,
    /// 32-bit float per channel.
    F32,
}

impl SampleFormat {
    /// Returns bytes per sample for this format.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::U16 => 2,
            SampleFormat::F32 => 4,
        }
    }

    /// Returns true if this is a floating-point format.
    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::F32)
    }
}

/// Raw interleaved sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8-bit unsigned data.
    U8(Vec<u8>),
    /// 16-bit unsigned data.
    U16(Vec<u16>),
    /// 32-bit float data.
    F32(Vec<f32>),
}

impl PixelData {
    /// Allocates zeroed storage of `len` samples.
    pub fn zeroed(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::U8 => PixelData::U8(vec![0; len]),
            SampleFormat::U16 => PixelData::U16(vec![0; len]),
            SampleFormat::F32 => PixelData::F32(vec![0.0; len]),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample format of this storage.
    pub fn format(&self) -> SampleFormat {
        match self {
            PixelData::U8(_) => SampleFormat::U8,
            PixelData::U16(_) => SampleFormat::U16,
            PixelData::F32(_) => SampleFormat::F32,
        }
    }

    /// Converts all samples to normalized f32.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            PixelData::U8(data) => data.iter().map(|&v| v as f32 / 255.0).collect(),
            PixelData::U16(data) => data.iter().map(|&v| v as f32 / 65535.0).collect(),
            PixelData::F32(data) => data.clone(),
        }
    }

    /// Quantizes normalized f32 samples into `format`.
    ///
    /// Integer formats clamp to `[0, 1]` and round to nearest.
    pub fn from_f32(format: SampleFormat, samples: &[f32]) -> Self {
        match format {
            SampleFormat::U8 => PixelData::U8(
                samples
                    .iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                    .collect(),
            ),
            SampleFormat::U16 => PixelData::U16(
                samples
                    .iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
                    .collect(),
            ),
            SampleFormat::F32 => PixelData::F32(samples.to_vec()),
        }
    }

    /// Normalized value of one sample.
    #[inline]
    pub fn sample(&self, index: usize) -> f32 {
        match self {
            PixelData::U8(v) => v[index] as f32 / 255.0,
            PixelData::U16(v) => v[index] as f32 / 65535.0,
            PixelData::F32(v) => v[index],
        }
    }
}

/// A decoded image: geometry, colorspace, samples and embedded ICC data.
///
/// Two images compare equal only if every field matches, including the
/// embedded profile bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Device colorspace of the color channels.
    pub colorspace: Colorspace,
    /// True when a trailing alpha channel is present.
    pub alpha: bool,
    /// Interleaved samples.
    pub data: PixelData,
    /// Embedded ICC profile, if the source carried one.
    pub icc_profile: Option<Arc<[u8]>>,
    /// Optional human readable label (file stem for decoded files).
    pub label: Option<String>,
}

impl ImageData {
    /// Creates a zero-filled image.
    ///
    /// With `alpha` set the image is fully transparent.
    pub fn new(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        alpha: bool,
        format: SampleFormat,
    ) -> CoreResult<Self> {
        let len = sample_len(width, height, colorspace, alpha)?;
        Ok(Self {
            width,
            height,
            colorspace,
            alpha,
            data: PixelData::zeroed(format, len),
            icc_profile: None,
            label: None,
        })
    }

    /// Wraps existing samples, checking the buffer length.
    pub fn from_data(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        alpha: bool,
        data: PixelData,
    ) -> CoreResult<Self> {
        let expected = sample_len(width, height, colorspace, alpha)?;
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            colorspace,
            alpha,
            data,
            icc_profile: None,
            label: None,
        })
    }

    /// Creates an image from 8-bit samples.
    pub fn from_u8(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        alpha: bool,
        data: Vec<u8>,
    ) -> CoreResult<Self> {
        Self::from_data(width, height, colorspace, alpha, PixelData::U8(data))
    }

    /// Creates an image from normalized f32 samples.
    pub fn from_f32(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        alpha: bool,
        data: Vec<f32>,
    ) -> CoreResult<Self> {
        Self::from_data(width, height, colorspace, alpha, PixelData::F32(data))
    }

    /// Creates an image where every pixel has the given normalized value.
    ///
    /// `pixel` must hold [`Self::channels`] values.
    pub fn filled(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        alpha: bool,
        format: SampleFormat,
        pixel: &[f32],
    ) -> CoreResult<Self> {
        let channels = (colorspace.color_channels() + alpha as u32) as usize;
        if pixel.len() != channels {
            return Err(CoreError::BufferSize {
                expected: channels,
                got: pixel.len(),
            });
        }
        let len = sample_len(width, height, colorspace, alpha)?;
        let samples: Vec<f32> = pixel.iter().copied().cycle().take(len).collect();
        Self::from_data(
            width,
            height,
            colorspace,
            alpha,
            PixelData::from_f32(format, &samples),
        )
    }

    /// Attaches an embedded ICC profile.
    pub fn with_icc_profile(mut self, icc: impl Into<Arc<[u8]>>) -> Self {
        self.icc_profile = Some(icc.into());
        self
    }

    /// Attaches a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Total channels per pixel (color + alpha).
    #[inline]
    pub fn channels(&self) -> u32 {
        self.colorspace.color_channels() + self.alpha as u32
    }

    /// Color channels per pixel.
    #[inline]
    pub fn color_channels(&self) -> u32 {
        self.colorspace.color_channels()
    }

    /// Sample storage format.
    #[inline]
    pub fn format(&self) -> SampleFormat {
        self.data.format()
    }

    /// Returns the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the total number of samples (pixels * channels).
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels() as usize
    }

    /// Converts samples to normalized f32 (for processing).
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.to_f32()
    }

    /// Normalized samples of the pixel at `(x, y)`, or `None` when outside.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels() as usize;
        let base = (y as usize * self.width as usize + x as usize) * channels;
        Some((0..channels).map(|c| self.data.sample(base + c)).collect())
    }

    /// Alpha of the pixel at `(x, y)`; opaque images report 1.0.
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<f32> {
        let px = self.pixel(x, y)?;
        Some(if self.alpha { px[px.len() - 1] } else { 1.0 })
    }
}

fn sample_len(width: u32, height: u32, colorspace: Colorspace, alpha: bool) -> CoreResult<usize> {
    if width == 0 || height == 0 {
        return Err(CoreError::invalid_dimensions(width, height, "zero-sized image"));
    }
    let channels = (colorspace.color_channels() + alpha as u32) as usize;
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| CoreError::invalid_dimensions(width, height, "sample count overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_is_transparent() {
        let img = ImageData::new(4, 3, Colorspace::Rgb, true, SampleFormat::U8).unwrap();
        assert_eq!(img.channels(), 4);
        assert_eq!(img.sample_count(), 48);
        assert_eq!(img.alpha_at(2, 2), Some(0.0));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(ImageData::new(0, 3, Colorspace::Gray, false, SampleFormat::U8).is_err());
    }

    #[test]
    fn test_buffer_size_checked() {
        let err = ImageData::from_u8(2, 2, Colorspace::Cmyk, false, vec![0; 15]).unwrap_err();
        assert!(matches!(err, CoreError::BufferSize { expected: 16, got: 15 }));
    }

    #[test]
    fn test_filled_and_pixel() {
        let img = ImageData::filled(
            3,
            2,
            Colorspace::Rgb,
            true,
            SampleFormat::F32,
            &[0.25, 0.5, 0.75, 1.0],
        )
        .unwrap();
        assert_eq!(img.pixel(2, 1).unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
        assert!(img.pixel(3, 0).is_none());
    }

    #[test]
    fn test_quantize_roundtrip_u8() {
        let data = PixelData::U8(vec![0, 1, 127, 128, 254, 255]);
        let back = PixelData::from_f32(SampleFormat::U8, &data.to_f32());
        assert_eq!(back, data);
    }

    #[test]
    fn test_quantize_clamps() {
        let data = PixelData::from_f32(SampleFormat::U16, &[-0.5, 0.5, 1.5]);
        assert_eq!(data, PixelData::U16(vec![0, 32768, 65535]));
        assert_relative_eq!(data.sample(1), 32768.0 / 65535.0);
    }

    #[test]
    fn test_opaque_alpha_reports_one() {
        let img = ImageData::new(1, 1, Colorspace::Gray, false, SampleFormat::U8).unwrap();
        assert_eq!(img.alpha_at(0, 0), Some(1.0));
    }
}
