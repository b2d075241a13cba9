//! Layer compositing onto a float surface.
//!
//! A [`Surface`] holds straight float color plus alpha in the colorspace of
//! the canvas. Layers are painted onto it one at a time with
//! [`Surface::composite`]; the result is read back with
//! [`Surface::into_image`].
//!
//! Each layer is combined using the W3C general formula:
//!
//! ```text
//! Cs' = (1 - ab) * Cs + ab * B(Cb, Cs)
//! ao  = as + ab * (1 - as)
//! Co  = (as * Cs' + ab * Cb * (1 - as)) / ao
//! ```
//!
//! with `as` the layer alpha times its opacity. `Plus` sums premultiplied
//! color instead. CMYK channels are inverted before blending so every
//! operator sees additive values.

use crate::blend::{MAX_CHANNELS, blend_pixel};
use crate::{CompositeOp, OpsError, OpsResult};
use cyan_core::{Colorspace, ImageData};
use tracing::trace;

/// Float RGBA-style accumulation buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    colorspace: Colorspace,
    data: Vec<f32>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn transparent(width: u32, height: u32, colorspace: Colorspace) -> OpsResult<Self> {
        if width == 0 || height == 0 {
            return Err(OpsError::InvalidDimensions(format!("{width}x{height}")));
        }
        let channels = colorspace.color_channels() as usize + 1;
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| OpsError::InvalidDimensions(format!("{width}x{height}")))?;
        Ok(Self {
            width,
            height,
            colorspace,
            data: vec![0.0; len],
        })
    }

    /// Surface width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Surface colorspace.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Paints `layer` at `offset` with `op` and `opacity`.
    ///
    /// Parts of the layer outside the surface are clipped. Opacity is
    /// clamped to `[0, 1]`.
    pub fn composite(
        &mut self,
        layer: &ImageData,
        offset: (i32, i32),
        op: CompositeOp,
        opacity: f32,
    ) -> OpsResult<()> {
        if layer.colorspace != self.colorspace {
            return Err(OpsError::ColorspaceMismatch {
                surface: self.colorspace.to_string(),
                layer: layer.colorspace.to_string(),
            });
        }
        let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        if opacity <= 0.0 {
            return Ok(());
        }

        let (ox, oy) = (offset.0 as i64, offset.1 as i64);
        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (ox + layer.width as i64).min(self.width as i64);
        let y1 = (oy + layer.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            trace!(?offset, "layer entirely outside surface");
            return Ok(());
        }
        trace!(
            %op,
            opacity,
            x0, y0, x1, y1,
            "compositing layer"
        );

        let n = self.colorspace.color_channels() as usize;
        let invert = self.colorspace.is_subtractive();
        let src_stride = layer.channels() as usize;
        let dst_stride = n + 1;
        let src = layer.to_f32();

        let mut cs = [0.0f32; MAX_CHANNELS];
        let mut cb = [0.0f32; MAX_CHANNELS];
        let mut b = [0.0f32; MAX_CHANNELS];

        for y in y0..y1 {
            let ly = (y - oy) as usize;
            for x in x0..x1 {
                let lx = (x - ox) as usize;
                let si = (ly * layer.width as usize + lx) * src_stride;
                let di = (y as usize * self.width as usize + x as usize) * dst_stride;
                let spx = &src[si..si + src_stride];

                let layer_alpha = if layer.alpha { spx[n] } else { 1.0 };
                let mut a_s = (layer_alpha * opacity).clamp(0.0, 1.0);
                if op == CompositeOp::Dissolve {
                    a_s = if dissolve_noise(x as u32, y as u32) < a_s { 1.0 } else { 0.0 };
                }
                if a_s <= 0.0 {
                    continue;
                }

                let dpx = &mut self.data[di..di + dst_stride];
                let a_b = dpx[n];
                for i in 0..n {
                    cs[i] = to_additive(spx[i], invert);
                    cb[i] = to_additive(dpx[i], invert);
                }

                let a_o;
                if op == CompositeOp::Plus {
                    a_o = (a_s + a_b).min(1.0);
                    for i in 0..n {
                        let co = (a_s * cs[i] + a_b * cb[i]).min(1.0);
                        b[i] = if a_o > 0.0 { (co / a_o).min(1.0) } else { 0.0 };
                    }
                } else {
                    blend_pixel(op, &cs[..n], &cb[..n], &mut b[..n]);
                    a_o = a_s + a_b * (1.0 - a_s);
                    for i in 0..n {
                        let mixed = (1.0 - a_b) * cs[i] + a_b * b[i];
                        let co = a_s * mixed + a_b * cb[i] * (1.0 - a_s);
                        b[i] = (co / a_o).clamp(0.0, 1.0);
                    }
                }

                for i in 0..n {
                    dpx[i] = to_additive(b[i], invert);
                }
                dpx[n] = a_o;
            }
        }
        Ok(())
    }

    /// Converts the surface to an F32 image with alpha.
    pub fn into_image(self) -> ImageData {
        ImageData {
            width: self.width,
            height: self.height,
            colorspace: self.colorspace,
            alpha: true,
            data: cyan_core::PixelData::F32(self.data),
            icc_profile: None,
            label: None,
        }
    }
}

/// Inverts subtractive values; the inversion is its own inverse.
#[inline]
fn to_additive(v: f32, invert: bool) -> f32 {
    if invert { 1.0 - v } else { v }
}

/// Deterministic per-pixel threshold in `[0, 1)` for dissolve.
///
/// SplitMix64 finalizer over the packed coordinates, so the same canvas
/// flattens to the same pixels every time.
#[inline]
pub fn dissolve_noise(x: u32, y: u32) -> f32 {
    let mut h = (((x as u64) << 32) | y as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cyan_core::SampleFormat;

    fn gray(v: f32) -> ImageData {
        ImageData::filled(4, 4, Colorspace::Gray, false, SampleFormat::F32, &[v]).unwrap()
    }

    fn flatten(layers: &[(ImageData, CompositeOp)]) -> ImageData {
        let mut s = Surface::transparent(4, 4, Colorspace::Gray).unwrap();
        for (img, op) in layers {
            s.composite(img, (0, 0), *op, 1.0).unwrap();
        }
        s.into_image()
    }

    #[test]
    fn test_first_layer_over_transparent() {
        let out = flatten(&[(gray(0.3), CompositeOp::Multiply)]);
        assert_eq!(out.pixel(1, 1).unwrap(), vec![0.3, 1.0]);
    }

    #[test]
    fn test_order_matters() {
        let a = flatten(&[(gray(0.5), CompositeOp::Multiply), (gray(0.8), CompositeOp::Screen)]);
        let b = flatten(&[(gray(0.8), CompositeOp::Screen), (gray(0.5), CompositeOp::Multiply)]);
        assert_abs_diff_eq!(a.pixel(0, 0).unwrap()[0], 0.9, epsilon = 1e-5);
        assert_abs_diff_eq!(b.pixel(0, 0).unwrap()[0], 0.4, epsilon = 1e-5);
    }

    #[test]
    fn test_half_opacity_over() {
        let mut s = Surface::transparent(1, 1, Colorspace::Gray).unwrap();
        let black = ImageData::filled(1, 1, Colorspace::Gray, false, SampleFormat::U8, &[0.0]).unwrap();
        let white = ImageData::filled(1, 1, Colorspace::Gray, false, SampleFormat::U8, &[1.0]).unwrap();
        s.composite(&black, (0, 0), CompositeOp::Over, 1.0).unwrap();
        s.composite(&white, (0, 0), CompositeOp::Over, 0.5).unwrap();
        let px = s.into_image().pixel(0, 0).unwrap();
        assert_abs_diff_eq!(px[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(px[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_clips() {
        let mut s = Surface::transparent(4, 4, Colorspace::Gray).unwrap();
        s.composite(&gray(1.0), (2, -2), CompositeOp::Over, 1.0).unwrap();
        let out = s.into_image();
        assert_eq!(out.alpha_at(3, 1), Some(1.0));
        assert_eq!(out.alpha_at(1, 1), Some(0.0));
        assert_eq!(out.alpha_at(3, 2), Some(0.0));
    }

    #[test]
    fn test_cmyk_multiply_adds_ink() {
        let mut s = Surface::transparent(1, 1, Colorspace::Cmyk).unwrap();
        let cyan = ImageData::filled(1, 1, Colorspace::Cmyk, false, SampleFormat::F32, &[0.5, 0.0, 0.0, 0.0]).unwrap();
        s.composite(&cyan, (0, 0), CompositeOp::Over, 1.0).unwrap();
        s.composite(&cyan, (0, 0), CompositeOp::Multiply, 1.0).unwrap();
        let px = s.into_image().pixel(0, 0).unwrap();
        // (1 - 0.5) * (1 - 0.5) = 0.25 paper left, so 0.75 ink
        assert_abs_diff_eq!(px[0], 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(px[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dissolve_deterministic() {
        let half = ImageData::filled(16, 16, Colorspace::Gray, true, SampleFormat::F32, &[1.0, 0.5]).unwrap();
        let run = || {
            let mut s = Surface::transparent(16, 16, Colorspace::Gray).unwrap();
            s.composite(&half, (0, 0), CompositeOp::Dissolve, 1.0).unwrap();
            s.into_image()
        };
        let (a, b) = (run(), run());
        assert_eq!(a, b);
        let opaque = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .filter(|&(x, y)| a.alpha_at(x, y) == Some(1.0))
            .count();
        assert!(opaque > 64 && opaque < 192, "{opaque}");
    }

    #[test]
    fn test_colorspace_mismatch() {
        let mut s = Surface::transparent(4, 4, Colorspace::Rgb).unwrap();
        assert!(matches!(
            s.composite(&gray(0.5), (0, 0), CompositeOp::Over, 1.0),
            Err(OpsError::ColorspaceMismatch { .. })
        ));
    }

    #[test]
    fn test_plus_clamps() {
        let out = flatten(&[(gray(0.7), CompositeOp::Over), (gray(0.6), CompositeOp::Plus)]);
        assert_eq!(out.pixel(0, 0).unwrap(), vec![1.0, 1.0]);
    }
}
