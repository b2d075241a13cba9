//! Pixel conversion between ICC profiles.
//!
//! Color channels go through a Little CMS float transform; alpha samples are
//! copied through untouched. The output keeps the sample format of the input
//! and embeds the destination profile.

use crate::{ColorProfile, IccError, IccResult, Intent};
use cyan_core::{Colorspace, ImageData, PixelData};
use lcms2::{Flags, PixelFormat, Profile as LcmsProfile, Transform};

/// Float pixel layouts Little CMS reads and writes.
///
/// CMYK floats are ink percentages (0..100) in Little CMS, so the layout
/// carries its own scale.
trait Pixel: Copy + Default + lcms2::Pod + 'static {
    const CHANNELS: usize;
    const FORMAT: PixelFormat;
    const SCALE: f32;

    fn load(src: &[f32]) -> Self;
    fn store(self, dst: &mut [f32]);
}

macro_rules! impl_pixel {
    ($n:literal, $format:expr, $scale:expr) => {
        impl Pixel for [f32; $n] {
            const CHANNELS: usize = $n;
            const FORMAT: PixelFormat = $format;
            const SCALE: f32 = $scale;

            #[inline]
            fn load(src: &[f32]) -> Self {
                let mut px = [0.0; $n];
                for (d, s) in px.iter_mut().zip(src) {
                    *d = *s * Self::SCALE;
                }
                px
            }

            #[inline]
            fn store(self, dst: &mut [f32]) {
                for (d, s) in dst.iter_mut().zip(self) {
                    *d = (s / Self::SCALE).clamp(0.0, 1.0);
                }
            }
        }
    };
}

impl_pixel!(1, PixelFormat::GRAY_FLT, 1.0);
impl_pixel!(3, PixelFormat::RGB_FLT, 1.0);
impl_pixel!(4, PixelFormat::CMYK_FLT, 100.0);

/// Converts the color channels of `image` from `source` to `dest`.
///
/// The source profile is, in order of preference: `source`, the profile
/// embedded in the image, or the built-in profile for the image colorspace
/// (sRGB, gray 2.2). CMYK images with neither fail with
/// [`IccError::MissingProfile`].
///
/// The result is in the colorspace `dest` declares, has the same geometry,
/// alpha flag, sample format and label, and embeds `dest`.
///
/// # Errors
///
/// - [`IccError::InvalidProfile`] when a profile cannot be opened or the
///   destination declares no usable colorspace
/// - [`IccError::ColorSpaceMismatch`] when the source profile does not
///   describe the image colorspace
/// - [`IccError::TransformFailed`] when Little CMS refuses the pair
pub fn convert_image(
    image: &ImageData,
    source: Option<&ColorProfile>,
    dest: &ColorProfile,
    intent: Intent,
    black_point: bool,
) -> IccResult<ImageData> {
    let source = resolve_source(image, source)?;
    if !source.matches(image.colorspace) {
        return Err(IccError::ColorSpaceMismatch {
            expected: image.colorspace.to_string(),
            actual: source.info().colorspace.to_string(),
        });
    }
    let dest_cs = dest.info().colorspace.colorspace().ok_or_else(|| {
        IccError::InvalidProfile(format!(
            "destination profile '{}' has unsupported colorspace",
            dest.description()
        ))
    })?;

    if source == *dest {
        let mut out = image.clone();
        out.icc_profile = Some(dest.shared_bytes());
        return Ok(out);
    }

    tracing::debug!(
        from = %image.colorspace,
        to = %dest_cs,
        %intent,
        black_point,
        width = image.width,
        height = image.height,
        "converting pixels"
    );

    let src_lcms = source.lcms()?;
    let dst_lcms = dest.lcms()?;
    let src = image.to_f32();
    let ctx = Run {
        src: &src,
        src_lcms: &src_lcms,
        dst_lcms: &dst_lcms,
        pixels: image.pixel_count(),
        alpha: image.alpha,
        intent,
        black_point,
    };

    let out = match (image.colorspace, dest_cs) {
        (Colorspace::Gray, Colorspace::Gray) => ctx.run::<[f32; 1], [f32; 1]>(),
        (Colorspace::Gray, Colorspace::Rgb) => ctx.run::<[f32; 1], [f32; 3]>(),
        (Colorspace::Gray, Colorspace::Cmyk) => ctx.run::<[f32; 1], [f32; 4]>(),
        (Colorspace::Rgb, Colorspace::Gray) => ctx.run::<[f32; 3], [f32; 1]>(),
        (Colorspace::Rgb, Colorspace::Rgb) => ctx.run::<[f32; 3], [f32; 3]>(),
        (Colorspace::Rgb, Colorspace::Cmyk) => ctx.run::<[f32; 3], [f32; 4]>(),
        (Colorspace::Cmyk, Colorspace::Gray) => ctx.run::<[f32; 4], [f32; 1]>(),
        (Colorspace::Cmyk, Colorspace::Rgb) => ctx.run::<[f32; 4], [f32; 3]>(),
        (Colorspace::Cmyk, Colorspace::Cmyk) => ctx.run::<[f32; 4], [f32; 4]>(),
    }?;

    let mut converted = ImageData::from_data(
        image.width,
        image.height,
        dest_cs,
        image.alpha,
        PixelData::from_f32(image.format(), &out),
    )
    .map_err(|e| IccError::TransformFailed(e.to_string()))?;
    converted.icc_profile = Some(dest.shared_bytes());
    converted.label = image.label.clone();
    Ok(converted)
}

fn resolve_source(image: &ImageData, given: Option<&ColorProfile>) -> IccResult<ColorProfile> {
    if let Some(p) = given {
        return Ok(p.clone());
    }
    if let Some(bytes) = &image.icc_profile {
        return ColorProfile::from_icc(bytes.clone());
    }
    ColorProfile::builtin(image.colorspace)?
        .ok_or_else(|| IccError::MissingProfile(image.colorspace.to_string()))
}

struct Run<'a> {
    src: &'a [f32],
    src_lcms: &'a LcmsProfile,
    dst_lcms: &'a LcmsProfile,
    pixels: usize,
    alpha: bool,
    intent: Intent,
    black_point: bool,
}

impl Run<'_> {
    fn run<I: Pixel, O: Pixel>(&self) -> IccResult<Vec<f32>> {
        let flags = if self.black_point {
            Flags::BLACKPOINT_COMPENSATION
        } else {
            Flags::default()
        };
        let transform: Transform<I, O> = Transform::new_flags(
            self.src_lcms,
            I::FORMAT,
            self.dst_lcms,
            O::FORMAT,
            self.intent.into(),
            flags,
        )
        .map_err(|e| IccError::TransformFailed(e.to_string()))?;

        let extra = self.alpha as usize;
        let in_stride = I::CHANNELS + extra;
        let out_stride = O::CHANNELS + extra;

        let input: Vec<I> = self
            .src
            .chunks_exact(in_stride)
            .map(|px| I::load(&px[..I::CHANNELS]))
            .collect();
        let mut output = vec![O::default(); self.pixels];
        transform.transform_pixels(&input, &mut output);

        let mut out = vec![0.0f32; self.pixels * out_stride];
        for ((dst, px), src) in out
            .chunks_exact_mut(out_stride)
            .zip(output)
            .zip(self.src.chunks_exact(in_stride))
        {
            px.store(&mut dst[..O::CHANNELS]);
            if self.alpha {
                dst[O::CHANNELS] = src[I::CHANNELS];
            }
        }
        Ok(out)
    }
}
