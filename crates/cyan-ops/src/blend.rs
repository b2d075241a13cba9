//! Blend functions.
//!
//! All functions take straight (non-premultiplied) color in additive form:
//! larger values are lighter. Subtractive colorspaces are inverted by the
//! caller before blending and inverted back afterwards.
//!
//! Separable modes follow the W3C compositing formulas, with `cs` the source
//! (layer) value and `cb` the backdrop value.

use crate::CompositeOp;

/// Maximum color channels of any colorspace (CMYK).
pub const MAX_CHANNELS: usize = 4;

/// Separable blend of one channel.
///
/// Non-separable operators fall back to the source value; use
/// [`blend_pixel`] for those.
#[inline]
pub fn blend_channel(op: CompositeOp, cs: f32, cb: f32) -> f32 {
    match op {
        CompositeOp::Over | CompositeOp::Dissolve | CompositeOp::Plus => cs,
        CompositeOp::Multiply => cs * cb,
        CompositeOp::Screen => screen(cs, cb),
        CompositeOp::Overlay => hard_light(cb, cs),
        CompositeOp::Darken => cs.min(cb),
        CompositeOp::Lighten => cs.max(cb),
        CompositeOp::ColorDodge => color_dodge(cs, cb),
        CompositeOp::ColorBurn => color_burn(cs, cb),
        CompositeOp::LinearDodge => (cs + cb).min(1.0),
        CompositeOp::LinearBurn => (cs + cb - 1.0).max(0.0),
        CompositeOp::HardLight => hard_light(cs, cb),
        CompositeOp::SoftLight => soft_light(cs, cb),
        CompositeOp::VividLight => {
            if cs <= 0.5 {
                color_burn(2.0 * cs, cb)
            } else {
                color_dodge(2.0 * (cs - 0.5), cb)
            }
        }
        CompositeOp::PegtopLight => 2.0 * cs * cb + cb * cb * (1.0 - 2.0 * cs),
        CompositeOp::PinLight => {
            if cs <= 0.5 {
                cb.min(2.0 * cs)
            } else {
                cb.max(2.0 * cs - 1.0)
            }
        }
        CompositeOp::LinearLight => (cb + 2.0 * cs - 1.0).clamp(0.0, 1.0),
        CompositeOp::Difference => (cb - cs).abs(),
        CompositeOp::Exclusion => cs + cb - 2.0 * cs * cb,
        CompositeOp::MinusSrc => (cb - cs).max(0.0),
        CompositeOp::DivideSrc => {
            if cs <= 0.0 {
                if cb > 0.0 { 1.0 } else { 0.0 }
            } else {
                (cb / cs).min(1.0)
            }
        }
        CompositeOp::LightenIntensity
        | CompositeOp::DarkenIntensity
        | CompositeOp::Hue
        | CompositeOp::Saturate => cs,
    }
}

/// Blends a whole pixel of `n` color channels into `out`.
///
/// `n` is 1 (gray), 3 (RGB) or 4 (inverted CMYK). Hue and saturation modes
/// have nothing to work with on gray and keep the backdrop; on CMYK they
/// act on the inverted CMY triple and keep the backdrop black.
pub fn blend_pixel(op: CompositeOp, cs: &[f32], cb: &[f32], out: &mut [f32]) {
    let n = cs.len();
    match op {
        CompositeOp::LightenIntensity | CompositeOp::DarkenIntensity => {
            let (ls, lb) = (intensity(cs), intensity(cb));
            let pick_src = if op == CompositeOp::LightenIntensity { ls > lb } else { ls < lb };
            out[..n].copy_from_slice(if pick_src { cs } else { cb });
        }
        CompositeOp::Hue | CompositeOp::Saturate if n >= 3 => {
            let s = [cs[0], cs[1], cs[2]];
            let b = [cb[0], cb[1], cb[2]];
            let rgb = if op == CompositeOp::Hue {
                set_lum(set_sat(s, sat(b)), lum(b))
            } else {
                set_lum(set_sat(b, sat(s)), lum(b))
            };
            out[..3].copy_from_slice(&rgb);
            if n == 4 {
                out[3] = cb[3];
            }
        }
        CompositeOp::Hue | CompositeOp::Saturate => out[..n].copy_from_slice(cb),
        _ => {
            for i in 0..n {
                out[i] = blend_channel(op, cs[i], cb[i]);
            }
        }
    }
}

#[inline]
fn screen(cs: f32, cb: f32) -> f32 {
    cs + cb - cs * cb
}

#[inline]
fn hard_light(cs: f32, cb: f32) -> f32 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        screen(2.0 * cs - 1.0, cb)
    }
}

#[inline]
fn color_dodge(cs: f32, cb: f32) -> f32 {
    if cb <= 0.0 {
        0.0
    } else if cs >= 1.0 {
        1.0
    } else {
        (cb / (1.0 - cs)).min(1.0)
    }
}

#[inline]
fn color_burn(cs: f32, cb: f32) -> f32 {
    if cb >= 1.0 {
        1.0
    } else if cs <= 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - cb) / cs).min(1.0)
    }
}

#[inline]
fn soft_light(cs: f32, cb: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (d - cb)
    }
}

/// Luminosity used by the intensity modes.
///
/// For four channels (inverted CMYK) the CMY triple is scaled by the
/// inverted black first.
fn intensity(c: &[f32]) -> f32 {
    match c.len() {
        1 => c[0],
        3 => lum([c[0], c[1], c[2]]),
        _ => lum([c[0] * c[3], c[1] * c[3], c[2] * c[3]]),
    }
}

#[inline]
fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 && x - l > f32::EPSILON {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

#[inline]
fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let (min, mid, max) = (idx[0], idx[1], idx[2]);
    let mut out = [0.0; 3];
    if c[max] > c[min] {
        out[mid] = (c[mid] - c[min]) * s / (c[max] - c[min]);
        out[max] = s;
    }
    out
}
