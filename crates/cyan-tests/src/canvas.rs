//! Layer stack invariants and flattening.

use crate::{ramp, solid};
use approx::assert_abs_diff_eq;
use cyan_canvas::{Canvas, CanvasError, ErrorKind, LayerId};
use cyan_core::{Colorspace, SampleFormat};
use cyan_ops::CompositeOp;

fn assert_contiguous(c: &Canvas) {
    for (i, layer) in c.layers().iter().enumerate() {
        assert_eq!(layer.position(), i, "layer {} out of place", layer.id());
    }
    let mut ids: Vec<LayerId> = c.layers().iter().map(|l| l.id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), c.layer_count(), "duplicate ids");
}

/// Small deterministic generator so the sequence is the same every run.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

#[test]
fn positions_stay_contiguous_under_random_edits() {
    let mut c = Canvas::new(8, 8, Colorspace::Rgb, None).unwrap();
    let mut rng = Lcg(42);
    let mut seen_ids = Vec::new();
    for step in 0..300 {
        let len = c.layer_count();
        match rng.next(3) {
            0 => {
                let at = rng.next(len + 1);
                let id = c
                    .add_layer(solid(4, 4, Colorspace::Rgb, SampleFormat::U8, 0.5), Some(at))
                    .unwrap();
                assert!(!seen_ids.contains(&id), "id {id} reused at step {step}");
                seen_ids.push(id);
                assert_eq!(c.layer(id).unwrap().position(), at);
            }
            1 => {
                let id = c.layers()[rng.next(len)].id();
                match c.remove_layer(id) {
                    Ok(_) => assert_eq!(c.layer_count(), len - 1),
                    Err(CanvasError::LastLayer) => assert_eq!(len, 1),
                    Err(e) => panic!("unexpected {e}"),
                }
            }
            _ => {
                let id = c.layers()[rng.next(len)].id();
                let to = rng.next(len);
                c.reorder(id, to).unwrap();
                assert_eq!(c.layer(id).unwrap().position(), to);
            }
        }
        assert_contiguous(&c);
    }
}

#[test]
fn reorder_shifts_intervening_layers() {
    let mut c = Canvas::new(4, 4, Colorspace::Gray, None).unwrap();
    let ids: Vec<_> = (0..4)
        .map(|_| c.add_layer(solid(4, 4, Colorspace::Gray, SampleFormat::U8, 0.1), None).unwrap())
        .collect();
    // [bg, a, b, c, d] -> move d to 1 -> [bg, d, a, b, c]
    c.reorder(ids[3], 1).unwrap();
    let order: Vec<_> = c.layers().iter().skip(1).map(|l| l.id()).collect();
    assert_eq!(order, vec![ids[3], ids[0], ids[1], ids[2]]);
    assert_contiguous(&c);
}

#[test]
fn last_layer_cannot_be_removed() {
    let mut c = Canvas::new(4, 4, Colorspace::Cmyk, None).unwrap();
    let extra = c
        .add_layer(solid(4, 4, Colorspace::Cmyk, SampleFormat::U8, 0.2), None)
        .unwrap();
    c.remove_layer(extra).unwrap();

    let only = c.layers()[0].id();
    let before = c.clone();
    let err = c.remove_layer(only).unwrap_err();
    assert!(matches!(err, CanvasError::LastLayer));
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert_eq!(c, before);
}

#[test]
fn unknown_layer_is_reported() {
    let mut c = Canvas::new(4, 4, Colorspace::Gray, None).unwrap();
    let id = c
        .add_layer(solid(4, 4, Colorspace::Gray, SampleFormat::U8, 0.2), None)
        .unwrap();
    c.remove_layer(id).unwrap();
    for err in [
        c.set_opacity(id, 0.5).unwrap_err(),
        c.set_visible(id, false).unwrap_err(),
        c.reorder(id, 0).unwrap_err(),
        c.remove_layer(id).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::LayerNotFound);
    }
}

#[test]
fn opacity_is_clamped_and_exact() {
    let mut c = Canvas::new(4, 4, Colorspace::Rgb, None).unwrap();
    let id = c.layers()[0].id();
    assert_eq!(c.set_opacity(id, -0.5).unwrap(), 0.0);
    assert_eq!(c.layer(id).unwrap().opacity(), 0.0);
    assert_eq!(c.set_opacity(id, 1.7).unwrap(), 1.0);
    assert_eq!(c.layer(id).unwrap().opacity(), 1.0);
    assert_eq!(c.set_opacity(id, 0.42).unwrap(), 0.42);
    assert_eq!(c.layer(id).unwrap().opacity(), 0.42);
}

fn two_layer_gray(first: (f32, CompositeOp), second: (f32, CompositeOp)) -> f32 {
    let base = solid(4, 4, Colorspace::Gray, SampleFormat::F32, first.0);
    let mut c = Canvas::from_image(base, None).unwrap();
    let bottom = c.layers()[0].id();
    c.set_composite(bottom, first.1).unwrap();
    let top = c
        .add_layer(solid(4, 4, Colorspace::Gray, SampleFormat::F32, second.0), None)
        .unwrap();
    c.set_composite(top, second.1).unwrap();
    c.flatten().unwrap().pixel(2, 2).unwrap()[0]
}

#[test]
fn flatten_order_matters_for_non_commutative_ops() {
    let a = two_layer_gray((0.5, CompositeOp::Multiply), (0.8, CompositeOp::Screen));
    let b = two_layer_gray((0.8, CompositeOp::Screen), (0.5, CompositeOp::Multiply));
    assert_abs_diff_eq!(a, 0.9, epsilon = 1e-5);
    assert_abs_diff_eq!(b, 0.4, epsilon = 1e-5);
}

#[test]
fn flatten_order_irrelevant_for_commutative_ops() {
    for op in CompositeOp::ALL.into_iter().filter(|op| op.is_commutative()) {
        let a = two_layer_gray((0.3, op), (0.6, op));
        let b = two_layer_gray((0.6, op), (0.3, op));
        assert_abs_diff_eq!(a, b, epsilon = 1e-5);
    }
}

#[test]
fn reorder_changes_flatten() {
    let base = solid(4, 4, Colorspace::Gray, SampleFormat::F32, 0.5);
    let mut c = Canvas::from_image(base, None).unwrap();
    let bottom = c.layers()[0].id();
    c.set_composite(bottom, CompositeOp::Multiply).unwrap();
    let top = c
        .add_layer(solid(4, 4, Colorspace::Gray, SampleFormat::F32, 0.8), None)
        .unwrap();
    c.set_composite(top, CompositeOp::Screen).unwrap();
    let before = c.flatten().unwrap().pixel(0, 0).unwrap()[0];
    c.reorder(top, 0).unwrap();
    let after = c.flatten().unwrap().pixel(0, 0).unwrap()[0];
    assert_abs_diff_eq!(before, 0.9, epsilon = 1e-5);
    assert_abs_diff_eq!(after, 0.4, epsilon = 1e-5);
}

#[test]
fn flatten_respects_visibility_opacity_and_offset() {
    let mut c = Canvas::new(4, 1, Colorspace::Gray, None).unwrap();
    let black = c
        .add_layer(solid(4, 1, Colorspace::Gray, SampleFormat::F32, 0.0), None)
        .unwrap();
    let white = c
        .add_layer(solid(2, 1, Colorspace::Gray, SampleFormat::F32, 1.0), None)
        .unwrap();
    c.set_offset(white, 2, 0).unwrap();
    c.set_opacity(white, 0.5).unwrap();

    let flat = c.flatten().unwrap();
    assert_abs_diff_eq!(flat.pixel(0, 0).unwrap()[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(flat.pixel(3, 0).unwrap()[0], 0.5, epsilon = 1e-6);

    c.set_visible(black, false).unwrap();
    let flat = c.flatten().unwrap();
    assert_eq!(flat.alpha_at(0, 0), Some(0.0));
    assert_abs_diff_eq!(flat.alpha_at(3, 0).unwrap(), 0.5, epsilon = 1e-6);
}

#[test]
fn flatten_ramp_over_transparent_keeps_straight_color() {
    let mut c = Canvas::new(8, 2, Colorspace::Rgb, None).unwrap();
    let layer = ramp(8, 2, Colorspace::Rgb, SampleFormat::F32);
    let expected = layer.pixel(5, 1).unwrap();
    c.add_layer(layer, None).unwrap();
    let px = c.flatten().unwrap().pixel(5, 1).unwrap();
    for (got, want) in px.iter().zip(&expected) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
    }
}
