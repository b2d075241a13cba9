//! Color conversion of whole canvases.

use crate::{ramp, solid, write_file};
use cyan_canvas::{Canvas, ErrorKind, Session, Settings};
use cyan_core::{Colorspace, ImageData, PixelData, SampleFormat};
use cyan_icc::{ColorProfile, Intent, convert_image};

fn rgb_canvas() -> Canvas {
    let mut c = Canvas::from_image(ramp(16, 4, Colorspace::Rgb, SampleFormat::U8), None).unwrap();
    c.add_layer(solid(8, 8, Colorspace::Rgb, SampleFormat::U16, 0.35), None).unwrap();
    c.add_layer(ramp(4, 4, Colorspace::Rgb, SampleFormat::F32), Some(1)).unwrap();
    c
}

#[test]
fn converting_to_own_profile_is_byte_identical() {
    let c = rgb_canvas();
    let profile = c.profile().unwrap().clone();
    for intent in Intent::ALL {
        let same = c.convert_colorspace(Colorspace::Rgb, &profile, intent, true).unwrap();
        assert_eq!(same, c);
        for (a, b) in same.layers().iter().zip(c.layers()) {
            assert_eq!(a.image().data, b.image().data);
        }
    }
}

#[test]
fn image_transform_identity() {
    let srgb = ColorProfile::srgb().unwrap();
    let image = ramp(8, 2, Colorspace::Rgb, SampleFormat::U16).with_icc_profile(srgb.shared_bytes());
    let out = convert_image(&image, Some(&srgb), &srgb, Intent::Perceptual, false).unwrap();
    assert_eq!(out, image);
}

#[test]
fn conversion_preserves_geometry_and_alpha() {
    let c = rgb_canvas();
    let gray = ColorProfile::gray(2.2).unwrap();
    let g = c.convert_colorspace(Colorspace::Gray, &gray, Intent::Relative, true).unwrap();
    assert_eq!(g.colorspace(), Colorspace::Gray);
    assert_eq!(g.profile(), Some(&gray));
    assert_eq!(g.snapshot(), c.snapshot());
    for (after, before) in g.layers().iter().zip(c.layers()) {
        let (a, b) = (after.image(), before.image());
        assert_eq!((a.width, a.height, a.alpha, a.format()), (b.width, b.height, b.alpha, b.format()));
        assert_eq!(a.colorspace, Colorspace::Gray);
        if b.alpha {
            for x in 0..b.width {
                assert_eq!(a.alpha_at(x, 0), b.alpha_at(x, 0));
            }
        }
    }
}

#[test]
fn gray_round_trip_is_close() {
    let base = solid(4, 4, Colorspace::Gray, SampleFormat::F32, 0.4);
    let c = Canvas::from_image(base, None).unwrap();
    let gray = c.profile().unwrap().clone();
    let srgb = ColorProfile::srgb().unwrap();
    let rgb = c.convert_colorspace(Colorspace::Rgb, &srgb, Intent::Relative, false).unwrap();
    let back = rgb.convert_colorspace(Colorspace::Gray, &gray, Intent::Relative, false).unwrap();
    let v = back.layers()[0].image().pixel(1, 1).unwrap()[0];
    assert!((v - 0.4).abs() < 0.02, "{v}");
}

#[test]
fn failed_conversion_leaves_canvas_untouched() {
    // unprofiled CMYK: every layer fails for lack of a source profile
    let mut c = Canvas::new(4, 4, Colorspace::Cmyk, None).unwrap();
    c.add_layer(solid(4, 4, Colorspace::Cmyk, SampleFormat::U8, 0.3), None).unwrap();
    let before = c.clone();
    let err = c
        .convert_colorspace(Colorspace::Rgb, &ColorProfile::srgb().unwrap(), Intent::Perceptual, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ColorTransform);
    assert_eq!(c, before);

    // destination profile for the wrong colorspace
    let c = rgb_canvas();
    let before = c.clone();
    let err = c
        .convert_colorspace(Colorspace::Cmyk, &ColorProfile::srgb().unwrap(), Intent::Perceptual, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Profile);
    assert_eq!(c, before);
}

#[test]
fn session_keeps_view_on_failed_conversion() {
    let mut session = Session::new(Settings::default());
    let view = session.new_canvas(4, 4, Colorspace::Cmyk).unwrap().value;
    let before = session.canvas(view).unwrap().clone();
    assert!(session.convert(view, Colorspace::Rgb, None, None, None).is_err());
    assert_eq!(session.canvas(view), Some(&before));
}

#[test]
fn open_without_profile_uses_configured_default() {
    let dir = tempfile::tempdir().unwrap();
    let g18 = ColorProfile::gray(1.8).unwrap();
    let icc = write_file(dir.path(), "gray18.icc", g18.bytes());
    let image = solid(4, 4, Colorspace::Gray, SampleFormat::U8, 0.5);
    let png = dir.path().join("plain.png");
    cyan_io::write(&png, &image).unwrap();

    let mut settings = Settings::default();
    settings.color.gray_profile = Some(icc);
    let mut session = Session::new(settings);
    let out = session.open(&png).unwrap();
    assert!(out.has_warnings());
    let canvas = session.canvas(out.value).unwrap();
    assert_eq!(canvas.profile(), Some(&g18));
    assert_eq!(canvas.layers()[0].image().icc_profile.as_deref(), Some(g18.bytes()));
}

#[test]
fn open_cmyk_without_any_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let image = ImageData::from_data(
        2,
        2,
        Colorspace::Cmyk,
        false,
        PixelData::U8(vec![0, 64, 128, 255].repeat(4)),
    )
    .unwrap();
    let tif = dir.path().join("plate.tif");
    cyan_io::write(&tif, &image).unwrap();

    let mut session = Session::new(Settings::default());
    let err = session.open(&tif).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Profile);
    assert_eq!(session.views().count(), 0);
}

#[test]
fn embedded_profile_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let g18 = ColorProfile::gray(1.8).unwrap();
    let image = solid(4, 4, Colorspace::Gray, SampleFormat::U8, 0.5).with_icc_profile(g18.shared_bytes());
    let tif = dir.path().join("tagged.tif");
    cyan_io::write(&tif, &image).unwrap();

    let mut session = Session::new(Settings::default());
    let out = session.open(&tif).unwrap();
    assert!(!out.has_warnings());
    assert_eq!(session.canvas(out.value).unwrap().profile(), Some(&g18));
}
