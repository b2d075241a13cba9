//! Project files end to end.

use crate::{ramp, solid, write_file};
use cyan_canvas::{Canvas, ErrorKind, Session, Settings, project};
use cyan_core::{Colorspace, SampleFormat};
use cyan_icc::{ColorProfile, ProfileCache};
use cyan_ops::CompositeOp;

fn layered(cs: Colorspace, profile: Option<ColorProfile>) -> Canvas {
    let mut c = Canvas::new(12, 8, cs, profile).unwrap();
    c.set_label("layered");
    let a = c.add_layer(ramp(12, 8, cs, SampleFormat::U8), None).unwrap();
    let b = c.add_layer(solid(6, 3, cs, SampleFormat::U16, 0.7), None).unwrap();
    let d = c.add_layer(ramp(5, 5, cs, SampleFormat::F32), Some(1)).unwrap();
    c.set_composite(a, CompositeOp::Multiply).unwrap();
    c.set_composite(b, CompositeOp::DivideSrc).unwrap();
    c.set_composite(d, CompositeOp::Hue).unwrap();
    c.set_opacity(b, 0.42).unwrap();
    c.set_opacity(d, 1.0 / 3.0).unwrap();
    c.set_visible(a, false).unwrap();
    c.set_offset(b, -3, 5).unwrap();
    c.set_layer_label(d, "tint").unwrap();
    c
}

#[test]
fn round_trip_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgb.cyan");
    let c = layered(Colorspace::Rgb, None);
    project::write(&c, &path).unwrap();
    assert!(project::is_project_file(&path));

    let back = project::read(&path, &ProfileCache::new()).unwrap();
    assert_eq!(back.colorspace(), c.colorspace());
    assert_eq!(back.profile().map(ColorProfile::bytes), c.profile().map(ColorProfile::bytes));
    assert_eq!(back.layer_count(), 4);
    assert_eq!(back.snapshot(), c.snapshot());
    for (a, b) in back.layers().iter().zip(c.layers()) {
        assert_eq!(a.image(), b.image());
    }
    assert_eq!(back.layers()[3].opacity(), 0.42);
    assert_eq!(back.flatten().unwrap(), c.flatten().unwrap());
    assert_eq!(back, c);
}

#[test]
fn round_trip_gray_with_custom_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.cyan");
    let g18 = ColorProfile::gray(1.8).unwrap();
    let c = layered(Colorspace::Gray, Some(g18.clone()));
    project::write(&c, &path).unwrap();
    let back = project::read(&path, &ProfileCache::new()).unwrap();
    assert_eq!(back.profile(), Some(&g18));
    assert_eq!(back, c);
}

#[test]
fn round_trip_unprofiled_cmyk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmyk.cyan");
    let c = layered(Colorspace::Cmyk, None);
    assert!(c.profile().is_none());
    project::write(&c, &path).unwrap();
    assert_eq!(project::read(&path, &ProfileCache::new()).unwrap(), c);
}

#[test]
fn overwrite_keeps_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.cyan");
    project::write(&layered(Colorspace::Rgb, None), &path).unwrap();
    let mut smaller = layered(Colorspace::Rgb, None);
    let top = smaller.layers()[3].id();
    smaller.remove_layer(top).unwrap();
    project::write(&smaller, &path).unwrap();
    assert_eq!(project::read(&path, &ProfileCache::new()).unwrap().layer_count(), 3);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn corrupt_files_are_rejected_whole() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.cyan");
    project::write(&layered(Colorspace::Rgb, None), &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();

    for cut in [0, 7, 19, 40, bytes.len() / 2, bytes.len() - 1] {
        let err = project::parse(&bytes[..cut], &ProfileCache::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure, "cut at {cut}");
    }

    let mut flipped = bytes.clone();
    flipped[1] = b'X';
    assert_eq!(project::parse(&flipped, &ProfileCache::new()).unwrap_err().kind(), ErrorKind::Structure);

    let junk = write_file(dir.path(), "junk.cyan", b"not a project at all");
    assert!(!project::is_project_file(&junk));
    assert_eq!(project::read(&junk, &ProfileCache::new()).unwrap_err().kind(), ErrorKind::Structure);
}

#[test]
fn session_round_trip_through_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.cyan");
    let c = layered(Colorspace::Rgb, None);
    project::write(&c, &path).unwrap();

    let mut session = Session::new(Settings::default());
    let view = session.open(&path).unwrap().value;
    assert_eq!(session.canvas(view), Some(&c));

    let id = c.layers()[2].id();
    session.edit(view, |canvas| canvas.set_opacity(id, 0.25)).unwrap();
    session.save_project(view, None).unwrap();
    let reread = project::read(&path, &ProfileCache::new()).unwrap();
    assert_eq!(reread.layer(id).unwrap().opacity(), 0.25);
}

#[test]
fn layer_ids_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.cyan");
    let mut c = layered(Colorspace::Gray, None);
    let newest = c.layers().iter().map(|l| l.id()).max().unwrap();
    c.remove_layer(newest).unwrap();
    project::write(&c, &path).unwrap();

    let mut back = project::read(&path, &ProfileCache::new()).unwrap();
    assert_eq!(back, c);
    let added = back.add_layer(solid(2, 2, Colorspace::Gray, SampleFormat::U8, 0.5), None).unwrap();
    assert!(added > newest);
}

#[test]
fn projects_share_cached_profile() {
    let dir = tempfile::tempdir().unwrap();
    let g18 = ColorProfile::gray(1.8).unwrap();
    let (a, b) = (dir.path().join("a.cyan"), dir.path().join("b.cyan"));
    project::write(&layered(Colorspace::Gray, Some(g18.clone())), &a).unwrap();
    project::write(&Canvas::new(3, 3, Colorspace::Gray, Some(g18.clone())).unwrap(), &b).unwrap();

    let mut session = Session::new(Settings::default());
    let va = session.open(&a).unwrap().value;
    let vb = session.open(&b).unwrap().value;
    assert_eq!(session.cache().len(), 1);
    let pa = session.canvas(va).unwrap().profile().unwrap().shared_bytes();
    let pb = session.canvas(vb).unwrap().profile().unwrap().shared_bytes();
    assert!(std::sync::Arc::ptr_eq(&pa, &pb));
    assert_eq!(&*pa, g18.bytes());
}
