//! Profile discovery.

use crate::write_file;
use cyan_core::Colorspace;
use cyan_icc::{ColorProfile, ProfileCatalog, ProfileEntry};
use std::collections::HashSet;

fn assert_unique(entries: &[ProfileEntry]) {
    let set: HashSet<_> = entries.iter().collect();
    assert_eq!(set.len(), entries.len(), "duplicates in {entries:?}");
}

#[test]
fn scan_filters_by_colorspace() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.icc", ColorProfile::srgb().unwrap().bytes());
    write_file(dir.path(), "b.icm", ColorProfile::gray(1.8).unwrap().bytes());
    write_file(dir.path(), "c.icc", ColorProfile::gray(2.2).unwrap().bytes());
    write_file(dir.path(), "broken.icc", b"\0\0\0\0acsp");

    let catalog = ProfileCatalog::new([dir.path()]);
    let gray: Vec<_> = catalog.list(Colorspace::Gray).collect();
    assert_eq!(gray.len(), 2);
    assert_unique(&gray);
    assert_eq!(catalog.list(Colorspace::Rgb).count(), 1);
    assert_eq!(catalog.list(Colorspace::Cmyk).count(), 0);
}

#[cfg(unix)]
#[test]
fn scan_never_repeats_through_symlinks() {
    use std::os::unix::fs::symlink;

    let root = tempfile::tempdir().unwrap();
    let real = root.path().join("real");
    let nested = real.join("nested");
    std::fs::create_dir_all(&nested).unwrap();
    write_file(&real, "srgb.icc", ColorProfile::srgb().unwrap().bytes());
    write_file(&nested, "gray.icc", ColorProfile::gray(2.2).unwrap().bytes());

    // directory alias, loop back to the parent, and a file alias
    let alias = root.path().join("alias");
    symlink(&real, &alias).unwrap();
    symlink(&real, nested.join("loop")).unwrap();
    let other = root.path().join("other");
    std::fs::create_dir(&other).unwrap();
    symlink(real.join("srgb.icc"), other.join("copy.icc")).unwrap();

    let catalog = ProfileCatalog::new([real.clone(), alias, other, real]);
    let mut scan = catalog.list(Colorspace::Rgb);
    let rgb: Vec<_> = scan.by_ref().collect();
    assert_eq!(rgb.len(), 1, "{rgb:?}");

    scan.restart();
    assert_eq!(scan.count(), 1);

    let gray: Vec<_> = catalog.list(Colorspace::Gray).collect();
    assert_eq!(gray.len(), 1);
    assert_unique(&gray);
}

#[test]
fn missing_directories_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "srgb.icc", ColorProfile::srgb().unwrap().bytes());
    let catalog = ProfileCatalog::new([dir.path().join("absent"), dir.path().to_path_buf()]);
    assert_eq!(catalog.list(Colorspace::Rgb).count(), 1);
}
