//! Descriptor resolution integration tests.
//!
//! Tests verify:
//! - Each file type maps to its slicer
//! - Folder and TIFF fallbacks
//! - `.txt` indirection, including cycles
//! - Unknown inputs fail with the descriptor in the error

use std::fs;

use ndarray::Array2;

use ct_slicer::resolver::MAX_INDIRECTION_DEPTH;
use ct_slicer::{ElementType, Slice, SlicerError, Slicer, resolve};

use super::test_utils::{
    ramp_u16, write_png_folder, write_tiff_folder, write_tiff_stack, write_txm, write_vgi,
};

// =============================================================================
// Dispatch by type
// =============================================================================

#[test]
fn test_resolve_vgi_and_vol() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "scan", &ramp_u16(3, 4, 4));

    assert!(matches!(resolve(header.as_path()).unwrap(), Slicer::Vgi(_)));
    let slicer = resolve(dir.path().join("scan.vol")).unwrap();
    assert!(matches!(slicer, Slicer::Vgi(_)));
    assert_eq!(slicer.len(), 3);
}

#[test]
fn test_resolve_txm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.TXM");
    write_txm(&path, &ramp_u16(2, 2, 3), None);

    let slicer = resolve(path.as_path()).unwrap();
    assert!(matches!(slicer, Slicer::Txm(_)));
    assert_eq!(slicer.slice_shape(), (2, 3));
}

#[test]
fn test_resolve_tiff_stack() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.tiff");
    write_tiff_stack(&path, &ramp_u16(4, 2, 2));

    let slicer = resolve(path.to_str().unwrap()).unwrap();
    assert!(matches!(slicer, Slicer::TiffStack(_)));
    assert_eq!(slicer.len(), 4);
}

#[test]
fn test_resolve_tiff_folder() {
    let dir = tempfile::tempdir().unwrap();
    write_tiff_folder(dir.path(), &ramp_u16(5, 2, 3));

    let slicer = resolve(dir.path()).unwrap();
    assert!(matches!(slicer, Slicer::Folder(_)));
    assert_eq!(slicer.len(), 5);
    assert_eq!(slicer.element_type(), ElementType::U16);
}

#[test]
fn test_resolve_png_folder_falls_back_to_dominant_type() {
    let dir = tempfile::tempdir().unwrap();
    let planes: Vec<Array2<u8>> = (0..2).map(|z| Array2::from_elem((3, 3), z as u8)).collect();
    write_png_folder(dir.path(), &planes);

    let mut slicer = resolve(dir.path()).unwrap();
    assert!(matches!(slicer, Slicer::Folder(_)));
    assert_eq!(slicer.len(), 2);
    assert_eq!(slicer.slice_at(1).unwrap(), Slice::U8(planes[1].clone()));
}

#[test]
fn test_resolve_corrupt_tiff_is_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.tif");
    fs::write(&path, b"definitely not a tiff").unwrap();

    let err = resolve(path.as_path()).unwrap_err();
    assert!(matches!(err, SlicerError::UnresolvedFormat(ref d) if d.ends_with("broken.tif")));
}

#[test]
fn test_resolve_folder_of_text_is_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x").unwrap();

    assert!(matches!(
        resolve(dir.path()),
        Err(SlicerError::UnresolvedFormat(_))
    ));
}

#[test]
fn test_resolve_missing_file_is_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve(dir.path().join("nothing.here")).unwrap_err();
    assert!(matches!(err, SlicerError::UnresolvedFormat(_)));
}

// =============================================================================
// Indirection
// =============================================================================

#[test]
fn test_txt_chain_resolves_target() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "scan", &ramp_u16(3, 2, 2));
    fs::write(dir.path().join("first.txt"), "second.txt\n").unwrap();
    fs::write(
        dir.path().join("second.txt"),
        header.display().to_string(),
    )
    .unwrap();

    let slicer = resolve(dir.path().join("first.txt")).unwrap();
    assert!(matches!(slicer, Slicer::Vgi(_)));
    assert_eq!(slicer.len(), 3);
}

#[test]
fn test_txt_relative_to_its_folder() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();
    write_tiff_stack(&data_dir.join("stack.tif"), &ramp_u16(2, 2, 2));
    fs::write(data_dir.join("pointer.txt"), "  stack.tif  ").unwrap();

    let slicer = resolve(data_dir.join("pointer.txt")).unwrap();
    assert!(matches!(slicer, Slicer::TiffStack(_)));
}

#[test]
fn test_txt_self_reference_is_too_deep() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.txt");
    fs::write(&path, "loop.txt").unwrap();

    let err = resolve(path.as_path()).unwrap_err();
    assert!(matches!(
        err,
        SlicerError::IndirectionTooDeep { depth, .. } if depth == MAX_INDIRECTION_DEPTH
    ));
}

#[test]
fn test_txt_cycle_is_too_deep() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "b.txt").unwrap();
    fs::write(dir.path().join("b.txt"), "a.txt").unwrap();

    assert!(matches!(
        resolve(dir.path().join("a.txt")),
        Err(SlicerError::IndirectionTooDeep { .. })
    ));
}
