//! Slicer integration tests.
//!
//! Tests verify:
//! - Every on-disk format reports its length, shape and element type
//! - Slices come back in order and in the volume's own type
//! - Out-of-range indices are rejected without touching the source
//! - Reads are repeatable

use std::fs;
use std::io::Write;

use ndarray::{Array2, Axis, s};

use ct_slicer::slicer::{FolderSlicer, TIFF_EXTENSIONS, TiffStackSlicer, TxmSlicer, VgiSlicer};
use ct_slicer::{ElementType, Slice, SlicerError, Slicer, VolumeData};

use super::test_utils::{
    ramp_u16, write_png_folder, write_tiff_folder, write_tiff_stack, write_txm, write_vgi,
};

// =============================================================================
// VGI
// =============================================================================

#[test]
fn test_vgi_reads_every_slice() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp_u16(3, 4, 4);
    let header = write_vgi(dir.path(), "scan", &data);

    let mut slicer = Slicer::Vgi(VgiSlicer::open(&header).unwrap());
    assert_eq!(slicer.len(), 3);
    assert_eq!(slicer.slice_shape(), (4, 4));
    assert_eq!(slicer.element_type(), ElementType::U16);
    assert_eq!(slicer.value_range(), Some((0.0, 65535.0)));

    for z in 0..3 {
        let expected = data.index_axis(Axis(0), z).to_owned();
        assert_eq!(slicer.slice_at(z).unwrap(), Slice::U16(expected));
    }
}

#[test]
fn test_vgi_non_square_slices() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp_u16(2, 3, 5);
    let header = write_vgi(dir.path(), "wide", &data);

    let mut slicer = VgiSlicer::open(&header).unwrap();
    assert_eq!(slicer.header().size, (5, 3, 2));
    assert_eq!(slicer.slice_shape(), (3, 5));
    let Slice::U16(plane) = slicer.slice_at(1).unwrap() else {
        panic!("expected u16 slice");
    };
    assert_eq!(plane[[2, 4]], 1000 + 20 + 4);
}

#[test]
fn test_vgi_opens_from_blob_path() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp_u16(3, 2, 2);
    write_vgi(dir.path(), "scan", &data);

    let slicer = VgiSlicer::open(dir.path().join("scan.vol")).unwrap();
    assert_eq!(slicer.len(), 3);
}

#[test]
fn test_vgi_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "scan", &ramp_u16(3, 4, 4));
    let mut slicer = VgiSlicer::open(&header).unwrap();

    let err = slicer.slice_at(3).unwrap_err();
    assert!(matches!(err, SlicerError::OutOfRange { index: 3, length: 3 }));

    // the slicer is still usable afterwards
    assert!(slicer.slice_at(2).is_ok());
}

#[test]
fn test_vgi_repeated_reads_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "scan", &ramp_u16(4, 3, 3));
    let mut slicer = VgiSlicer::open(&header).unwrap();

    let first = slicer.slice_at(2).unwrap();
    slicer.slice_at(0).unwrap();
    assert_eq!(slicer.slice_at(2).unwrap(), first);
}

#[test]
fn test_vgi_missing_blob() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "scan", &ramp_u16(1, 2, 2));
    fs::remove_file(dir.path().join("scan.vol")).unwrap();

    assert!(matches!(
        VgiSlicer::open(&header),
        Err(SlicerError::SourceRead(_))
    ));
}

#[test]
fn test_vgi_overflowing_size_is_a_header_error() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "huge", &ramp_u16(1, 2, 2));
    let text = fs::read_to_string(&header)
        .unwrap()
        .replace("Size = 2 2 1", "Size = 18446744073709551615 2 1");
    fs::write(&header, text).unwrap();

    let err = VgiSlicer::open(&header).unwrap_err();
    assert!(matches!(err, SlicerError::HeaderParse(_)), "got {err:?}");
}

#[test]
fn test_vgi_truncated_blob_fails_at_open() {
    let dir = tempfile::tempdir().unwrap();
    let header = write_vgi(dir.path(), "short", &ramp_u16(3, 4, 4));
    let blob = header.with_extension("vol");
    let bytes = fs::read(&blob).unwrap();
    fs::write(&blob, &bytes[..bytes.len() - 1]).unwrap();

    let err = VgiSlicer::open(&header).unwrap_err();
    assert!(matches!(err, SlicerError::SourceRead(_)), "got {err:?}");
}

// =============================================================================
// TXM
// =============================================================================

#[test]
fn test_txm_reads_slices_in_numeric_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.txm");
    // more than ten slices so Image10 must sort after Image9
    let data = ramp_u16(12, 3, 4);
    write_txm(&path, &data, None);

    let mut slicer = TxmSlicer::open(&path).unwrap();
    assert_eq!(slicer.len(), 12);
    assert_eq!(slicer.slice_shape(), (3, 4));
    assert_eq!(slicer.element_type(), ElementType::U16);
    assert_eq!(slicer.value_range(), None);
    assert_eq!(slicer.keys()[9], "/ImageData1/Image10");

    for z in [0, 8, 9, 11] {
        let expected = data.index_axis(Axis(0), z).to_owned();
        assert_eq!(slicer.slice_at(z).unwrap(), Slice::U16(expected));
    }
    assert!(matches!(
        slicer.slice_at(12),
        Err(SlicerError::OutOfRange { index: 12, length: 12 })
    ));
}

#[test]
fn test_txm_global_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.txrm");
    write_txm(&path, &ramp_u16(2, 2, 2), Some((10.0, 2000.0)));

    let slicer = TxmSlicer::open(&path).unwrap();
    assert_eq!(slicer.value_range(), Some((10.0, 2000.0)));
}

#[test]
fn test_txm_overflowing_dimensions_are_a_header_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.txm");
    write_txm(&path, &ramp_u16(1, 2, 2), None);
    {
        let mut comp = cfb::open_rw(&path).unwrap();
        for stream in ["/ImageInfo/ImageWidth", "/ImageInfo/ImageHeight"] {
            let mut stream = comp.create_stream(stream).unwrap();
            stream.write_all(&u32::MAX.to_le_bytes()).unwrap();
            stream.flush().unwrap();
        }
        comp.flush().unwrap();
    }

    let result = TxmSlicer::open(&path);
    assert!(matches!(result, Err(SlicerError::HeaderParse(_))));
}

// =============================================================================
// TIFF stacks and folders
// =============================================================================

#[test]
fn test_tiff_stack_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.tif");
    let data = ramp_u16(5, 6, 7);
    write_tiff_stack(&path, &data);

    let mut slicer = TiffStackSlicer::open(&path).unwrap();
    assert_eq!(slicer.len(), 5);
    assert_eq!(slicer.slice_shape(), (6, 7));
    assert_eq!(slicer.element_type(), ElementType::U16);

    // out of order on purpose
    for z in [4, 0, 2] {
        let expected = data.index_axis(Axis(0), z).to_owned();
        assert_eq!(slicer.slice_at(z).unwrap(), Slice::U16(expected));
    }
    assert!(slicer.slice_at(5).is_err());
}

#[test]
fn test_tiff_stack_from_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.tif");
    let data = ramp_u16(3, 2, 2);
    write_tiff_stack(&path, &data);

    let bytes = fs::read(&path).unwrap();
    let mut slicer = Slicer::Remote(
        TiffStackSlicer::from_bytes("https://example.org/stack.tif", bytes).unwrap(),
    );
    assert_eq!(slicer.len(), 3);
    assert_eq!(slicer.source_name(), "https://example.org/stack.tif");
    assert_eq!(
        slicer.slice_at(1).unwrap(),
        Slice::U16(data.index_axis(Axis(0), 1).to_owned())
    );
}

#[test]
fn test_tiff_folder_counts_files() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp_u16(4, 3, 3);
    write_tiff_folder(dir.path(), &data);
    fs::write(dir.path().join("notes.txt"), "not a slice").unwrap();

    let mut slicer = FolderSlicer::open(dir.path(), TIFF_EXTENSIONS).unwrap();
    assert_eq!(slicer.len(), 4);
    assert_eq!(
        slicer.slice_at(3).unwrap(),
        Slice::U16(data.index_axis(Axis(0), 3).to_owned())
    );
}

#[test]
fn test_folder_rejects_mismatched_slice() {
    let dir = tempfile::tempdir().unwrap();
    write_tiff_folder(dir.path(), &ramp_u16(2, 3, 3));
    // a later file with a different shape
    let odd = ramp_u16(1, 4, 4);
    let odd_dir = tempfile::tempdir().unwrap();
    write_tiff_folder(odd_dir.path(), &odd);
    fs::copy(
        odd_dir.path().join("slice_000.tif"),
        dir.path().join("slice_999.tif"),
    )
    .unwrap();

    let mut slicer = FolderSlicer::open(dir.path(), TIFF_EXTENSIONS).unwrap();
    assert_eq!(slicer.len(), 3);
    assert!(slicer.slice_at(1).is_ok());
    assert!(matches!(slicer.slice_at(2), Err(SlicerError::SourceRead(_))));
}

#[test]
fn test_png_folder_by_dominant_type() {
    let dir = tempfile::tempdir().unwrap();
    let planes: Vec<Array2<u8>> = (0..3)
        .map(|z| Array2::from_shape_fn((4, 5), |(y, x)| (z * 50 + y * 5 + x) as u8))
        .collect();
    write_png_folder(dir.path(), &planes);

    let mut slicer = FolderSlicer::open_dominant(dir.path()).unwrap();
    assert_eq!(slicer.len(), 3);
    assert_eq!(slicer.element_type(), ElementType::U8);
    assert_eq!(slicer.slice_at(2).unwrap(), Slice::U8(planes[2].clone()));
}

// =============================================================================
// Shared behaviour
// =============================================================================

#[test]
fn test_load_volume_stacks_slices() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp_u16(3, 2, 4);
    let header = write_vgi(dir.path(), "scan", &data);

    let mut slicer = Slicer::Vgi(VgiSlicer::open(&header).unwrap());
    assert_eq!(slicer.load_volume().unwrap(), VolumeData::U16(data));
}

#[test]
fn test_memory_slicer_matches_array() {
    let data = ramp_u16(4, 3, 2);
    let mut slicer = Slicer::from(VolumeData::from(data.clone()));
    assert_eq!(slicer.variant_name(), "in-memory");
    assert_eq!(
        slicer.slice_at(3).unwrap(),
        Slice::U16(data.slice(s![3, .., ..]).to_owned())
    );
    assert!(slicer.describe().contains("4 slices of 3x2 uint16"));
}

#[test]
fn test_folder_load_volume_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let data = ramp_u16(6, 3, 2);
    write_tiff_folder(dir.path(), &data);

    let mut slicer = Slicer::Folder(FolderSlicer::open(dir.path(), TIFF_EXTENSIONS).unwrap());
    assert_eq!(slicer.load_volume().unwrap(), VolumeData::U16(data));
}
