use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};
use crate::header::VgiHeader;
use crate::slice::{Slice, plane_bytes};

use super::check_index;

/// Reads slices from a `.vol` blob described by its `.vgi` header.
///
/// The blob is kept open; each slice is read with a single seek to
/// `z * height * width * element_size`.
#[derive(Debug)]
pub struct VgiSlicer {
    name: String,
    header: VgiHeader,
    blob: File,
    slice_bytes: usize,
}

impl VgiSlicer {
    /// Open a `.vgi` header or its `.vol` blob; the other file is found by
    /// swapping the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (header_path, blob_path) = Self::paired_paths(path);

        let header = VgiHeader::read(&header_path)?;
        let blob = File::open(&blob_path).map_err(|e| {
            SlicerError::SourceRead(format!("{}: {e}", blob_path.display()))
        })?;

        let slice_bytes = plane_bytes(header.slice_shape(), header.element_type)?;
        let volume_bytes = (slice_bytes as u64)
            .checked_mul(header.length() as u64)
            .ok_or_else(|| {
                SlicerError::HeaderParse(format!("Size {:?} is too large", header.size))
            })?;
        let blob_len = blob.metadata()?.len();
        if blob_len < volume_bytes {
            return Err(SlicerError::SourceRead(format!(
                "{} holds {blob_len} bytes, header declares {volume_bytes}",
                blob_path.display()
            )));
        }

        debug!(
            header = %header_path.display(),
            blob = %blob_path.display(),
            size = ?header.size,
            element_type = %header.element_type,
            "opened VGI volume"
        );

        Ok(Self {
            name: path.display().to_string(),
            header,
            blob,
            slice_bytes,
        })
    }

    fn paired_paths(path: &Path) -> (PathBuf, PathBuf) {
        let is_blob = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vol"));
        if is_blob {
            (path.with_extension("vgi"), path.to_path_buf())
        } else {
            (path.to_path_buf(), path.with_extension("vol"))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.header.length()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn header(&self) -> &VgiHeader {
        &self.header
    }

    pub fn slice_shape(&self) -> (usize, usize) {
        self.header.slice_shape()
    }

    pub fn element_type(&self) -> ElementType {
        self.header.element_type
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.header.value_range
    }

    pub fn slice_at(&mut self, z: usize) -> Result<Slice> {
        check_index(z, self.len())?;

        let offset = (self.slice_bytes as u64) * (z as u64);

        self.blob.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; self.slice_bytes];
        self.blob.read_exact(&mut bytes).map_err(|e| {
            SlicerError::SourceRead(format!("{} slice {z} at offset {offset}: {e}", self.name))
        })?;

        Slice::from_bytes(&bytes, self.element_type(), self.slice_shape())
    }
}
