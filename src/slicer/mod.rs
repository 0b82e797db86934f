//! Uniform slice-wise access to volumes in any supported format.
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │       Slicer         │
//!                 │ len / slice_at / ... │
//!                 └──────────┬───────────┘
//!      ┌──────────┬──────────┼───────────┬────────────┬──────────┐
//!      ▼          ▼          ▼           ▼            ▼          ▼
//!   VgiSlicer TxmSlicer TiffStackSlicer FolderSlicer ImageFile MemorySlicer
//!  (.vgi+.vol) (.txm)  (file or URL)   (dir of 2-D)  (1 frame) (ndarray)
//! ```
//!
//! Every variant owns exactly one backing resource, which is released when
//! the slicer is dropped or [`Slicer::close`]d.

mod folder;
mod image_file;
mod memory;
mod tiff_stack;
mod txm;
mod vgi;

use std::fs::File;
use std::io::{BufReader, Cursor};

use tracing::debug;

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};
use crate::slice::{Slice, VolumeData};

pub use folder::{
    FolderSlicer, IMAGE_EXTENSIONS, TIFF_EXTENSIONS, dominant_extension, list_image_files,
};
pub use image_file::ImageFileSlicer;
pub use memory::MemorySlicer;
pub use tiff_stack::TiffStackSlicer;
pub use txm::TxmSlicer;
pub use vgi::VgiSlicer;

/// A volume opened for slice-wise reading.
#[derive(Debug)]
pub enum Slicer {
    /// Raw `.vol` blob with a `.vgi` text header.
    Vgi(VgiSlicer),
    /// `.txm`/`.txrm` compound file.
    Txm(TxmSlicer),
    /// Local multi-page TIFF.
    TiffStack(TiffStackSlicer<BufReader<File>>),
    /// Multi-page TIFF fetched over HTTP.
    Remote(TiffStackSlicer<Cursor<Vec<u8>>>),
    /// Directory of 2-D images.
    Folder(FolderSlicer),
    /// Any single image the `image` crate decodes.
    ImageFile(ImageFileSlicer),
    /// Volume already held in memory.
    Memory(MemorySlicer),
}

impl Slicer {
    pub fn len(&self) -> usize {
        match self {
            Slicer::Vgi(s) => s.len(),
            Slicer::Txm(s) => s.len(),
            Slicer::TiffStack(s) => s.len(),
            Slicer::Remote(s) => s.len(),
            Slicer::Folder(s) => s.len(),
            Slicer::ImageFile(s) => s.len(),
            Slicer::Memory(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of every slice as `(height, width)`.
    pub fn slice_shape(&self) -> (usize, usize) {
        match self {
            Slicer::Vgi(s) => s.slice_shape(),
            Slicer::Txm(s) => s.slice_shape(),
            Slicer::TiffStack(s) => s.slice_shape(),
            Slicer::Remote(s) => s.slice_shape(),
            Slicer::Folder(s) => s.slice_shape(),
            Slicer::ImageFile(s) => s.slice_shape(),
            Slicer::Memory(s) => s.slice_shape(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Slicer::Vgi(s) => s.element_type(),
            Slicer::Txm(s) => s.element_type(),
            Slicer::TiffStack(s) => s.element_type(),
            Slicer::Remote(s) => s.element_type(),
            Slicer::Folder(s) => s.element_type(),
            Slicer::ImageFile(s) => s.element_type(),
            Slicer::Memory(s) => s.element_type(),
        }
    }

    /// Declared range of meaningful sample values, if the format has one.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        match self {
            Slicer::Vgi(s) => s.value_range(),
            Slicer::Txm(s) => s.value_range(),
            _ => None,
        }
    }

    /// Read slice `z`, failing with [`SlicerError::OutOfRange`] past the end.
    pub fn slice_at(&mut self, z: usize) -> Result<Slice> {
        match self {
            Slicer::Vgi(s) => s.slice_at(z),
            Slicer::Txm(s) => s.slice_at(z),
            Slicer::TiffStack(s) => s.slice_at(z),
            Slicer::Remote(s) => s.slice_at(z),
            Slicer::Folder(s) => s.slice_at(z),
            Slicer::ImageFile(s) => s.slice_at(z),
            Slicer::Memory(s) => s.slice_at(z),
        }
    }

    /// Descriptor text the slicer was opened from.
    pub fn source_name(&self) -> &str {
        match self {
            Slicer::Vgi(s) => s.name(),
            Slicer::Txm(s) => s.name(),
            Slicer::TiffStack(s) => s.name(),
            Slicer::Remote(s) => s.name(),
            Slicer::Folder(s) => s.name(),
            Slicer::ImageFile(s) => s.name(),
            Slicer::Memory(_) => "<memory>",
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Slicer::Vgi(_) => "VGI",
            Slicer::Txm(_) => "TXM",
            Slicer::TiffStack(_) => "TIFF stack",
            Slicer::Remote(_) => "remote TIFF stack",
            Slicer::Folder(_) => "image folder",
            Slicer::ImageFile(_) => "image file",
            Slicer::Memory(_) => "in-memory",
        }
    }

    /// One-line summary for logs and the command line.
    pub fn describe(&self) -> String {
        let (height, width) = self.slice_shape();
        let mut text = format!(
            "{} volume {}: {} slices of {}x{} {}",
            self.variant_name(),
            self.source_name(),
            self.len(),
            height,
            width,
            self.element_type()
        );
        if let Some((min, max)) = self.value_range() {
            text.push_str(&format!(", range [{min}, {max}]"));
        }
        text
    }

    /// Read every slice into memory.
    pub fn load_volume(&mut self) -> Result<VolumeData> {
        let slices = (0..self.len())
            .map(|z| {
                debug!(z, length = self.len(), "loading slice");
                self.slice_at(z)
            })
            .collect::<Result<Vec<_>>>()?;
        VolumeData::from_slices(slices)
    }

    /// Release the backing resource now rather than at end of scope.
    pub fn close(self) {
        debug!(source = self.source_name(), "closing slicer");
        drop(self);
    }
}

impl From<VolumeData> for Slicer {
    fn from(value: VolumeData) -> Self {
        Slicer::Memory(MemorySlicer::new(value))
    }
}

pub(crate) fn check_index(index: usize, length: usize) -> Result<()> {
    if index < length {
        Ok(())
    } else {
        Err(SlicerError::OutOfRange { index, length })
    }
}
