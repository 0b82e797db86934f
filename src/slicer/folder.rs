use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};
use crate::slice::Slice;

use super::check_index;
use super::image_file::read_image_file;
use super::tiff_stack::read_tiff_file;

/// Extensions tried first when a folder is opened.
pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Extensions counted when picking a folder's dominant image type.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif"];

/// A folder of same-shaped 2-D images, one slice per file.
///
/// Files are ordered by name. Shape and element type come from the first file.
#[derive(Debug)]
pub struct FolderSlicer {
    name: String,
    files: Vec<PathBuf>,
    slice_shape: (usize, usize),
    element_type: ElementType,
}

impl FolderSlicer {
    /// Open the files in `folder` whose extension is one of `extensions`
    /// (compared case-insensitively).
    pub fn open(folder: impl AsRef<Path>, extensions: &[&str]) -> Result<Self> {
        let folder = folder.as_ref();
        let files = list_image_files(folder, extensions)?;
        let Some(first) = files.first() else {
            return Err(SlicerError::SourceRead(format!(
                "no {extensions:?} files in {}",
                folder.display()
            )));
        };

        let probe = read_slice_file(first)?;
        debug!(
            folder = %folder.display(),
            files = files.len(),
            shape = ?probe.dim(),
            element_type = %probe.element_type(),
            "opened image folder"
        );

        Ok(Self {
            name: folder.display().to_string(),
            slice_shape: probe.dim(),
            element_type: probe.element_type(),
            files,
        })
    }

    /// Open the folder using whichever image extension most of its files have.
    pub fn open_dominant(folder: impl AsRef<Path>) -> Result<Self> {
        let folder = folder.as_ref();
        let extension = dominant_extension(folder)?.ok_or_else(|| {
            SlicerError::SourceRead(format!("no image files in {}", folder.display()))
        })?;
        debug!(folder = %folder.display(), extension, "picked dominant extension");
        Self::open(folder, &[extension])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn slice_shape(&self) -> (usize, usize) {
        self.slice_shape
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn slice_at(&mut self, z: usize) -> Result<Slice> {
        check_index(z, self.len())?;
        self.read_checked(&self.files[z])
    }

    fn read_checked(&self, path: &Path) -> Result<Slice> {
        let slice = read_slice_file(path)?;
        if slice.dim() != self.slice_shape || slice.element_type() != self.element_type {
            return Err(SlicerError::SourceRead(format!(
                "{} is {:?} {}, expected {:?} {}",
                path.display(),
                slice.dim(),
                slice.element_type(),
                self.slice_shape,
                self.element_type
            )));
        }
        Ok(slice)
    }
}

fn read_slice_file(path: &Path) -> Result<Slice> {
    if has_extension(path, TIFF_EXTENSIONS) {
        read_tiff_file(path)
    } else {
        read_image_file(path)
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Regular files in `folder` with one of the extensions, sorted by path.
pub fn list_image_files(folder: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<_> = fs::read_dir(folder)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Image extension shared by most files in `folder`; ties go to the earlier
/// entry of [`IMAGE_EXTENSIONS`].
pub fn dominant_extension(folder: &Path) -> Result<Option<&'static str>> {
    let mut counts = [0usize; IMAGE_EXTENSIONS.len()];
    for entry in fs::read_dir(folder)?.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if let Some(i) = IMAGE_EXTENSIONS
            .iter()
            .position(|ext| has_extension(&path, &[*ext]))
        {
            counts[i] += 1;
        }
    }

    let best = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .fold(None, |best: Option<(usize, usize)>, (i, &count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((i, count)),
        });
    Ok(best.map(|(i, _)| IMAGE_EXTENSIONS[i]))
}
