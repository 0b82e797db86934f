//! Turns a volume descriptor into an opened [`Slicer`].
//!
//! Resolution order:
//!
//! 1. An in-memory array is wrapped directly.
//! 2. A directory is opened as a folder of TIFF images, or failing that, as a
//!    folder of whatever image type most of its files have.
//! 3. An `http(s)://` URL to a TIFF is fetched as a remote stack.
//! 4. A file is dispatched on its extension: TIFF stacks (falling back to a
//!    single decoded image), `.vgi`/`.vol` pairs, `.txm`/`.txrm` containers,
//!    and `.txt` indirection files whose content is itself a descriptor.
//!
//! When a step has several candidates, failures of the earlier ones are
//! logged and dropped; only [`SlicerError::UnresolvedFormat`] is reported if
//! none of them opens.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SlicerError};
use crate::slice::VolumeData;
use crate::slicer::{
    FolderSlicer, ImageFileSlicer, MemorySlicer, Slicer, TIFF_EXTENSIONS, TiffStackSlicer,
    TxmSlicer, VgiSlicer,
};

/// How many `.txt` files may point at each other before resolution gives up.
pub const MAX_INDIRECTION_DEPTH: usize = 8;

const URL_SCHEMES: &[&str] = &["http://", "https://"];

/// Identifies a volume before its format is known.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Path(PathBuf),
    Url(String),
    Array(VolumeData),
}

impl Descriptor {
    pub fn parse(text: &str) -> Self {
        if is_url(text) {
            Descriptor::Url(text.to_string())
        } else {
            Descriptor::Path(PathBuf::from(text))
        }
    }

    fn label(&self) -> String {
        match self {
            Descriptor::Path(path) => path.display().to_string(),
            Descriptor::Url(url) => url.clone(),
            Descriptor::Array(data) => format!("<array {:?}>", data.dim()),
        }
    }
}

impl From<&str> for Descriptor {
    fn from(value: &str) -> Self {
        Descriptor::parse(value)
    }
}

impl From<String> for Descriptor {
    fn from(value: String) -> Self {
        Descriptor::parse(&value)
    }
}

impl From<PathBuf> for Descriptor {
    fn from(value: PathBuf) -> Self {
        Descriptor::Path(value)
    }
}

impl From<&Path> for Descriptor {
    fn from(value: &Path) -> Self {
        Descriptor::Path(value.to_path_buf())
    }
}

impl From<VolumeData> for Descriptor {
    fn from(value: VolumeData) -> Self {
        Descriptor::Array(value)
    }
}

/// Open the volume a descriptor points at.
pub fn resolve(descriptor: impl Into<Descriptor>) -> Result<Slicer> {
    let slicer = resolve_at_depth(descriptor.into(), 0)?;
    info!("{}", slicer.describe());
    Ok(slicer)
}

fn resolve_at_depth(descriptor: Descriptor, depth: usize) -> Result<Slicer> {
    debug!(descriptor = %descriptor.label(), depth, "resolving volume");
    match descriptor {
        Descriptor::Array(data) => Ok(Slicer::Memory(MemorySlicer::new(data))),
        Descriptor::Url(url) => resolve_url(&url),
        Descriptor::Path(path) if path.is_dir() => resolve_folder(&path),
        Descriptor::Path(path) => resolve_file(&path, depth),
    }
}

fn resolve_url(url: &str) -> Result<Slicer> {
    if !is_tiff_name(url) {
        return Err(SlicerError::UnresolvedFormat(url.to_string()));
    }
    TiffStackSlicer::from_url(url).map(Slicer::Remote)
}

fn resolve_folder(folder: &Path) -> Result<Slicer> {
    match FolderSlicer::open(folder, TIFF_EXTENSIONS) {
        Ok(slicer) => return Ok(Slicer::Folder(slicer)),
        Err(e) => debug!(folder = %folder.display(), error = %e, "not a TIFF folder"),
    }

    match FolderSlicer::open_dominant(folder) {
        Ok(slicer) => {
            warn!(folder = %folder.display(), "opened folder by dominant image type");
            Ok(Slicer::Folder(slicer))
        }
        Err(e) => {
            debug!(folder = %folder.display(), error = %e, "no image type in folder opened");
            Err(SlicerError::UnresolvedFormat(folder.display().to_string()))
        }
    }
}

fn resolve_file(path: &Path, depth: usize) -> Result<Slicer> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        ext if ext.contains("tif") => resolve_tiff_file(path),
        "vgi" | "vol" => VgiSlicer::open(path).map(Slicer::Vgi),
        "txm" | "txrm" => TxmSlicer::open(path).map(Slicer::Txm),
        "txt" => resolve_indirection(path, depth),
        _ => Err(SlicerError::UnresolvedFormat(path.display().to_string())),
    }
}

fn resolve_tiff_file(path: &Path) -> Result<Slicer> {
    match TiffStackSlicer::open(path) {
        Ok(slicer) => return Ok(Slicer::TiffStack(slicer)),
        Err(e) => warn!(path = %path.display(), error = %e, "not a TIFF stack, decoding as image"),
    }

    ImageFileSlicer::open(path)
        .map(Slicer::ImageFile)
        .map_err(|e| {
            debug!(path = %path.display(), error = %e, "image decoding failed");
            SlicerError::UnresolvedFormat(path.display().to_string())
        })
}

/// Follow a text file holding another descriptor. Relative targets are taken
/// relative to the text file's folder.
fn resolve_indirection(path: &Path, depth: usize) -> Result<Slicer> {
    if depth >= MAX_INDIRECTION_DEPTH {
        return Err(SlicerError::IndirectionTooDeep {
            descriptor: path.display().to_string(),
            depth: MAX_INDIRECTION_DEPTH,
        });
    }

    let content = fs::read_to_string(path)?;
    let target = match Descriptor::parse(content.trim()) {
        Descriptor::Path(target) if target.is_relative() => {
            Descriptor::Path(path.parent().unwrap_or(Path::new("")).join(target))
        }
        other => other,
    };

    debug!(from = %path.display(), to = %target.label(), "following indirection");
    resolve_at_depth(target, depth + 1)
}

fn is_url(text: &str) -> bool {
    URL_SCHEMES.iter().any(|scheme| {
        text.len() > scheme.len()
            && text
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn is_tiff_name(text: &str) -> bool {
    Path::new(text)
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.to_ascii_lowercase().contains("tif"))
}
