use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};
use crate::header::txm_element_type;
use crate::slice::{Slice, plane_bytes};

use super::check_index;

const IMAGE_WIDTH: &str = "/ImageInfo/ImageWidth";
const IMAGE_HEIGHT: &str = "/ImageInfo/ImageHeight";
const DATA_TYPE: &str = "/ImageInfo/DataType";
const GLOBAL_MIN: &str = "/GlobalMinMax/GlobalMin";
const GLOBAL_MAX: &str = "/GlobalMinMax/GlobalMax";

const IMAGE_STORAGE_PREFIX: &str = "ImageData";
const IMAGE_STREAM_PREFIX: &str = "Image";

/// Reads slices from a `.txm`/`.txrm` compound file.
///
/// Every slice lives in its own stream, `/ImageData<n>/Image<m>`.
#[derive(Debug)]
pub struct TxmSlicer {
    name: String,
    file: cfb::CompoundFile<File>,
    keys: Vec<String>,
    slice_shape: (usize, usize),
    element_type: ElementType,
    value_range: Option<(f64, f64)>,
}

impl TxmSlicer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = cfb::open(path)
            .map_err(|e| SlicerError::SourceRead(format!("{}: {e}", path.display())))?;

        let width = read_u32(&mut file, IMAGE_WIDTH)? as usize;
        let height = read_u32(&mut file, IMAGE_HEIGHT)? as usize;
        let element_type = txm_element_type(read_u32(&mut file, DATA_TYPE)?)?;
        plane_bytes((height, width), element_type)?;
        let value_range = read_global_range(&mut file);
        let keys = image_stream_keys(&file)?;

        debug!(
            path = %path.display(),
            width,
            height,
            element_type = %element_type,
            slices = keys.len(),
            "opened TXM container"
        );

        Ok(Self {
            name: path.display().to_string(),
            file,
            keys,
            slice_shape: (height, width),
            element_type,
            value_range,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn slice_shape(&self) -> (usize, usize) {
        self.slice_shape
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.value_range
    }

    /// Stream paths of the slices, in slice order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn slice_at(&mut self, z: usize) -> Result<Slice> {
        check_index(z, self.len())?;

        let key = &self.keys[z];
        let mut bytes = Vec::new();
        self.file
            .open_stream(key)
            .and_then(|mut stream| stream.read_to_end(&mut bytes))
            .map_err(|e| SlicerError::SourceRead(format!("{}{key}: {e}", self.name)))?;

        Slice::from_bytes(&bytes, self.element_type, self.slice_shape)
    }
}

fn read_stream_bytes<const N: usize>(
    file: &mut cfb::CompoundFile<File>,
    path: &str,
) -> std::io::Result<[u8; N]> {
    let mut stream = file.open_stream(path)?;
    let mut buf = [0u8; N];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u32(file: &mut cfb::CompoundFile<File>, path: &str) -> Result<u32> {
    read_stream_bytes::<4>(file, path)
        .map(u32::from_le_bytes)
        .map_err(|e| SlicerError::HeaderParse(format!("{path}: {e}")))
}

/// Global min/max are only present in some files; absence is not an error.
fn read_global_range(file: &mut cfb::CompoundFile<File>) -> Option<(f64, f64)> {
    let min = read_stream_bytes::<4>(file, GLOBAL_MIN).ok()?;
    let max = read_stream_bytes::<4>(file, GLOBAL_MAX).ok()?;
    let (min, max) = (f32::from_le_bytes(min), f32::from_le_bytes(max));
    (min < max).then_some((min as f64, max as f64))
}

fn image_stream_keys(file: &cfb::CompoundFile<File>) -> Result<Vec<String>> {
    let storages: Vec<String> = file
        .read_root_storage()
        .filter(|entry| entry.is_storage() && entry.name().starts_with(IMAGE_STORAGE_PREFIX))
        .map(|entry| entry.name().to_string())
        .collect();

    let mut keys = Vec::new();
    for storage in storages {
        let entries = file
            .read_storage(format!("/{storage}"))
            .map_err(|e| SlicerError::HeaderParse(format!("/{storage}: {e}")))?;
        for entry in entries {
            if entry.is_stream() && entry.name().starts_with(IMAGE_STREAM_PREFIX) {
                keys.push((
                    numeric_suffix(&storage),
                    numeric_suffix(entry.name()),
                    format!("/{storage}/{}", entry.name()),
                ));
            }
        }
    }

    keys.sort();
    Ok(keys.into_iter().map(|(_, _, key)| key).collect())
}

/// Trailing decimal number of a stream name, so `Image10` sorts after `Image2`.
fn numeric_suffix(name: &str) -> Option<u64> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    name[name.len() - digits..].parse().ok()
}
