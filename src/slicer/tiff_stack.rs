use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};
use crate::slice::Slice;

use super::check_index;

/// TIFF `SampleFormat` values.
const SAMPLE_FORMAT_UINT: u32 = 1;
const SAMPLE_FORMAT_FLOAT: u32 = 3;

/// Reads frames from a single multi-page TIFF.
///
/// The decoder stays open and seeks straight to the requested page, so
/// reading slice `z` never decodes the pages before it.
#[derive(Debug)]
pub struct TiffStackSlicer<R: Read + Seek> {
    name: String,
    decoder: Decoder<R>,
    length: usize,
    slice_shape: (usize, usize),
    element_type: ElementType,
}

impl TiffStackSlicer<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| SlicerError::SourceRead(format!("{}: {e}", path.display())))?;
        Self::new(path.display().to_string(), BufReader::new(file))
    }
}

impl TiffStackSlicer<Cursor<Vec<u8>>> {
    /// Fetch a stacked TIFF over HTTP. The response body is read once and the
    /// connection released before any frame is decoded.
    pub fn from_url(url: &str) -> Result<Self> {
        debug!(url, "fetching remote TIFF stack");
        let response = ureq::get(url).call()?;
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Self::from_bytes(url, bytes)
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        Self::new(name.into(), Cursor::new(bytes))
    }
}

impl<R: Read + Seek> TiffStackSlicer<R> {
    pub fn new(name: String, reader: R) -> Result<Self> {
        let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
        let (slice_shape, element_type) = frame_layout(&mut decoder)?;

        let mut length = 1;
        while decoder.more_images() {
            decoder.next_image()?;
            length += 1;
        }
        decoder.seek_to_image(0)?;

        debug!(
            name = %name,
            length,
            shape = ?slice_shape,
            element_type = %element_type,
            "opened TIFF stack"
        );

        Ok(Self {
            name,
            decoder,
            length,
            slice_shape,
            element_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn slice_shape(&self) -> (usize, usize) {
        self.slice_shape
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn slice_at(&mut self, z: usize) -> Result<Slice> {
        check_index(z, self.length)?;
        self.decoder.seek_to_image(z)?;

        let slice = read_frame(&mut self.decoder)?;
        if slice.dim() != self.slice_shape || slice.element_type() != self.element_type {
            return Err(SlicerError::SourceRead(format!(
                "{} page {z} is {:?} {}, expected {:?} {}",
                self.name,
                slice.dim(),
                slice.element_type(),
                self.slice_shape,
                self.element_type
            )));
        }
        Ok(slice)
    }
}

/// Decode the first page of a TIFF file.
pub(crate) fn read_tiff_file(path: &Path) -> Result<Slice> {
    let file = File::open(path)
        .map_err(|e| SlicerError::SourceRead(format!("{}: {e}", path.display())))?;
    let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());
    read_frame(&mut decoder)
}

/// Shape and element type of the current page, read from its directory only.
pub(crate) fn frame_layout<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<((usize, usize), ElementType)> {
    let (width, height) = decoder.dimensions()?;
    // absent means unsigned integer
    let sample_format = decoder
        .find_tag(Tag::SampleFormat)?
        .map(|value| value.into_u32())
        .transpose()?
        .unwrap_or(SAMPLE_FORMAT_UINT);

    let element_type = match (decoder.colortype()?, sample_format) {
        (ColorType::Gray(8), SAMPLE_FORMAT_UINT) => ElementType::U8,
        (ColorType::Gray(16), SAMPLE_FORMAT_UINT) => ElementType::U16,
        (ColorType::Gray(32), SAMPLE_FORMAT_UINT) => ElementType::U32,
        (ColorType::Gray(32), SAMPLE_FORMAT_FLOAT) => ElementType::F32,
        (ColorType::Gray(64), SAMPLE_FORMAT_FLOAT) => ElementType::F64,
        (other, format) => {
            return Err(SlicerError::UnsupportedDatatype(format!(
                "TIFF color type {other:?} with sample format {format}"
            )));
        }
    };

    Ok(((height as usize, width as usize), element_type))
}

fn read_frame<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Slice> {
    let (width, height) = decoder.dimensions()?;
    let shape = (height as usize, width as usize);

    match decoder.read_image()? {
        DecodingResult::U8(buf) => Slice::from_vec(buf, shape),
        DecodingResult::U16(buf) => Slice::from_vec(buf, shape),
        DecodingResult::U32(buf) => Slice::from_vec(buf, shape),
        DecodingResult::F32(buf) => Slice::from_vec(buf, shape),
        DecodingResult::F64(buf) => Slice::from_vec(buf, shape),
        _ => Err(SlicerError::UnsupportedDatatype(
            "TIFF samples must be unsigned 8/16/32-bit or float 32/64-bit".to_string(),
        )),
    }
}
