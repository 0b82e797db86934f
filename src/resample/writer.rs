use std::borrow::Cow;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ndarray::Array2;
use tiff::encoder::{TiffEncoder, colortype};
use tracing::debug;

use crate::error::{Result, SlicerError};
use crate::slice::Slice;

/// Forward-only destination for resampled frames.
///
/// Frames arrive in increasing z order and are not handed back. `finish` is
/// called once after the last frame.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Slice) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Buffered output file shared between the encoder and the writer, so the
/// buffer can be flushed with its error reported once the last page is out.
#[derive(Clone)]
struct SharedFile(Rc<RefCell<BufWriter<File>>>);

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.borrow_mut().flush()
    }
}

impl Seek for SharedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.borrow_mut().seek(pos)
    }
}

/// Writes every frame as one page of a multi-page TIFF.
pub struct TiffStackWriter {
    path: PathBuf,
    file: SharedFile,
    encoder: TiffEncoder<SharedFile>,
    frames: usize,
}

impl TiffStackWriter {
    /// Create `path`. Without `overwrite` an existing file, including one that
    /// appeared after any earlier check, fails with
    /// [`SlicerError::DestinationExists`] and is left as it was.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => SlicerError::DestinationExists(path.clone()),
            _ => SlicerError::OutputWrite(format!("{}: {e}", path.display())),
        })?;

        let file = SharedFile(Rc::new(RefCell::new(BufWriter::new(file))));
        let encoder = TiffEncoder::new(file.clone())
            .map_err(|e| SlicerError::OutputWrite(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path,
            file,
            encoder,
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl FrameSink for TiffStackWriter {
    fn write_frame(&mut self, frame: &Slice) -> Result<()> {
        let (height, width) = frame.dim();
        let (width, height) = (width as u32, height as u32);

        let written = match frame {
            Slice::U8(plane) => self
                .encoder
                .write_image::<colortype::Gray8>(width, height, &contiguous(plane)),
            Slice::U16(plane) => self
                .encoder
                .write_image::<colortype::Gray16>(width, height, &contiguous(plane)),
            Slice::U32(plane) => self
                .encoder
                .write_image::<colortype::Gray32>(width, height, &contiguous(plane)),
            Slice::F32(plane) => self
                .encoder
                .write_image::<colortype::Gray32Float>(width, height, &contiguous(plane)),
            Slice::F64(plane) => self
                .encoder
                .write_image::<colortype::Gray64Float>(width, height, &contiguous(plane)),
        };

        written.map_err(|e| {
            SlicerError::OutputWrite(format!(
                "{} page {}: {e}",
                self.path.display(),
                self.frames
            ))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let output_err =
            |e: io::Error| SlicerError::OutputWrite(format!("{}: {e}", self.path.display()));
        self.file.flush().map_err(output_err)?;
        self.file.0.borrow().get_ref().sync_all().map_err(output_err)?;
        debug!(path = %self.path.display(), pages = self.frames, "closed TIFF stack");
        Ok(())
    }
}

fn contiguous<T: Clone>(plane: &Array2<T>) -> Cow<'_, [T]> {
    match plane.as_slice() {
        Some(samples) => Cow::Borrowed(samples),
        None => Cow::Owned(plane.iter().cloned().collect()),
    }
}

/// Keeps frames in memory.
#[derive(Debug, Default)]
pub struct FrameCollector {
    pub frames: Vec<Slice>,
}

impl FrameSink for FrameCollector {
    fn write_frame(&mut self, frame: &Slice) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}
