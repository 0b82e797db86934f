use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use crate::enums::ElementType;
use crate::error::Result;
use crate::slice::Slice;

use super::check_index;

/// A single 2-D image file, seen as a volume of one slice.
///
/// Used when a file could not be opened as a TIFF stack. Colour images are
/// reduced to luminance.
#[derive(Debug)]
pub struct ImageFileSlicer {
    name: String,
    frame: Slice,
}

impl ImageFileSlicer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let frame = read_image_file(path)?;
        debug!(path = %path.display(), shape = ?frame.dim(), "decoded single image");
        Ok(Self {
            name: path.display().to_string(),
            frame,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn slice_shape(&self) -> (usize, usize) {
        self.frame.dim()
    }

    pub fn element_type(&self) -> ElementType {
        self.frame.element_type()
    }

    pub fn slice_at(&mut self, z: usize) -> Result<Slice> {
        check_index(z, self.len())?;
        Ok(self.frame.clone())
    }
}

/// Decode any format the `image` crate knows into a grayscale slice.
pub(crate) fn read_image_file(path: &Path) -> Result<Slice> {
    let image = image::open(path)?;
    dynamic_to_slice(image)
}

fn dynamic_to_slice(image: DynamicImage) -> Result<Slice> {
    let shape = (image.height() as usize, image.width() as usize);
    match image {
        DynamicImage::ImageLuma8(buf) => Slice::from_vec(buf.into_raw(), shape),
        DynamicImage::ImageLuma16(buf) => Slice::from_vec(buf.into_raw(), shape),
        other @ (DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)) => {
            Slice::from_vec(other.to_luma32f().into_raw(), shape)
        }
        other @ (DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_)) => Slice::from_vec(other.to_luma16().into_raw(), shape),
        other => Slice::from_vec(other.to_luma8().into_raw(), shape),
    }
}
