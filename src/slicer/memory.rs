use crate::enums::ElementType;
use crate::error::Result;
use crate::slice::{Slice, VolumeData};

use super::check_index;

/// Wraps a volume that is already in memory.
#[derive(Debug, Clone)]
pub struct MemorySlicer {
    data: VolumeData,
}

impl MemorySlicer {
    pub fn new(data: impl Into<VolumeData>) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &VolumeData {
        &self.data
    }

    pub fn into_data(self) -> VolumeData {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slice_shape(&self) -> (usize, usize) {
        let (_, height, width) = self.data.dim();
        (height, width)
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn slice_at(&self, z: usize) -> Result<Slice> {
        check_index(z, self.len())?;
        Ok(self.data.plane(z))
    }
}
