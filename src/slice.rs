//! Typed 2-D planes and 3-D arrays.
//!
//! A volume may hold any of the element types in [`ElementType`]; the closed
//! enums in this module carry the matching `ndarray` container so callers can
//! match on the concrete type or go through the `f64` helpers.

use ndarray::{Array2, Array3, Axis};

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};

/// A numeric type a volume can be stored in.
pub trait Sample: bytemuck::Pod + PartialOrd + Default + Send + 'static {
    const TYPE: ElementType;

    fn to_f64(self) -> f64;

    /// Convert back from `f64`, rounding and saturating for integer types.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample_int {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl Sample for $t {
                const TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value.round() as $t
                }
            }
        )*
    };
}

impl_sample_int!(u8 => U8, u16 => U16, u32 => U32);

impl Sample for f32 {
    const TYPE: ElementType = ElementType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    const TYPE: ElementType = ElementType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

/// A single plane of a volume, shaped `(height, width)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Slice {
    U8(Array2<u8>),
    U16(Array2<u16>),
    U32(Array2<u32>),
    F32(Array2<f32>),
    F64(Array2<f64>),
}

/// A whole volume held in memory, shaped `(depth, height, width)`.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    U8(Array3<u8>),
    U16(Array3<u16>),
    U32(Array3<u32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

macro_rules! each_variant {
    ($value:expr, $enum:ident, $arr:ident => $body:expr) => {
        match $value {
            $enum::U8($arr) => $body,
            $enum::U16($arr) => $body,
            $enum::U32($arr) => $body,
            $enum::F32($arr) => $body,
            $enum::F64($arr) => $body,
        }
    };
}

macro_rules! impl_from_arrays {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl From<Array2<$t>> for Slice {
                fn from(value: Array2<$t>) -> Self {
                    Slice::$variant(value)
                }
            }

            impl From<Array3<$t>> for VolumeData {
                fn from(value: Array3<$t>) -> Self {
                    VolumeData::$variant(value)
                }
            }
        )*
    };
}

impl_from_arrays!(u8 => U8, u16 => U16, u32 => U32, f32 => F32, f64 => F64);

impl Slice {
    pub fn element_type(&self) -> ElementType {
        match self {
            Slice::U8(_) => ElementType::U8,
            Slice::U16(_) => ElementType::U16,
            Slice::U32(_) => ElementType::U32,
            Slice::F32(_) => ElementType::F32,
            Slice::F64(_) => ElementType::F64,
        }
    }

    /// Get the dimensions of the slice (height, width)
    pub fn dim(&self) -> (usize, usize) {
        each_variant!(self, Slice, arr => arr.dim())
    }

    /// Interpret little-endian sample bytes as a plane of the given shape.
    pub fn from_bytes(
        bytes: &[u8],
        element_type: ElementType,
        shape: (usize, usize),
    ) -> Result<Self> {
        let expected = plane_bytes(shape, element_type)?;
        if bytes.len() != expected {
            return Err(SlicerError::SourceRead(format!(
                "expected {expected} bytes for a {}x{} {element_type} slice, got {}",
                shape.0,
                shape.1,
                bytes.len()
            )));
        }

        Ok(match element_type {
            ElementType::U8 => Self::cast_bytes::<u8>(bytes, shape)?.into(),
            ElementType::U16 => Self::cast_bytes::<u16>(bytes, shape)?.into(),
            ElementType::U32 => Self::cast_bytes::<u32>(bytes, shape)?.into(),
            ElementType::F32 => Self::cast_bytes::<f32>(bytes, shape)?.into(),
            ElementType::F64 => Self::cast_bytes::<f64>(bytes, shape)?.into(),
        })
    }

    fn cast_bytes<T: Sample>(bytes: &[u8], shape: (usize, usize)) -> Result<Array2<T>> {
        // pod_collect_to_vec copies, so the byte buffer need not be aligned for T
        let values: Vec<T> = bytemuck::pod_collect_to_vec(bytes);
        Array2::from_shape_vec(shape, values)
            .map_err(|e| SlicerError::SourceRead(format!("reshape failed: {e}")))
    }

    /// Build a slice from a flat sample buffer.
    pub fn from_vec<T: Sample>(values: Vec<T>, shape: (usize, usize)) -> Result<Self>
    where
        Slice: From<Array2<T>>,
    {
        Array2::from_shape_vec(shape, values)
            .map(Slice::from)
            .map_err(|e| SlicerError::SourceRead(format!("reshape failed: {e}")))
    }

    pub fn to_f64(&self) -> Array2<f64> {
        each_variant!(self, Slice, arr => arr.mapv(Sample::to_f64))
    }

    /// Cast an `f64` plane to the requested element type.
    pub fn from_f64(plane: &Array2<f64>, element_type: ElementType) -> Self {
        match element_type {
            ElementType::U8 => Slice::U8(plane.mapv(u8::from_f64)),
            ElementType::U16 => Slice::U16(plane.mapv(u16::from_f64)),
            ElementType::U32 => Slice::U32(plane.mapv(u32::from_f64)),
            ElementType::F32 => Slice::F32(plane.mapv(f32::from_f64)),
            ElementType::F64 => Slice::F64(plane.clone()),
        }
    }

    /// Pick the given rows and columns, in order.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        each_variant!(self, Slice, arr => Slice::from(
            arr.select(Axis(0), rows).select(Axis(1), cols)
        ))
    }

    /// Smallest and largest sample, or `None` for an empty slice.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        each_variant!(self, Slice, arr => arr.iter().fold(None, |acc, &v| {
            let v = v.to_f64();
            match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            }
        }))
    }
}

/// Bytes one `(height, width)` plane of `element_type` takes, failing with
/// [`SlicerError::HeaderParse`] when the declared geometry overflows.
pub fn plane_bytes(shape: (usize, usize), element_type: ElementType) -> Result<usize> {
    shape
        .0
        .checked_mul(shape.1)
        .and_then(|n| n.checked_mul(element_type.size_in_bytes()))
        .ok_or_else(|| {
            SlicerError::HeaderParse(format!(
                "slice of {}x{} {element_type} samples is too large",
                shape.0, shape.1
            ))
        })
}

impl VolumeData {
    pub fn element_type(&self) -> ElementType {
        match self {
            VolumeData::U8(_) => ElementType::U8,
            VolumeData::U16(_) => ElementType::U16,
            VolumeData::U32(_) => ElementType::U32,
            VolumeData::F32(_) => ElementType::F32,
            VolumeData::F64(_) => ElementType::F64,
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        each_variant!(self, VolumeData, arr => arr.dim())
    }

    /// Copy out plane `z`. The caller checks bounds.
    pub fn plane(&self, z: usize) -> Slice {
        each_variant!(self, VolumeData, arr => Slice::from(
            arr.index_axis(Axis(0), z).to_owned()
        ))
    }

    /// Stack same-typed planes into a volume.
    pub fn from_slices(slices: Vec<Slice>) -> Result<Self> {
        let Some(first) = slices.first() else {
            return Err(SlicerError::SourceRead("no slices to stack".to_string()));
        };
        let (height, width) = first.dim();
        let depth = slices.len();

        macro_rules! stack {
            ($variant:ident, $t:ty) => {{
                let mut volume = Array3::<$t>::zeros((depth, height, width));
                for (z, slice) in slices.into_iter().enumerate() {
                    let actual = slice.element_type();
                    let Slice::$variant(plane) = slice else {
                        return Err(SlicerError::TypeMismatch {
                            expected: ElementType::$variant,
                            actual,
                        });
                    };
                    if plane.dim() != (height, width) {
                        return Err(SlicerError::SourceRead(format!(
                            "slice {z} has shape {:?}, expected {:?}",
                            plane.dim(),
                            (height, width)
                        )));
                    }
                    volume.index_axis_mut(Axis(0), z).assign(&plane);
                }
                VolumeData::$variant(volume)
            }};
        }

        Ok(match first.element_type() {
            ElementType::U8 => stack!(U8, u8),
            ElementType::U16 => stack!(U16, u16),
            ElementType::U32 => stack!(U32, u32),
            ElementType::F32 => stack!(F32, f32),
            ElementType::F64 => stack!(F64, f64),
        })
    }
}
