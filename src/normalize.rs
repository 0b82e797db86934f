//! Intensity mapping stages.
//!
//! Each stage is a plain function from one plane to another so the resampler
//! can chain them: [`to_uint8`] for display-style 8-bit output,
//! [`rescale_to_unit`] to clip a declared value range onto `[0, 1]`, and
//! [`cast_unit`] to narrow a `[0, 1]` plane to an integer type.

use ndarray::Array2;

use crate::enums::{ElementType, NormalizePolicy};
use crate::slice::Slice;

impl NormalizePolicy {
    /// Pick the 8-bit mapping for a volume's element type and declared range.
    pub fn for_volume(element_type: ElementType, value_range: Option<(f64, f64)>) -> Self {
        match (element_type, value_range) {
            (ElementType::U8, _) => NormalizePolicy::Identity,
            (ElementType::U16, _) => NormalizePolicy::HighByte,
            (ty, Some((min, max))) if ty.is_float() && max > min => {
                NormalizePolicy::Range { min, max }
            }
            _ => NormalizePolicy::Slicewise,
        }
    }
}

/// Map a slice to 8-bit intensities.
///
/// A slice whose type does not fit the policy is stretched over its own
/// min..max instead.
pub fn to_uint8(slice: &Slice, policy: NormalizePolicy) -> Array2<u8> {
    match (policy, slice) {
        (NormalizePolicy::Identity, Slice::U8(plane)) => plane.clone(),
        (NormalizePolicy::HighByte, Slice::U16(plane)) => plane.mapv(|v| (v >> 8) as u8),
        (NormalizePolicy::Range { min, max }, _) => {
            stretch(&rescale_to_unit(&slice.to_f64(), (min, max)))
        }
        _ => slicewise(slice),
    }
}

fn slicewise(slice: &Slice) -> Array2<u8> {
    let plane = slice.to_f64();
    match slice.min_max() {
        Some((min, max)) if max > min => stretch(&plane.mapv(|v| (v - min) / (max - min))),
        _ => Array2::zeros(plane.dim()),
    }
}

/// `[0, 1]` to `0..=255`, truncating like an integer cast.
fn stretch(unit: &Array2<f64>) -> Array2<u8> {
    unit.mapv(|v| (v * 255.0) as u8)
}

/// Clip to `range` and map it linearly onto `[0, 1]`.
pub fn rescale_to_unit(plane: &Array2<f64>, range: (f64, f64)) -> Array2<f64> {
    let (min, max) = range;
    let span = max - min;
    if span <= 0.0 {
        return plane.mapv(|v| if v > min { 1.0 } else { 0.0 });
    }
    plane.mapv(|v| ((v - min) / span).clamp(0.0, 1.0))
}

/// Narrow a `[0, 1]` plane to the full range of an integer type, or keep it
/// as floating point.
pub fn cast_unit(unit: &Array2<f64>, element_type: ElementType) -> Slice {
    let scale = match element_type {
        ElementType::U8 => u8::MAX as f64,
        ElementType::U16 => u16::MAX as f64,
        ElementType::U32 => u32::MAX as f64,
        ElementType::F32 | ElementType::F64 => 1.0,
    };
    Slice::from_f64(&unit.mapv(|v| v * scale), element_type)
}
