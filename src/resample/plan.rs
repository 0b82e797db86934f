//! Which source samples feed each output sample, and with what weight.

/// Source indices kept when an axis of `length` samples is reduced by
/// `factor`: every `factor`-th index, starting at `((length - 1) % factor) / 2`
/// so the leftover samples are split between both ends (one extra at the high
/// end when the leftover is odd).
pub fn selected_indices(length: usize, factor: usize) -> Vec<usize> {
    if length == 0 || factor == 0 {
        return Vec::new();
    }
    let start = ((length - 1) % factor) / 2;
    (start..length).step_by(factor).collect()
}

/// Symmetric smoothing kernel for a downscale factor, with `2 * (factor / 2) + 1`
/// taps following a Gaussian of standard deviation `factor / 3`, normalized to
/// sum to one.
pub fn kernel(factor: usize) -> Vec<f64> {
    let radius = (factor / 2) as i64;
    let sigma = factor.max(1) as f64 / 3.0;
    let raw: Vec<f64> = (-radius..=radius)
        .map(|k| (-((k * k) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Taps of `kernel` centred on `center`, with taps that fall outside
/// `[0, length)` folded onto the nearest edge sample. Indices are ascending
/// and unique, and the weights keep the kernel's sum.
pub fn edge_corrected_taps(center: usize, length: usize, kernel: &[f64]) -> Vec<(usize, f64)> {
    let radius = (kernel.len() / 2) as i64;
    let last = length.saturating_sub(1) as i64;
    let mut taps: Vec<(usize, f64)> = Vec::with_capacity(kernel.len());

    for (k, &weight) in (-radius..=radius).zip(kernel) {
        let index = (center as i64 + k).clamp(0, last) as usize;
        match taps.last_mut() {
            Some((prev, sum)) if *prev == index => *sum += weight,
            _ => taps.push((index, weight)),
        }
    }
    taps
}

/// Selection, and for blending the per-output weights, along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisPlan {
    pub length: usize,
    pub indices: Vec<usize>,
    /// One tap list per entry of `indices`; empty when not blending.
    pub taps: Vec<Vec<(usize, f64)>>,
}

impl AxisPlan {
    pub fn subsample(length: usize, factor: usize) -> Self {
        Self {
            length,
            indices: selected_indices(length, factor),
            taps: Vec::new(),
        }
    }

    pub fn blend(length: usize, factor: usize) -> Self {
        let indices = selected_indices(length, factor);
        let kernel = kernel(factor);
        let taps = indices
            .iter()
            .map(|&center| edge_corrected_taps(center, length, &kernel))
            .collect();
        Self {
            length,
            indices,
            taps,
        }
    }

    pub fn output_len(&self) -> usize {
        self.indices.len()
    }
}

/// Per-axis plans for one resampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResamplePlan {
    pub factor: usize,
    pub blend: bool,
    pub z: AxisPlan,
    pub rows: AxisPlan,
    pub cols: AxisPlan,
}

impl ResamplePlan {
    pub fn new(length: usize, slice_shape: (usize, usize), factor: usize, blend: bool) -> Self {
        let axis: fn(usize, usize) -> AxisPlan = if blend {
            AxisPlan::blend
        } else {
            AxisPlan::subsample
        };
        Self {
            factor,
            blend,
            z: axis(length, factor),
            rows: axis(slice_shape.0, factor),
            cols: axis(slice_shape.1, factor),
        }
    }

    /// Output size as `(depth, height, width)`.
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (
            self.z.output_len(),
            self.rows.output_len(),
            self.cols.output_len(),
        )
    }
}
