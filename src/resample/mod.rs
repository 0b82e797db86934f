//! Streaming downscaler.
//!
//! A volume is reduced by the same integer factor along z, rows and columns
//! without ever holding more than a window of source slices. In subsample
//! mode each output frame is one source slice indexed at the selected rows
//! and columns. In blend mode source slices are accumulated along z with a
//! small Gaussian kernel, then blended along columns and rows, with the
//! kernel weights folded onto the edge samples at the volume borders.
//!
//! Frames are handed to a [`FrameSink`] in increasing z order as soon as they
//! are complete.

mod blend;
mod plan;
mod writer;

use std::path::Path;

use ndarray::{Array2, Axis};
use tracing::{debug, info};

use crate::config::ResampleConfig;
use crate::enums::{ElementType, NormalizePolicy};
use crate::error::{Result, SlicerError};
use crate::normalize::{cast_unit, rescale_to_unit, to_uint8};
use crate::slice::Slice;
use crate::slicer::Slicer;

pub use blend::{ZAccumulator, blend_axis};
pub use plan::{AxisPlan, ResamplePlan, edge_corrected_taps, kernel, selected_indices};
pub use writer::{FrameCollector, FrameSink, TiffStackWriter};

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleSummary {
    /// Output size as `(depth, height, width)`.
    pub output_shape: (usize, usize, usize),
    pub frames_written: usize,
    pub element_type: ElementType,
}

/// Per-slice intensity stages, applied in order.
#[derive(Debug, Clone, Copy)]
struct Stages {
    normalize: Option<NormalizePolicy>,
    value_range: Option<(f64, f64)>,
    output_type: ElementType,
}

impl Stages {
    fn new(slicer: &Slicer, config: &ResampleConfig) -> Self {
        let normalize = config
            .normalize
            .then(|| NormalizePolicy::for_volume(slicer.element_type(), slicer.value_range()));
        let working_type = if normalize.is_some() {
            ElementType::U8
        } else {
            slicer.element_type()
        };
        let output_type = match (config.value_range, config.output_dtype) {
            (Some(_), Some(ty)) => ty.into(),
            (Some(_), None) => ElementType::F32,
            (None, _) => working_type,
        };
        Self {
            normalize,
            value_range: config.value_range,
            output_type,
        }
    }

    /// Stage applied to every source slice as it is read.
    fn source(&self, slice: Slice) -> Slice {
        match self.normalize {
            Some(policy) => Slice::U8(to_uint8(&slice, policy)),
            None => slice,
        }
    }

    /// Stage turning a finished subsampled frame into its output type.
    fn output(&self, frame: Slice) -> Slice {
        match self.value_range {
            Some(range) => cast_unit(&rescale_to_unit(&frame.to_f64(), range), self.output_type),
            None => frame,
        }
    }

    /// Stage turning a finished blended frame into its output type.
    fn output_blended(&self, plane: &Array2<f64>) -> Slice {
        match self.value_range {
            Some(range) => cast_unit(&rescale_to_unit(plane, range), self.output_type),
            None => Slice::from_f64(plane, self.output_type),
        }
    }
}

/// Downscale `slicer` into `sink`.
///
/// The first source slice is read before anything is written, so a volume
/// that cannot be read at all leaves the sink untouched.
pub fn resample(
    slicer: &mut Slicer,
    config: &ResampleConfig,
    sink: &mut impl FrameSink,
) -> Result<ResampleSummary> {
    let (plan, stages) = prepare(slicer, config)?;
    run(slicer, &plan, stages, sink)
}

/// Downscale `slicer` into a multi-page TIFF at `destination`.
///
/// An existing destination is only replaced with `config.overwrite`. If a
/// read fails midway the partially written file is left behind and should be
/// treated as invalid.
pub fn resample_to_file(
    slicer: &mut Slicer,
    destination: impl AsRef<Path>,
    config: &ResampleConfig,
) -> Result<ResampleSummary> {
    let destination = destination.as_ref();
    if destination.exists() && !config.overwrite {
        return Err(SlicerError::DestinationExists(destination.to_path_buf()));
    }

    let (plan, stages) = prepare(slicer, config)?;
    let mut writer = TiffStackWriter::create(destination, config.overwrite)?;
    let summary = run(slicer, &plan, stages, &mut writer)?;
    info!(destination = %destination.display(), pages = writer.frames(), "wrote TIFF stack");
    Ok(summary)
}

fn prepare(slicer: &mut Slicer, config: &ResampleConfig) -> Result<(ResamplePlan, Stages)> {
    config.validate()?;
    slicer.slice_at(0)?;

    let plan = ResamplePlan::new(
        slicer.len(),
        slicer.slice_shape(),
        config.factor,
        config.blend,
    );
    let stages = Stages::new(slicer, config);
    info!(
        source = slicer.source_name(),
        input = ?(slicer.len(), slicer.slice_shape().0, slicer.slice_shape().1),
        output = ?plan.output_shape(),
        factor = config.factor,
        blend = config.blend,
        output_type = %stages.output_type,
        "resampling volume"
    );
    Ok((plan, stages))
}

fn run(
    slicer: &mut Slicer,
    plan: &ResamplePlan,
    stages: Stages,
    sink: &mut impl FrameSink,
) -> Result<ResampleSummary> {
    let frames_written = if plan.blend {
        run_blend(slicer, plan, stages, sink)?
    } else {
        run_subsample(slicer, plan, stages, sink)?
    };
    sink.finish()?;

    info!(frames = frames_written, "resampling finished");
    Ok(ResampleSummary {
        output_shape: plan.output_shape(),
        frames_written,
        element_type: stages.output_type,
    })
}

fn run_subsample(
    slicer: &mut Slicer,
    plan: &ResamplePlan,
    stages: Stages,
    sink: &mut impl FrameSink,
) -> Result<usize> {
    for (o, &z) in plan.z.indices.iter().enumerate() {
        let slice = stages.source(slicer.slice_at(z)?);
        let frame = stages.output(slice.select(&plan.rows.indices, &plan.cols.indices));
        sink.write_frame(&frame)?;
        debug!(frame = o, source_slice = z, "wrote frame");
    }
    Ok(plan.z.indices.len())
}

fn run_blend(
    slicer: &mut Slicer,
    plan: &ResamplePlan,
    stages: Stages,
    sink: &mut impl FrameSink,
) -> Result<usize> {
    let mut accumulator = ZAccumulator::new(&plan.z.taps);
    let mut written = 0;

    for z in 0..plan.z.length {
        if !accumulator.needs(z) {
            continue;
        }
        let plane = stages.source(slicer.slice_at(z)?).to_f64();

        for (o, summed) in accumulator.push(z, &plane) {
            let blended = blend_axis(&summed, &plan.cols.taps, Axis(1));
            let blended = blend_axis(&blended, &plan.rows.taps, Axis(0));
            sink.write_frame(&stages.output_blended(&blended))?;
            written += 1;
            debug!(frame = o, last_source_slice = z, "wrote blended frame");
        }
    }
    debug_assert!(accumulator.is_finished());
    Ok(written)
}
