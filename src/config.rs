//! Resampler options and the command line that fills them in.
//!
//! Every flag can also be set through an environment variable with the
//! `CT_SLICER_` prefix, e.g. `CT_SLICER_FACTOR=4`.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::TypedValueParser;

use crate::enums::OutputType;
use crate::error::{Result, SlicerError};

/// Default downscale factor.
pub const DEFAULT_FACTOR: usize = 8;

/// Default output file name.
pub const DEFAULT_DESTINATION: &str = "tiffified_volume.tif";

/// Options for one resampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleConfig {
    /// Downscale applied to all three axes.
    pub factor: usize,
    /// Clip to this range and rescale it to `[0, 1]`.
    pub value_range: Option<(f64, f64)>,
    /// Narrow the rescaled output to this type. Needs `value_range`.
    pub output_dtype: Option<OutputType>,
    /// Replace an existing destination.
    pub overwrite: bool,
    /// Smooth before subsampling.
    pub blend: bool,
    /// Map every source slice to 8 bits before resampling.
    pub normalize: bool,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            factor: DEFAULT_FACTOR,
            value_range: None,
            output_dtype: None,
            overwrite: false,
            blend: false,
            normalize: false,
        }
    }
}

impl ResampleConfig {
    pub fn with_factor(factor: usize) -> Self {
        Self {
            factor,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.factor == 0 {
            return Err(SlicerError::InvalidConfig(
                "factor must be at least 1".to_string(),
            ));
        }
        if let Some((min, max)) = self.value_range {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(SlicerError::InvalidConfig(format!(
                    "value range [{min}, {max}] must be finite and increasing"
                )));
            }
        }
        if self.output_dtype.is_some() && self.value_range.is_none() {
            return Err(SlicerError::InvalidConfig(
                "an output type needs a value range to rescale from".to_string(),
            ));
        }
        Ok(())
    }
}

/// Save a volume as a downscaled multi-page TIFF.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-slicer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Volume to read: a file, folder, URL, or .txt file naming one of those.
    pub source: String,

    /// Output TIFF file.
    #[arg(default_value = DEFAULT_DESTINATION)]
    pub destination: PathBuf,

    /// Downscale factor applied to every axis.
    #[arg(short, long, default_value_t = DEFAULT_FACTOR, env = "CT_SLICER_FACTOR",
          value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub factor: usize,

    /// Clip values to MIN..MAX and rescale to [0, 1].
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true,
          value_delimiter = ',', env = "CT_SLICER_RANGE")]
    pub range: Option<Vec<f64>>,

    /// Output element type (requires --range).
    #[arg(long, value_enum, requires = "range", env = "CT_SLICER_DTYPE")]
    pub dtype: Option<OutputType>,

    /// Replace the destination if it exists.
    #[arg(long, env = "CT_SLICER_OVERWRITE")]
    pub overwrite: bool,

    /// Smooth before subsampling instead of picking single samples.
    #[arg(long, env = "CT_SLICER_BLEND")]
    pub blend: bool,

    /// Map source slices to 8 bits before resampling.
    #[arg(long, env = "CT_SLICER_NORMALIZE")]
    pub normalize: bool,

    /// Only print what the source resolves to.
    #[arg(long, env = "CT_SLICER_INFO")]
    pub info: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, env = "CT_SLICER_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    pub fn resample_config(&self) -> ResampleConfig {
        ResampleConfig {
            factor: self.factor,
            value_range: self
                .range
                .as_deref()
                .and_then(|r| match r {
                    &[min, max] => Some((min, max)),
                    _ => None,
                }),
            output_dtype: self.dtype,
            overwrite: self.overwrite,
            blend: self.blend,
            normalize: self.normalize,
        }
    }
}
