//! # CT slicer library
//!
//! This crate reads tomographic volumes one slice at a time, whatever format
//! they are stored in, and writes downscaled copies of them as multi-page
//! TIFF files.
//!
//! A volume is addressed by a descriptor: a file, a folder, an `http(s)` URL
//! or a volume already held in memory. [`resolve`] picks the reader for it:
//!  - `.vgi`/`.vol` pairs (text header plus raw blob)
//!  - `.txm`/`.txrm` compound files
//!  - multi-page TIFF files, local or remote
//!  - folders of 2-D images, one slice per file
//!  - `.txt` files holding another descriptor
//!
//! Slices are returned as [`Slice`] values in the volume's own element type.
//! [`normalize`] maps them to 8 bits, and [`resample`](resample::resample)
//! streams a volume through a subsampling or blending downscaler.
//!
//! # Examples
//!
//! ## Downscaling a volume to a TIFF stack
//!
//! Open the volume described by `scan.vgi`, print the middle slice's value
//! range, then write a copy reduced four times along every axis.
//!
//! ```no_run
//! # use ct_slicer::{resolve, ResampleConfig, resample_to_file};
//! let mut slicer = resolve("scan.vgi").expect("should have resolved the volume");
//! let middle = slicer
//!     .slice_at(slicer.len() / 2)
//!     .expect("should have read the middle slice");
//! println!("{:?}", middle.min_max());
//!
//! let config = ResampleConfig {
//!     blend: true,
//!     ..ResampleConfig::with_factor(4)
//! };
//! resample_to_file(&mut slicer, "scan_small.tif", &config)
//!     .expect("should have written the downscaled volume");
//! ```

pub mod config;
pub mod enums;
pub mod error;
pub mod header;
pub mod normalize;
pub mod resample;
pub mod resolver;
pub mod slice;
pub mod slicer;

pub use config::{Cli, ResampleConfig};
pub use enums::{ElementType, NormalizePolicy, OutputType};
pub use error::{Result, SlicerError};
pub use resample::{FrameSink, ResampleSummary, resample, resample_to_file};
pub use resolver::{Descriptor, resolve};
pub use slice::{Sample, Slice, VolumeData};
pub use slicer::Slicer;
