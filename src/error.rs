use std::path::PathBuf;

use thiserror::Error;

use crate::enums::ElementType;

pub type Result<T> = std::result::Result<T, SlicerError>;

#[derive(Debug, Error)]
pub enum SlicerError {
    #[error("Couldn't resolve volume {0}")]
    UnresolvedFormat(String),

    #[error("Unsupported datatype: {0}")]
    UnsupportedDatatype(String),

    #[error("Header parse error: {0}")]
    HeaderParse(String),

    #[error("Slice index {index} out of range for volume of length {length}")]
    OutOfRange { index: usize, length: usize },

    #[error("Source read error: {0}")]
    SourceRead(String),

    #[error("Destination {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("Indirection through {descriptor} exceeds {depth} levels")]
    IndirectionTooDeep { descriptor: String, depth: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output write error: {0}")]
    OutputWrite(String),

    #[error("Expected {expected} data, got {actual}")]
    TypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },
}

impl From<std::io::Error> for SlicerError {
    fn from(err: std::io::Error) -> Self {
        SlicerError::SourceRead(err.to_string())
    }
}

impl From<tiff::TiffError> for SlicerError {
    fn from(err: tiff::TiffError) -> Self {
        SlicerError::SourceRead(format!("TIFF: {err}"))
    }
}

impl From<image::ImageError> for SlicerError {
    fn from(err: image::ImageError) -> Self {
        SlicerError::SourceRead(format!("image: {err}"))
    }
}

impl From<ureq::Error> for SlicerError {
    fn from(err: ureq::Error) -> Self {
        SlicerError::SourceRead(format!("HTTP: {err}"))
    }
}
