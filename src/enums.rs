use std::fmt;

/// Element type of the samples stored in a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    U16,
    U32,
    F32,
    F64,
}

impl ElementType {
    /// Number of bytes a single sample occupies on disk.
    pub const fn size_in_bytes(&self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::U32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ElementType::U8 => "uint8",
            ElementType::U16 => "uint16",
            ElementType::U32 => "uint32",
            ElementType::F32 => "float32",
            ElementType::F64 => "float64",
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element types a resampled volume may be narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputType {
    #[default]
    U8,
    U16,
}

impl From<OutputType> for ElementType {
    fn from(value: OutputType) -> Self {
        match value {
            OutputType::U8 => ElementType::U8,
            OutputType::U16 => ElementType::U16,
        }
    }
}

/// How a slice is mapped to 8-bit intensities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizePolicy {
    /// Data already is 8-bit.
    Identity,
    /// 16-bit data keeps its high byte.
    HighByte,
    /// Clip to the declared range, then stretch it over 0..=255.
    Range { min: f64, max: f64 },
    /// Stretch each slice's own min..max over 0..=255.
    ///
    /// Two slices of one volume generally get different scalings.
    Slicewise,
}
