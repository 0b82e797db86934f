//! Parsers for the metadata that accompanies raw volume data.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::enums::ElementType;
use crate::error::{Result, SlicerError};

/// Section a VGI header normally keeps the volume file description in.
const VGI_FILE_SECTION: &str = "file1";

/// Geometry and datatype from a `.vgi` header.
#[derive(Debug, Clone, PartialEq)]
pub struct VgiHeader {
    /// Declared size as `(x, y, z)`.
    pub size: (usize, usize, usize),
    pub element_type: ElementType,
    pub value_range: Option<(f64, f64)>,
}

impl VgiHeader {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Parse the key/value block of a VGI header.
    ///
    /// The first line is skipped and parsing stops at the first line opening a
    /// `{...}` section. Keys are matched case-insensitively.
    pub fn parse(text: &str) -> Result<Self> {
        let sections = parse_sections(text);
        let section = sections
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(VGI_FILE_SECTION))
            .or_else(|| sections.iter().find(|(_, keys)| keys.contains_key("size")))
            .map(|(_, keys)| keys)
            .ok_or_else(|| SlicerError::HeaderParse("no section declares a Size".to_string()))?;

        let get = |key: &str| {
            section
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| SlicerError::HeaderParse(format!("missing key `{key}`")))
        };

        let size = parse_numbers::<usize>(get("size")?, "Size")?;
        let &[x, y, z] = size.as_slice() else {
            return Err(SlicerError::HeaderParse(format!(
                "Size must have 3 values, got {}",
                size.len()
            )));
        };

        let category = get("datatype")?;
        let bits = get("bitsperelement")?.trim().parse::<u32>().map_err(|e| {
            SlicerError::HeaderParse(format!("BitsPerElement is not an integer: {e}"))
        })?;
        let element_type = vgi_element_type(category, bits)?;

        let value_range = match section.get("datarange") {
            Some(text) => match parse_numbers::<f64>(text, "datarange")?.as_slice() {
                &[min, max] => Some((min, max)),
                other => {
                    return Err(SlicerError::HeaderParse(format!(
                        "datarange must have 2 values, got {}",
                        other.len()
                    )));
                }
            },
            None => None,
        };

        Ok(Self {
            size: (x, y, z),
            element_type,
            value_range,
        })
    }

    /// Shape of one slice as `(height, width)`.
    pub fn slice_shape(&self) -> (usize, usize) {
        (self.size.1, self.size.0)
    }

    pub fn length(&self) -> usize {
        self.size.2
    }
}

/// Map a VGI `Datatype`/`BitsPerElement` pair to an element type.
pub fn vgi_element_type(category: &str, bits: u32) -> Result<ElementType> {
    match (category.trim().to_ascii_lowercase().as_str(), bits) {
        ("unsigned integer", 8) => Ok(ElementType::U8),
        ("unsigned integer", 16) => Ok(ElementType::U16),
        ("unsigned integer", 32) => Ok(ElementType::U32),
        ("float", 32) => Ok(ElementType::F32),
        ("float", 64) => Ok(ElementType::F64),
        (other, bits) => Err(SlicerError::UnsupportedDatatype(format!(
            "{other} with {bits} bits per element"
        ))),
    }
}

/// Map a TXM `/ImageInfo/DataType` code to an element type.
pub fn txm_element_type(code: u32) -> Result<ElementType> {
    match code {
        5 => Ok(ElementType::U16),
        10 => Ok(ElementType::F32),
        other => Err(SlicerError::UnsupportedDatatype(format!(
            "TXM data type code {other}"
        ))),
    }
}

fn parse_sections(text: &str) -> Vec<(String, HashMap<String, String>)> {
    let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();

    for line in text.lines().skip(1) {
        let line = line.trim();
        if line.starts_with('{') {
            break;
        }
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push((name.trim().to_string(), HashMap::new()));
            continue;
        }
        if let (Some((key, value)), Some((_, keys))) = (line.split_once('='), sections.last_mut())
        {
            keys.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    sections
}

fn parse_numbers<T: std::str::FromStr>(text: &str, key: &str) -> Result<Vec<T>>
where
    T::Err: std::fmt::Display,
{
    text.split_whitespace()
        .map(|n| {
            n.parse::<T>()
                .map_err(|e| SlicerError::HeaderParse(format!("{key}: `{n}`: {e}")))
        })
        .collect()
}
