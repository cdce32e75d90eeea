//! Structural validation of a normalized document.

use std::path::PathBuf;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};
use tile_common::{Bounds, GridType};

use crate::error::{ConfigError, Result};
use crate::expr::{key_to_string, ConfigNode, NodeKey};
use crate::zoom::ZoomLevels;

/// Top-level keys never exposed as user parameters.
pub const RESERVED_PARAMETERS: [&str; 12] = [
    "baselevels",
    "pyramid",
    "zoom_levels",
    "bounds",
    "process_file",
    "config_dir",
    "process_minzoom",
    "process_maxzoom",
    "process_zoom",
    "process_bounds",
    "metatiling",
    "pixelbuffer",
];

/// Required top-level keys and their expected shape.
const MANDATORY_PARAMETERS: [(&str, Shape); 5] = [
    ("process_file", Shape::String),
    ("pyramid", Shape::Mapping),
    ("input", Shape::MappingOrNull),
    ("output", Shape::Mapping),
    ("zoom_levels", Shape::IntegerOrMapping),
];

#[derive(Debug, Clone, Copy)]
enum Shape {
    String,
    Mapping,
    MappingOrNull,
    IntegerOrMapping,
}

impl Shape {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Mapping => value.is_mapping(),
            Shape::MappingOrNull => value.is_mapping() || value.is_null(),
            Shape::IntegerOrMapping => value.is_i64() || value.is_u64() || value.is_mapping(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Shape::String => "a string",
            Shape::Mapping => "a mapping",
            Shape::MappingOrNull => "a mapping or null",
            Shape::IntegerOrMapping => "an integer or a mapping",
        }
    }
}

/// The `pyramid` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidSection {
    pub grid: GridType,
    pub metatiling: u32,
    pub pixelbuffer: u32,
}

impl PyramidSection {
    pub fn from_mapping(map: &Mapping) -> Result<Self> {
        let grid = map
            .get("grid")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::pyramid("pyramid grid not given"))?;
        let grid = GridType::from_str(grid)?;

        Ok(Self {
            grid,
            metatiling: optional_u32(map, "metatiling", 1)?,
            pixelbuffer: optional_u32(map, "pixelbuffer", 0)?,
        })
    }
}

/// Read an optional non-negative integer from a pyramid-like mapping.
pub(crate) fn optional_u32(map: &Mapping, key: &str, default: u32) -> Result<u32> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                ConfigError::pyramid(format!(
                    "{} must be a non-negative integer, got {:?}",
                    key, value
                ))
            }),
    }
}

/// Parse a 4-number bounds sequence.
pub fn bounds_from_value(value: &Value) -> Result<Bounds> {
    let items = value
        .as_sequence()
        .ok_or_else(|| ConfigError::bounds(format!("bounds must be a list, got {:?}", value)))?;
    let numbers = items
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| ConfigError::bounds(format!("bounds must be numbers, got {:?}", v)))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Bounds::from_slice(&numbers)?)
}

/// A structurally valid document.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub config_dir: PathBuf,
    pub mapchete_file: Option<PathBuf>,
    pub process_file: String,
    pub pyramid: PyramidSection,
    pub zoom_levels: ZoomLevels,
    /// Declared process bounds, `None` for the full pyramid.
    pub bounds: Option<Bounds>,
    pub output: Mapping,
    pub baselevels: Option<Mapping>,
    /// Non-reserved parameters including `input` and `output`.
    pub params: Vec<(NodeKey, ConfigNode)>,
}

impl RawDocument {
    /// Validate a normalized document.
    pub fn from_mapping(
        mapping: Mapping,
        config_dir: PathBuf,
        mapchete_file: Option<PathBuf>,
    ) -> Result<Self> {
        for (key, shape) in MANDATORY_PARAMETERS {
            let value = mapping
                .get(key)
                .ok_or_else(|| ConfigError::schema(format!("{} parameter missing", key)))?;
            if !shape.accepts(value) {
                return Err(ConfigError::schema(format!(
                    "{} must be {}, got {:?}",
                    key,
                    shape.describe(),
                    value
                )));
            }
        }

        let process_file = string_at(&mapping, "process_file")?;
        let pyramid = PyramidSection::from_mapping(mapping_at(&mapping, "pyramid")?)?;
        let zoom_levels = ZoomLevels::from_value(value_at(&mapping, "zoom_levels")?)?;
        let bounds = match mapping.get("bounds") {
            None | Some(Value::Null) => None,
            Some(value) => Some(bounds_from_value(value)?),
        };
        let output = mapping_at(&mapping, "output")?.clone();
        let baselevels = match mapping.get("baselevels") {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(map)) => Some(map.clone()),
            Some(other) => {
                return Err(ConfigError::schema(format!(
                    "baselevels must be a mapping, got {:?}",
                    other
                )))
            }
        };

        let mut params = Vec::new();
        for (key, value) in &mapping {
            let name = key_to_string(key)?;
            if RESERVED_PARAMETERS.contains(&name.as_str()) {
                continue;
            }
            params.push((NodeKey::parse(name)?, ConfigNode::parse(value)?));
        }

        Ok(Self {
            config_dir,
            mapchete_file,
            process_file,
            pyramid,
            zoom_levels,
            bounds,
            output,
            baselevels,
            params,
        })
    }
}

fn value_at<'a>(mapping: &'a Mapping, key: &str) -> Result<&'a Value> {
    mapping
        .get(key)
        .ok_or_else(|| ConfigError::schema(format!("{} parameter missing", key)))
}

fn string_at(mapping: &Mapping, key: &str) -> Result<String> {
    value_at(mapping, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::schema(format!("{} must be a string", key)))
}

fn mapping_at<'a>(mapping: &'a Mapping, key: &str) -> Result<&'a Mapping> {
    value_at(mapping, key)?
        .as_mapping()
        .ok_or_else(|| ConfigError::schema(format!("{} must be a mapping", key)))
}
