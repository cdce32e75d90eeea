//! Built-in GeoJSON input and output driver.
//!
//! Inputs are read once when opened; only their bounding box is kept.
//! GeoJSON coordinates are always WGS84 lon/lat.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tile_common::{Area, Bounds, Crs, GridType};
use tracing::debug;

use super::{InputDriver, InputHandle, InputLoad, InputReader, InputSource, OutputDriver, OutputParams, OutputWriter};
use crate::error::DriverError;
use crate::input::{is_remote, normalize_path};

const NAME: &str = "GeoJSON";
const EXTENSIONS: &[&str] = &["geojson", "json"];

/// GeoJSON driver for both inputs and outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonDriver;

impl InputDriver for GeoJsonDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn file_extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    fn load(&self, request: &InputLoad<'_>) -> Result<InputHandle, DriverError> {
        let path = match request.source {
            InputSource::Path(path) => path.clone(),
            InputSource::Abstract { params, conf_dir } => {
                let path = params
                    .get("path")
                    .and_then(|p| p.as_str())
                    .ok_or_else(|| DriverError::Other("GeoJSON input requires a 'path'".to_string()))?;
                if is_remote(path) {
                    path.to_string()
                } else {
                    normalize_path(&conf_dir.join(path)).display().to_string()
                }
            }
        };
        if is_remote(&path) {
            return Err(DriverError::open(path, "remote GeoJSON inputs are not supported"));
        }

        let reader = GeoJsonReader::open(Path::new(&path))?;
        debug!(
            path = %path,
            features = reader.feature_count(),
            readonly = request.readonly,
            "Opened GeoJSON input"
        );
        Ok(Arc::new(reader))
    }
}

impl OutputDriver for GeoJsonDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn load(&self, params: &OutputParams) -> Result<Box<dyn OutputWriter>, DriverError> {
        Ok(Box::new(GeoJsonWriter {
            path: params.path.clone(),
        }))
    }
}

/// An opened GeoJSON file.
#[derive(Debug, Clone)]
pub struct GeoJsonReader {
    path: PathBuf,
    bounds: Option<Bounds>,
    feature_count: usize,
}

impl GeoJsonReader {
    /// Read and scan a GeoJSON file.
    pub fn open(path: &Path) -> Result<Self, DriverError> {
        let text = fs::read_to_string(path)
            .map_err(|e| DriverError::open(path.display().to_string(), e.to_string()))?;
        Self::parse(path, &text)
    }

    /// Scan GeoJSON text read from `path`.
    pub fn parse(path: &Path, text: &str) -> Result<Self, DriverError> {
        let invalid = |message: String| DriverError::invalid_data(path.display().to_string(), message);

        let json: JsonValue = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
        let kind = json
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| invalid("missing GeoJSON 'type'".to_string()))?;

        let feature_count = match kind {
            "FeatureCollection" => json
                .get("features")
                .and_then(|f| f.as_array())
                .map(|f| f.len())
                .ok_or_else(|| invalid("FeatureCollection without 'features'".to_string()))?,
            _ => 1,
        };

        let mut extent = None;
        collect_extent(&json, &mut extent);

        Ok(Self {
            path: path.to_path_buf(),
            bounds: extent,
            feature_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lon/lat extent of all coordinates, `None` for an empty file.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }
}

impl InputReader for GeoJsonReader {
    fn driver_name(&self) -> &str {
        NAME
    }

    fn bbox(&self, crs: Crs) -> Result<Area, DriverError> {
        Ok(match self.bounds {
            Some(bounds) => Area::from_bounds(Crs::Epsg4326.transform_bounds(&bounds, crs)),
            None => Area::empty(),
        })
    }
}

/// Walk geometry members, growing `extent` by every position found.
fn collect_extent(value: &JsonValue, extent: &mut Option<Bounds>) {
    match value {
        JsonValue::Object(map) => {
            for key in ["coordinates", "geometry", "geometries", "features"] {
                if let Some(child) = map.get(key) {
                    collect_extent(child, extent);
                }
            }
        }
        JsonValue::Array(items) => {
            if let [JsonValue::Number(x), JsonValue::Number(y), ..] = items.as_slice() {
                if let (Some(x), Some(y)) = (x.as_f64(), y.as_f64()) {
                    let point = Bounds::new(x, y, x, y);
                    let grown = match *extent {
                        Some(current) => current.union(&point),
                        None => point,
                    };
                    *extent = Some(grown);
                }
                return;
            }
            for item in items {
                collect_extent(item, extent);
            }
        }
        _ => {}
    }
}

/// GeoJSON output writer.
#[derive(Debug, Clone)]
pub struct GeoJsonWriter {
    path: Option<PathBuf>,
}

impl GeoJsonWriter {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl OutputWriter for GeoJsonWriter {
    fn driver_name(&self) -> &str {
        NAME
    }

    fn is_valid_with_config(&self, params: &OutputParams) -> Result<(), DriverError> {
        if params.path.is_none() {
            return Err(DriverError::incompatible("GeoJSON output requires a 'path'"));
        }
        if params.grid != GridType::Geodetic {
            return Err(DriverError::incompatible(format!(
                "GeoJSON output requires a geodetic pyramid, got {}",
                params.grid
            )));
        }
        Ok(())
    }
}
