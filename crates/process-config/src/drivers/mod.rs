//! Input reader and output writer driver interfaces.
//!
//! Drivers are looked up in a [`DriverRegistry`]: input drivers by file
//! extension (path declarations) or by `format` name (mapping
//! declarations), output drivers by `format` name.

mod geojson;

pub use geojson::{GeoJsonDriver, GeoJsonReader, GeoJsonWriter};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_yaml::Mapping;
use tile_common::{Area, Bounds, Crs, GridType, TilePyramid};

use crate::error::DriverError;
use crate::expr::FORMAT_KEY;
use crate::zoom::ZoomLevels;

/// Shared handle to an opened input.
pub type InputHandle = Arc<dyn InputReader>;

/// An opened input.
pub trait InputReader: Send + Sync + fmt::Debug {
    /// Name of the driver that opened this input.
    fn driver_name(&self) -> &str;

    /// Bounding geometry of the input in the given CRS.
    ///
    /// # Arguments
    /// * `crs` - Target CRS, the process pyramid's CRS
    ///
    /// # Returns
    /// * An empty [`Area`] if the input holds no data
    fn bbox(&self, crs: Crs) -> Result<Area, DriverError>;
}

/// Limits shared by all inputs of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delimiters {
    /// Initialized zoom levels.
    pub zoom: ZoomLevels,
    /// Initialized bounds.
    pub bounds: Bounds,
    /// Declared process bounds.
    pub process_bounds: Bounds,
}

/// What an input declaration points at, after base directory resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// Local path joined with the base directory, or a remote URL.
    Path(String),
    /// Mapping declaration plus the base directory for its own references.
    Abstract { params: Mapping, conf_dir: PathBuf },
}

impl InputSource {
    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            InputSource::Path(path) => path.clone(),
            InputSource::Abstract { params, .. } => match params.get(FORMAT_KEY).and_then(|f| f.as_str()) {
                Some(format) => format!("{} input", format),
                None => "abstract input".to_string(),
            },
        }
    }
}

/// Everything a driver needs to open an input.
#[derive(Debug, Clone, Copy)]
pub struct InputLoad<'a> {
    pub source: &'a InputSource,
    pub pyramid: &'a TilePyramid,
    pub pixelbuffer: u32,
    pub delimiters: &'a Delimiters,
    pub readonly: bool,
}

/// Opens inputs of one format.
pub trait InputDriver: Send + Sync {
    /// Format name matched against `format` in mapping declarations.
    fn name(&self) -> &str;

    /// Lowercase file extensions handled for path declarations.
    fn file_extensions(&self) -> &[&str];

    /// Open an input.
    ///
    /// # Arguments
    /// * `request` - Source, process pyramid and delimiters
    ///
    /// # Returns
    /// * A shareable handle to the opened input
    fn load(&self, request: &InputLoad<'_>) -> Result<InputHandle, DriverError>;
}

/// Output parameters after enrichment from the output pyramid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputParams {
    pub format: String,
    /// Normalized output path; `None` if the document gives none.
    pub path: Option<PathBuf>,
    pub grid: GridType,
    pub pixelbuffer: u32,
    pub metatiling: u32,
    /// Remaining driver specific keys.
    pub extra: Mapping,
}

/// An opened output.
pub trait OutputWriter: Send + Sync + fmt::Debug {
    fn driver_name(&self) -> &str;

    /// Check that the writer can produce output with these parameters.
    fn is_valid_with_config(&self, params: &OutputParams) -> Result<(), DriverError>;
}

/// Creates output writers of one format.
pub trait OutputDriver: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self, params: &OutputParams) -> Result<Box<dyn OutputWriter>, DriverError>;
}

/// Registered input and output drivers.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    inputs: Vec<Arc<dyn InputDriver>>,
    outputs: Vec<Arc<dyn OutputDriver>>,
}

impl DriverRegistry {
    /// Registry without any drivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in GeoJSON driver.
    pub fn with_builtin() -> Self {
        let geojson = Arc::new(GeoJsonDriver);
        let input: Arc<dyn InputDriver> = geojson.clone();
        let output: Arc<dyn OutputDriver> = geojson;
        Self {
            inputs: vec![input],
            outputs: vec![output],
        }
    }

    pub fn register_input<D: InputDriver + 'static>(&mut self, driver: D) -> &mut Self {
        self.inputs.push(Arc::new(driver));
        self
    }

    pub fn register_output<D: OutputDriver + 'static>(&mut self, driver: D) -> &mut Self {
        self.outputs.push(Arc::new(driver));
        self
    }

    pub fn available_input_formats(&self) -> Vec<&str> {
        self.inputs.iter().map(|d| d.name()).collect()
    }

    pub fn available_output_formats(&self) -> Vec<&str> {
        self.outputs.iter().map(|d| d.name()).collect()
    }

    /// Input driver for a source; later registrations take precedence.
    pub fn input_driver(&self, source: &InputSource) -> Result<&dyn InputDriver, DriverError> {
        let found = match source {
            InputSource::Path(path) => {
                let extension = Path::new(path)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase())
                    .unwrap_or_default();
                self.inputs
                    .iter()
                    .rev()
                    .find(|d| d.file_extensions().contains(&extension.as_str()))
            }
            InputSource::Abstract { params, .. } => {
                let format = params.get(FORMAT_KEY).and_then(|f| f.as_str()).unwrap_or_default();
                self.inputs.iter().rev().find(|d| d.name() == format)
            }
        };
        found
            .map(|d| d.as_ref())
            .ok_or_else(|| DriverError::NoDriver(source.describe()))
    }

    pub fn output_driver(&self, format: &str) -> Option<&dyn OutputDriver> {
        self.outputs
            .iter()
            .rev()
            .find(|d| d.name() == format)
            .map(|d| d.as_ref())
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("inputs", &self.available_input_formats())
            .field("outputs", &self.available_output_formats())
            .finish()
    }
}
