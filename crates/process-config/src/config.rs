//! The resolved process configuration.
//!
//! Construction runs these stages in order and stops at the first error:
//!
//! ```text
//! Normalize → ValidateSchema → ValidateProcessFile → BuildPyramids
//!   → ValidateMode → ComputeRawPerZoom → LoadOutputDriver
//!   → MaterializeInputs → Ready
//! ```
//!
//! A [`Configuration`] is immutable once built. Areas are computed lazily
//! and memoized in single-threaded cells, so the type is not `Sync`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tile_common::{Area, Bounds, TilePyramid};
use tracing::{debug, info};

use crate::area::AreaCache;
use crate::baselevels::{resolve_baselevels, Baselevels};
use crate::document::{load_document, DocumentSource, LoadedDocument};
use crate::drivers::{Delimiters, DriverRegistry, InputHandle, OutputParams, OutputWriter};
use crate::error::{ConfigError, DriverError, Result};
use crate::expr::{resolve_params, INPUT_KEY};
use crate::hash::ContentId;
use crate::input::{input_tree_from_value, normalize_path, InputDeclaration, InputRegistry, LoadContext};
use crate::mode::ProcessingMode;
use crate::normalize::{normalize, Normalized};
use crate::pyramids::{build_pyramids, output_params};
use crate::schema::RawDocument;
use crate::tree::{flatten, get_path, unflatten, TreeMap};
use crate::zoom::ZoomLevels;

/// Options narrowing a configuration at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct InitOptions {
    /// One zoom or a pair of zooms; all declared zooms if `None`.
    pub zoom: Option<Vec<u32>>,
    /// Left, bottom, right, top; declared bounds if `None`.
    pub bounds: Option<Vec<f64>>,
    /// One of `memory`, `readonly`, `continue`, `overwrite`.
    pub mode: String,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            zoom: None,
            bounds: None,
            mode: ProcessingMode::default().to_string(),
        }
    }
}

impl InitOptions {
    pub fn with_zoom(mut self, zoom: impl Into<Vec<u32>>) -> Self {
        self.zoom = Some(zoom.into());
        self
    }

    pub fn with_bounds(mut self, bounds: impl Into<Vec<f64>>) -> Self {
        self.bounds = Some(bounds.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

/// User parameters and bound inputs at one zoom level.
#[derive(Debug, Clone)]
pub struct ConfigurationSnapshot {
    pub zoom: u32,
    /// Resolved user parameters, `input` excluded.
    pub params: Mapping,
    /// Input tree; `None` leaves are unbound at this zoom.
    pub input: TreeMap<Option<InputHandle>>,
}

impl ConfigurationSnapshot {
    /// Handle bound at a slash-joined input path.
    pub fn input_at(&self, path: &str) -> Option<&InputHandle> {
        get_path(&self.input, path)?.as_leaf()?.as_ref()
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Zoom-filtered parameters with the input subtree flattened to identities.
#[derive(Debug, Clone)]
struct ZoomParams {
    params: Mapping,
    input: Option<BTreeMap<String, Option<ContentId>>>,
}

/// A validated process configuration.
#[derive(Debug)]
pub struct Configuration {
    raw: RawDocument,
    process_file: PathBuf,
    deprecations: Vec<String>,
    mode: ProcessingMode,
    process_pyramid: TilePyramid,
    output_pyramid: TilePyramid,
    baselevels: Option<Baselevels>,
    init_zoom_levels: ZoomLevels,
    bounds: Bounds,
    init_bounds: Bounds,
    params_at_zoom: BTreeMap<u32, ZoomParams>,
    declarations: BTreeMap<ContentId, InputDeclaration>,
    output_params: OutputParams,
    output: Box<dyn OutputWriter>,
    inputs: InputRegistry,
    areas: AreaCache,
}

impl Configuration {
    /// Build a configuration.
    ///
    /// # Arguments
    /// * `source` - `.mapchete` file path or mapping with `config_dir`
    /// * `options` - Initialized zooms, bounds and processing mode
    /// * `drivers` - Input and output drivers to open the declarations with
    pub fn new(
        source: impl Into<DocumentSource>,
        options: InitOptions,
        drivers: &DriverRegistry,
    ) -> Result<Self> {
        let LoadedDocument {
            mapping,
            config_dir,
            mapchete_file,
        } = load_document(&source.into())?;

        debug!(config_dir = %config_dir.display(), "Normalizing document");
        let Normalized {
            mapping,
            deprecations,
        } = normalize(mapping)?;

        debug!("Validating document schema");
        let raw = RawDocument::from_mapping(mapping, config_dir, mapchete_file)?;

        debug!(process_file = %raw.process_file, "Validating process file");
        let process_file = validate_process_file(&raw.config_dir, &raw.process_file)?;

        debug!(grid = %raw.pyramid.grid, metatiling = raw.pyramid.metatiling, "Building pyramids");
        let pyramids = build_pyramids(&raw.pyramid, &raw.output)?;
        let baselevels = raw
            .baselevels
            .as_ref()
            .map(|b| resolve_baselevels(b, &raw.zoom_levels, &pyramids.process, &pyramids.output))
            .transpose()?;

        debug!(mode = %options.mode, "Validating mode");
        let mode: ProcessingMode = options.mode.parse()?;

        let init_zoom_levels = match &options.zoom {
            Some(zooms) => ZoomLevels::from_slice(zooms)?,
            None => raw.zoom_levels,
        };
        if !init_zoom_levels.is_subset_of(&raw.zoom_levels) {
            return Err(ConfigError::zoom_range(format!(
                "initialized zoom levels {} are not within process zoom levels {}",
                init_zoom_levels, raw.zoom_levels
            )));
        }
        let bounds = raw.bounds.unwrap_or_else(|| pyramids.process.bounds());
        let init_bounds = match &options.bounds {
            Some(values) => Bounds::from_slice(values)?,
            None => bounds,
        };

        debug!(zoom_levels = %init_zoom_levels, "Resolving parameters per zoom");
        let mut declarations = BTreeMap::new();
        let mut params_at_zoom = BTreeMap::new();
        for zoom in init_zoom_levels {
            let mut params = resolve_params(&raw.params, zoom);
            let input = match params.remove(INPUT_KEY) {
                Some(value) => Some(flatten_input(&value, &mut declarations)?),
                None => None,
            };
            params_at_zoom.insert(zoom, ZoomParams { params, input });
        }

        let output_params = output_params(&raw.output, &raw.config_dir, &pyramids.output, drivers)?;
        debug!(format = %output_params.format, "Loading output driver");
        let output = load_output(&output_params, drivers)?;

        debug!(inputs = declarations.len(), "Materializing inputs");
        let delimiters = Delimiters {
            zoom: init_zoom_levels,
            bounds: init_bounds,
            process_bounds: bounds,
        };
        let ctx = LoadContext {
            config_dir: &raw.config_dir,
            pyramid: &pyramids.process,
            delimiters: &delimiters,
            readonly: mode.is_readonly(),
        };
        let inputs = InputRegistry::materialize(declarations.values(), &ctx, drivers)?;

        info!(
            process_file = %process_file.display(),
            zoom_levels = %init_zoom_levels,
            inputs = inputs.len(),
            output = %output_params.format,
            mode = %mode,
            "Configuration ready"
        );

        Ok(Self {
            raw,
            process_file,
            deprecations,
            mode,
            process_pyramid: pyramids.process,
            output_pyramid: pyramids.output,
            baselevels,
            init_zoom_levels,
            bounds,
            init_bounds,
            params_at_zoom,
            declarations,
            output_params,
            output,
            inputs,
            areas: AreaCache::new(),
        })
    }

    /// Load a `.mapchete` file with default options and the built-in drivers.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(
            path.as_ref(),
            InitOptions::default(),
            &DriverRegistry::with_builtin(),
        )
    }

    /// Parameters and bound input handles at `zoom`.
    pub fn snapshot(&self, zoom: u32) -> Result<ConfigurationSnapshot> {
        let zoom_params = self.zoom_params(zoom)?;
        let input = match &zoom_params.input {
            Some(flat) => {
                let mut entries = Vec::with_capacity(flat.len());
                for (path, id) in flat {
                    let handle = match id {
                        Some(id) => Some(self.handle(id, path)?.clone()),
                        None => None,
                    };
                    entries.push((path.clone(), handle));
                }
                unflatten(entries)?
            }
            None => TreeMap::new(),
        };

        Ok(ConfigurationSnapshot {
            zoom,
            params: zoom_params.params.clone(),
            input,
        })
    }

    /// Input declarations bound at `zoom`, keyed by slash-joined path.
    pub fn input_declarations_at(&self, zoom: u32) -> Result<BTreeMap<String, Option<&InputDeclaration>>> {
        let zoom_params = self.zoom_params(zoom)?;
        let mut out = BTreeMap::new();
        if let Some(flat) = &zoom_params.input {
            for (path, id) in flat {
                out.insert(path.clone(), id.as_ref().and_then(|id| self.declarations.get(id)));
            }
        }
        Ok(out)
    }

    /// Process area at `zoom`, or over all initialized zooms for `None`.
    ///
    /// At a zoom with inputs this is the union of their bounding boxes
    /// clipped to the initialized bounds; without inputs it is the
    /// initialized bounds box. The result may be empty.
    pub fn area(&self, zoom: Option<u32>) -> Result<Area> {
        match zoom {
            Some(zoom) => self.area_at_zoom(zoom),
            None => self.areas.global(|| {
                let mut areas = Vec::with_capacity(self.init_zoom_levels.len());
                for zoom in self.init_zoom_levels {
                    areas.push(self.area_at_zoom(zoom)?);
                }
                Ok(Area::union_all(&areas))
            }),
        }
    }

    /// Envelope of [`Configuration::area`]; `None` if the area is empty.
    pub fn bounds(&self, zoom: Option<u32>) -> Result<Option<Bounds>> {
        Ok(self.area(zoom)?.envelope())
    }

    /// Configurations cannot be changed after construction.
    pub fn update(&mut self, _changes: Mapping) -> Result<()> {
        Err(ConfigError::Unsupported(
            "updating an existing configuration".to_string(),
        ))
    }

    pub fn output_handle(&self) -> &dyn OutputWriter {
        self.output.as_ref()
    }

    pub fn output_params(&self) -> &OutputParams {
        &self.output_params
    }

    /// Opened inputs keyed by content identity.
    pub fn input_handles(&self) -> &BTreeMap<ContentId, InputHandle> {
        self.inputs.handles()
    }

    /// Warnings for deprecated keys found in the document.
    pub fn deprecations(&self) -> &[String] {
        &self.deprecations
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn config_dir(&self) -> &Path {
        &self.raw.config_dir
    }

    pub fn mapchete_file(&self) -> Option<&Path> {
        self.raw.mapchete_file.as_deref()
    }

    pub fn process_file(&self) -> &Path {
        &self.process_file
    }

    pub fn process_pyramid(&self) -> &TilePyramid {
        &self.process_pyramid
    }

    pub fn output_pyramid(&self) -> &TilePyramid {
        &self.output_pyramid
    }

    pub fn baselevels(&self) -> Option<&Baselevels> {
        self.baselevels.as_ref()
    }

    /// Declared zoom levels.
    pub fn zoom_levels(&self) -> ZoomLevels {
        self.raw.zoom_levels
    }

    pub fn init_zoom_levels(&self) -> ZoomLevels {
        self.init_zoom_levels
    }

    /// Declared process bounds, the pyramid bounds if none were given.
    pub fn process_bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn init_bounds(&self) -> Bounds {
        self.init_bounds
    }

    fn zoom_params(&self, zoom: u32) -> Result<&ZoomParams> {
        self.params_at_zoom.get(&zoom).ok_or_else(|| {
            ConfigError::zoom_range(format!(
                "zoom level {} not available, initialized zoom levels are {}",
                zoom, self.init_zoom_levels
            ))
        })
    }

    fn handle(&self, id: &ContentId, path: &str) -> Result<&InputHandle> {
        self.inputs.get(id).ok_or_else(|| {
            ConfigError::schema(format!("no input opened for '{}' ({})", path, id.short()))
        })
    }

    fn area_at_zoom(&self, zoom: u32) -> Result<Area> {
        let zoom_params = self.zoom_params(zoom)?;
        self.areas.at_zoom(zoom, || {
            let Some(flat) = &zoom_params.input else {
                return Ok(Area::from_bounds(self.init_bounds));
            };
            let crs = self.process_pyramid.crs();
            let mut areas = Vec::new();
            for (path, id) in flat {
                let Some(id) = id else { continue };
                let bbox = self
                    .handle(id, path)?
                    .bbox(crs)
                    .map_err(|e| ConfigError::driver(path.clone(), e))?;
                areas.push(bbox);
            }
            Ok(Area::union_all(&areas).intersection_with(&self.init_bounds))
        })
    }
}

/// Flatten a resolved `input` value, collecting its declarations by identity.
fn flatten_input(
    value: &Value,
    declarations: &mut BTreeMap<ContentId, InputDeclaration>,
) -> Result<BTreeMap<String, Option<ContentId>>> {
    let tree = input_tree_from_value(value)?;
    let mut flat = BTreeMap::new();
    for (path, declaration) in flatten(&tree) {
        let id = match declaration {
            Some(declaration) => {
                let id = declaration.content_id()?;
                declarations.entry(id).or_insert(declaration);
                Some(id)
            }
            None => None,
        };
        flat.insert(path, id);
    }
    Ok(flat)
}

fn validate_process_file(config_dir: &Path, process_file: &str) -> Result<PathBuf> {
    let path = normalize_path(&config_dir.join(process_file));
    if !path.is_file() {
        return Err(ConfigError::process_file(format!(
            "{} is not available",
            path.display()
        )));
    }
    fs::read_to_string(&path).map_err(|e| {
        ConfigError::process_file(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(path)
}

fn load_output(params: &OutputParams, drivers: &DriverRegistry) -> Result<Box<dyn OutputWriter>> {
    let declaration = format!("{} output", params.format);
    let driver = drivers
        .output_driver(&params.format)
        .ok_or_else(|| ConfigError::driver(&declaration, DriverError::NoDriver(params.format.clone())))?;
    let output = driver
        .load(params)
        .map_err(|e| ConfigError::driver(&declaration, e))?;
    output
        .is_valid_with_config(params)
        .map_err(|e| ConfigError::driver(&declaration, e))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{fixtures, ProcessDir};

    fn build(dir: &ProcessDir, yaml: &str, options: InitOptions) -> Result<Configuration> {
        let path = dir.write_document("test.mapchete", yaml);
        Configuration::new(path, options, &DriverRegistry::with_builtin())
    }

    #[test]
    fn test_missing_process_file() {
        let dir = ProcessDir::new();
        dir.write_geojson("file1.geojson", &[fixtures::bbox::ORIGIN_10]);
        dir.remove_process_file();

        let err = build(&dir, fixtures::documents::MINIMAL, InitOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ProcessFile(_)));
    }

    #[test]
    fn test_zoom_params_outside_init_range() {
        let dir = ProcessDir::new();
        dir.write_geojson("file1.geojson", &[fixtures::bbox::ORIGIN_10]);
        let config = build(
            &dir,
            fixtures::documents::MINIMAL,
            InitOptions::default().with_zoom(vec![1]),
        )
        .unwrap();

        assert!(config.snapshot(1).is_ok());
        assert!(matches!(config.snapshot(0), Err(ConfigError::ZoomRange(_))));
        assert!(matches!(config.area(Some(2)), Err(ConfigError::ZoomRange(_))));
    }

    #[test]
    fn test_area_is_memoized() {
        let dir = ProcessDir::new();
        dir.write_geojson("file1.geojson", &[fixtures::bbox::ORIGIN_10]);
        let config = build(&dir, fixtures::documents::MINIMAL, InitOptions::default()).unwrap();

        config.area(Some(1)).unwrap();
        config.area(Some(1)).unwrap();
        assert_eq!(config.areas.cached_zooms(), 1);

        config.area(None).unwrap();
        assert_eq!(config.areas.cached_zooms(), 3);
    }

    #[test]
    fn test_input_declarations_at() {
        let dir = ProcessDir::new();
        dir.write_geojson("coarse.geojson", &[fixtures::bbox::ORIGIN_10]);
        dir.write_geojson("fine.geojson", &[fixtures::bbox::SHIFTED]);
        let config = build(&dir, fixtures::documents::ZOOM_DEPENDENT, InitOptions::default()).unwrap();

        let at_1 = config.input_declarations_at(1).unwrap();
        assert_eq!(
            at_1["file1"],
            Some(&InputDeclaration::Path("coarse.geojson".to_string()))
        );
        let at_4 = config.input_declarations_at(4).unwrap();
        assert_eq!(
            at_4["file1"],
            Some(&InputDeclaration::Path("fine.geojson".to_string()))
        );
        assert_eq!(config.declarations.len(), 2);
    }

    #[test]
    fn test_output_driver_error() {
        let dir = ProcessDir::new();
        dir.write_geojson("file1.geojson", &[fixtures::bbox::ORIGIN_10]);
        let yaml = fixtures::documents::MINIMAL.replace("grid: geodetic", "grid: mercator");

        let err = build(&dir, &yaml, InitOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Driver {
                source: DriverError::Incompatible(_),
                ..
            }
        ));
    }
}
