//! End-to-end tests building configurations from `.mapchete` documents.

use std::sync::{Arc, Mutex};

use process_config::{
    Area, Bounds, ConfigError, Configuration, Crs, Delimiters, DocumentSource, DriverError,
    DriverRegistry, GridType, InitOptions, InputDriver, InputHandle, InputLoad, InputReader,
    InputSource, ProcessingMode, ZoomLevels,
};
use serde_yaml::{Mapping, Value};
use test_utils::fixtures::{bbox, documents};
use test_utils::{assert_bounds_approx_eq, ProcessDir};

fn build(dir: &ProcessDir, yaml: &str, options: InitOptions) -> Result<Configuration, ConfigError> {
    let path = dir.write_document("test.mapchete", yaml);
    Configuration::new(path, options, &DriverRegistry::with_builtin())
}

fn minimal_dir() -> ProcessDir {
    let dir = ProcessDir::new();
    dir.write_geojson("file1.geojson", &[bbox::ORIGIN_10]);
    dir
}

fn zoom_dependent_dir() -> ProcessDir {
    let dir = ProcessDir::new();
    dir.write_geojson("coarse.geojson", &[bbox::ORIGIN_10]);
    dir.write_geojson("fine.geojson", &[bbox::SHIFTED]);
    dir
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_minimal_document() {
    let dir = minimal_dir();
    let config = build(&dir, documents::MINIMAL, InitOptions::default()).unwrap();

    assert_eq!(config.mode(), ProcessingMode::Continue);
    assert_eq!(config.zoom_levels().min(), 0);
    assert_eq!(config.zoom_levels().max(), 2);
    assert_eq!(config.init_zoom_levels(), config.zoom_levels());
    assert_eq!(config.process_pyramid().grid(), GridType::Geodetic);
    assert!(config.deprecations().is_empty());
    assert_eq!(config.input_handles().len(), 1);
    assert!(config.process_file().ends_with("process.py"));
    assert!(config.mapchete_file().is_some());

    let snapshot = config.snapshot(1).unwrap();
    assert_eq!(snapshot.zoom, 1);
    assert_eq!(snapshot.input.len(), 1);
    assert!(snapshot.input_at("file1").is_some());

    let bounds = config.bounds(Some(1)).unwrap().unwrap();
    assert_bounds_approx_eq!(bounds.to_array(), bbox::ORIGIN_10, 1e-9);
}

#[test]
fn test_mapping_source() {
    let dir = minimal_dir();
    let document: Mapping = serde_yaml::from_str(documents::MINIMAL).unwrap();
    let config = Configuration::new(
        DocumentSource::in_dir(document, dir.path()),
        InitOptions::default(),
        &DriverRegistry::with_builtin(),
    )
    .unwrap();

    assert!(config.mapchete_file().is_none());
    assert_eq!(config.config_dir(), dir.path());
    assert_eq!(config.input_handles().len(), 1);
}

#[test]
fn test_output_params_are_enriched() {
    let dir = minimal_dir();
    let config = build(&dir, documents::MINIMAL, InitOptions::default()).unwrap();

    let params = config.output_params();
    assert_eq!(params.format, "GeoJSON");
    assert_eq!(params.grid, GridType::Geodetic);
    assert_eq!(params.metatiling, 1);
    assert_eq!(params.pixelbuffer, 0);
    assert!(params.path.as_ref().unwrap().ends_with("output"));
    assert_eq!(config.output_handle().driver_name(), "GeoJSON");
}

#[test]
fn test_output_is_a_user_param() {
    let dir = minimal_dir();
    let config = build(&dir, documents::MINIMAL, InitOptions::default()).unwrap();

    let snapshot = config.snapshot(0).unwrap();
    let output = snapshot.param("output").and_then(Value::as_mapping).unwrap();
    assert_eq!(output.get("format"), Some(&Value::from("GeoJSON")));
    for reserved in ["zoom_levels", "pyramid", "bounds", "process_file", "input"] {
        assert!(snapshot.param(reserved).is_none(), "{}", reserved);
    }
}

#[test]
fn test_dollar_placeholders_survive_as_params() {
    let dir = minimal_dir();
    let yaml = format!("{}name_template: \"tile_${{zoom}}_${{row}}.tif\"\n", documents::MINIMAL);
    let config = build(&dir, &yaml, InitOptions::default()).unwrap();

    assert_eq!(
        config.snapshot(0).unwrap().param("name_template"),
        Some(&Value::from("tile_${zoom}_${row}.tif"))
    );
}

// ============================================================================
// Zoom dependent parameters and inputs
// ============================================================================

#[test]
fn test_zoom_dependent_params() {
    let dir = zoom_dependent_dir();
    let config = build(&dir, documents::ZOOM_DEPENDENT, InitOptions::default()).unwrap();

    for zoom in 0..=5 {
        let snapshot = config.snapshot(zoom).unwrap();
        let expected = if zoom <= 2 { "nearest" } else { "bilinear" };
        assert_eq!(snapshot.param("resampling"), Some(&Value::from(expected)));
        assert_eq!(snapshot.param("some_float"), Some(&Value::from(0.5)));
    }
}

#[test]
fn test_zoom_dependent_inputs() {
    let dir = zoom_dependent_dir();
    let config = build(&dir, documents::ZOOM_DEPENDENT, InitOptions::default()).unwrap();
    assert_eq!(config.input_handles().len(), 2);

    let coarse = config.snapshot(2).unwrap();
    let file1 = coarse.input_at("file1").unwrap();
    let file2 = coarse.input_at("file2").unwrap();
    assert!(Arc::ptr_eq(file1, file2));

    let fine = config.snapshot(3).unwrap();
    let file1 = fine.input_at("file1").unwrap();
    let file2 = fine.input_at("file2").unwrap();
    assert!(!Arc::ptr_eq(file1, file2));
}

#[test]
fn test_shared_inputs_are_opened_once() {
    let dir = ProcessDir::new();
    dir.write_geojson("shared.geojson", &[bbox::ORIGIN_10]);
    dir.write_geojson("other.geojson", &[bbox::EUROPE]);
    let config = build(&dir, documents::SHARED_INPUTS, InitOptions::default()).unwrap();

    assert_eq!(config.input_handles().len(), 2);
    let snapshot = config.snapshot(4).unwrap();
    assert!(Arc::ptr_eq(
        snapshot.input_at("group1/file1").unwrap(),
        snapshot.input_at("group2/file1").unwrap()
    ));
    assert!(Arc::ptr_eq(
        snapshot.input_at("group1/file2").unwrap(),
        snapshot.input_at("group2/file2").unwrap()
    ));
    assert!(!Arc::ptr_eq(
        snapshot.input_at("group1/file1").unwrap(),
        snapshot.input_at("group1/file2").unwrap()
    ));
}

#[test]
fn test_abstract_inputs_ignore_key_order() {
    let dir = minimal_dir();
    let yaml = documents::MINIMAL.replace(
        "  file1: file1.geojson",
        "  file1:\n    format: GeoJSON\n    path: file1.geojson\n  file2:\n    path: file1.geojson\n    format: GeoJSON",
    );
    let config = build(&dir, &yaml, InitOptions::default()).unwrap();

    assert_eq!(config.input_handles().len(), 1);
    let snapshot = config.snapshot(0).unwrap();
    assert!(Arc::ptr_eq(
        snapshot.input_at("file1").unwrap(),
        snapshot.input_at("file2").unwrap()
    ));
}

#[test]
fn test_input_unbound_at_some_zooms() {
    let dir = minimal_dir();
    let yaml = documents::MINIMAL.replace(
        "  file1: file1.geojson",
        "  file1:\n    zoom<1: file1.geojson",
    );
    let config = build(&dir, &yaml, InitOptions::default()).unwrap();

    let snapshot = config.snapshot(2).unwrap();
    assert_eq!(snapshot.input.len(), 1);
    assert!(snapshot.input_at("file1").is_none());

    assert!(config.area(Some(2)).unwrap().is_empty());
    assert!(config.bounds(Some(2)).unwrap().is_none());
    assert!(config.bounds(Some(0)).unwrap().is_some());
}

// ============================================================================
// Zoom levels
// ============================================================================

#[test]
fn test_init_zoom_must_be_subset() {
    let dir = minimal_dir();
    let yaml = documents::MINIMAL
        .replace("min: 0", "min: 1")
        .replace("max: 2", "max: 5");

    let err = build(&dir, &yaml, InitOptions::default().with_zoom(vec![7])).unwrap_err();
    assert!(matches!(err, ConfigError::ZoomRange(_)));

    let config = build(&dir, &yaml, InitOptions::default().with_zoom(vec![4, 2])).unwrap();
    assert_eq!(config.init_zoom_levels().min(), 2);
    assert_eq!(config.init_zoom_levels().max(), 4);
    assert!(matches!(config.snapshot(5), Err(ConfigError::ZoomRange(_))));
}

#[test]
fn test_invalid_zoom_expression_fails_construction() {
    let dir = minimal_dir();
    let yaml = documents::MINIMAL.replace(
        "  file1: file1.geojson",
        "  file1:\n    zoom<three: file1.geojson",
    );
    let err = build(&dir, &yaml, InitOptions::default()).unwrap_err();
    assert!(matches!(err, ConfigError::ZoomExpression(_)));
}

// ============================================================================
// Pyramids
// ============================================================================

#[test]
fn test_output_metatiling_must_not_exceed_process() {
    let dir = minimal_dir();
    let too_big = documents::MINIMAL
        .replace("  grid: geodetic", "  grid: geodetic\n  metatiling: 2")
        .replace("  format: GeoJSON", "  format: GeoJSON\n  metatiling: 4");
    let err = build(&dir, &too_big, InitOptions::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Pyramid(_)));

    let smaller = documents::MINIMAL
        .replace("  grid: geodetic", "  grid: geodetic\n  metatiling: 4")
        .replace("  format: GeoJSON", "  format: GeoJSON\n  metatiling: 2");
    let config = build(&dir, &smaller, InitOptions::default()).unwrap();
    assert_eq!(config.process_pyramid().metatiling(), 4);
    assert_eq!(config.output_pyramid().metatiling(), 2);
}

#[test]
fn test_baselevels() {
    let dir = minimal_dir();
    let yaml = format!("{}baselevels:\n  min: 1\n  lower: bilinear\n", documents::MINIMAL);
    let config = build(&dir, &yaml, InitOptions::default()).unwrap();

    let baselevels = config.baselevels().unwrap();
    assert_eq!(baselevels.zooms.min(), 1);
    assert_eq!(baselevels.zooms.max(), 2);
    assert_eq!(baselevels.lower.as_str(), "bilinear");
    assert_eq!(baselevels.higher.as_str(), "nearest");
}

// ============================================================================
// Areas and bounds
// ============================================================================

#[test]
fn test_global_area_is_union_of_zoom_areas() {
    let dir = zoom_dependent_dir();
    let config = build(&dir, documents::ZOOM_DEPENDENT, InitOptions::default()).unwrap();

    let per_zoom: Vec<Area> = config
        .init_zoom_levels()
        .iter()
        .map(|zoom| config.area(Some(zoom)).unwrap())
        .collect();
    let global = config.area(None).unwrap();
    assert!(global.same_extent(&Area::union_all(&per_zoom)));

    let bounds = config.bounds(None).unwrap().unwrap();
    assert_bounds_approx_eq!(bounds.to_array(), [0.0, -5.0, 20.0, 10.0], 1e-9);
}

#[test]
fn test_init_bounds_clip_area() {
    let dir = minimal_dir();
    let config = build(
        &dir,
        documents::MINIMAL,
        InitOptions::default().with_bounds(vec![5.0, 5.0, 20.0, 20.0]),
    )
    .unwrap();

    let bounds = config.bounds(Some(0)).unwrap().unwrap();
    assert_bounds_approx_eq!(bounds.to_array(), [5.0, 5.0, 10.0, 10.0], 1e-9);
    assert_bounds_approx_eq!(config.process_bounds().to_array(), bbox::ORIGIN_10, 1e-9);
}

#[test]
fn test_disjoint_init_bounds_give_empty_area() {
    let dir = minimal_dir();
    let config = build(
        &dir,
        documents::MINIMAL,
        InitOptions::default().with_bounds(bbox::FAR_AWAY.to_vec()),
    )
    .unwrap();

    assert!(config.area(None).unwrap().is_empty());
    assert!(config.bounds(None).unwrap().is_none());
}

#[test]
fn test_no_input_area_is_init_bounds() {
    let dir = ProcessDir::new();
    let config = build(&dir, documents::NO_INPUT, InitOptions::default()).unwrap();

    assert!(config.input_handles().is_empty());
    assert!(config.snapshot(1).unwrap().input.is_empty());
    let bounds = config.bounds(Some(1)).unwrap().unwrap();
    assert_bounds_approx_eq!(bounds.to_array(), bbox::ORIGIN_10, 1e-9);
}

#[test]
fn test_invalid_init_bounds() {
    let dir = minimal_dir();
    let err = build(
        &dir,
        documents::MINIMAL,
        InitOptions::default().with_bounds(vec![0.0, 0.0, 1.0]),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Bounds(_)));
}

// ============================================================================
// Driver requests
// ============================================================================

/// What an input driver was asked to open.
#[derive(Debug, Clone)]
struct RecordedLoad {
    source: InputSource,
    pixelbuffer: u32,
    delimiters: Delimiters,
    readonly: bool,
}

#[derive(Debug)]
struct FixedReader;

impl InputReader for FixedReader {
    fn driver_name(&self) -> &str {
        "Recording"
    }

    fn bbox(&self, _crs: Crs) -> Result<Area, DriverError> {
        Ok(Area::from_bounds(Bounds::new(0.0, 0.0, 10.0, 10.0)))
    }
}

struct RecordingDriver {
    loads: Arc<Mutex<Vec<RecordedLoad>>>,
}

impl InputDriver for RecordingDriver {
    fn name(&self) -> &str {
        "Recording"
    }

    fn file_extensions(&self) -> &[&str] {
        &["rec"]
    }

    fn load(&self, request: &InputLoad<'_>) -> Result<InputHandle, DriverError> {
        self.loads.lock().unwrap().push(RecordedLoad {
            source: request.source.clone(),
            pixelbuffer: request.pixelbuffer,
            delimiters: *request.delimiters,
            readonly: request.readonly,
        });
        Ok(Arc::new(FixedReader))
    }
}

const RECORDED_DOCUMENT: &str = r#"
process_file: process.py
zoom_levels:
  min: 0
  max: 5
pyramid:
  grid: geodetic
  pixelbuffer: 4
input:
  file1: data.rec
  group:
    again: data.rec
output:
  format: GeoJSON
  path: output
bounds: [0, 0, 50, 50]
"#;

fn build_recorded(dir: &ProcessDir, options: InitOptions) -> (Configuration, Vec<RecordedLoad>) {
    let loads = Arc::new(Mutex::new(Vec::new()));
    let mut drivers = DriverRegistry::with_builtin();
    drivers.register_input(RecordingDriver {
        loads: loads.clone(),
    });
    let path = dir.write_document("recorded.mapchete", RECORDED_DOCUMENT);
    let config = Configuration::new(path, options, &drivers).unwrap();
    let recorded = loads.lock().unwrap().clone();
    (config, recorded)
}

#[test]
fn test_driver_receives_delimiters() {
    let dir = ProcessDir::new();
    let (config, loads) = build_recorded(
        &dir,
        InitOptions::default()
            .with_zoom(vec![1, 3])
            .with_bounds(vec![0.0, 0.0, 20.0, 20.0])
            .with_mode("readonly"),
    );

    assert_eq!(loads.len(), 1);
    let load = &loads[0];
    assert_eq!(load.delimiters.zoom, ZoomLevels::new(1, 3).unwrap());
    assert_eq!(load.delimiters.zoom, config.init_zoom_levels());
    assert_eq!(load.delimiters.bounds, Bounds::new(0.0, 0.0, 20.0, 20.0));
    assert_eq!(load.delimiters.bounds, config.init_bounds());
    assert_eq!(load.delimiters.process_bounds, Bounds::new(0.0, 0.0, 50.0, 50.0));
    assert_eq!(load.delimiters.process_bounds, config.process_bounds());
    assert_eq!(load.pixelbuffer, 4);
    assert_eq!(load.pixelbuffer, config.process_pyramid().pixelbuffer());
    assert!(load.readonly);

    match &load.source {
        InputSource::Path(path) => {
            assert!(path.ends_with("data.rec"));
            assert!(path.starts_with(&config.config_dir().display().to_string()));
        }
        other => panic!("expected a path source, got {:?}", other),
    }
}

#[test]
fn test_driver_readonly_follows_mode() {
    for (mode, readonly) in [
        ("memory", false),
        ("readonly", true),
        ("continue", false),
        ("overwrite", false),
    ] {
        let dir = ProcessDir::new();
        let (config, loads) = build_recorded(&dir, InitOptions::default().with_mode(mode));
        assert_eq!(loads.len(), 1, "mode {}", mode);
        assert_eq!(loads[0].readonly, readonly, "mode {}", mode);
        assert_eq!(loads[0].delimiters.zoom, config.zoom_levels());
        assert_eq!(loads[0].delimiters.bounds, config.process_bounds());
    }
}

// ============================================================================
// Modes, deprecations, errors
// ============================================================================

#[test]
fn test_modes() {
    let dir = minimal_dir();
    for mode in ["memory", "readonly", "continue", "overwrite"] {
        let config = build(&dir, documents::MINIMAL, InitOptions::default().with_mode(mode)).unwrap();
        assert_eq!(config.mode().as_str(), mode);
    }

    let err = build(&dir, documents::MINIMAL, InitOptions::default().with_mode("delete")).unwrap_err();
    assert!(matches!(err, ConfigError::Mode(_)));
}

#[test]
fn test_deprecated_document() {
    let dir = minimal_dir();
    let config = build(&dir, documents::DEPRECATED, InitOptions::default()).unwrap();

    assert_eq!(config.deprecations().len(), 4);
    assert_eq!(config.zoom_levels().min(), 0);
    assert_eq!(config.zoom_levels().max(), 3);
    assert_eq!(config.process_pyramid().metatiling(), 2);
    assert_eq!(config.process_pyramid().pixelbuffer(), 4);
    assert_eq!(config.output_pyramid().metatiling(), 2);
    assert_bounds_approx_eq!(config.process_bounds().to_array(), bbox::ORIGIN_10, 1e-9);
    assert!(config.snapshot(0).unwrap().input_at("file1").is_some());
}

#[test]
fn test_update_is_unsupported() {
    let dir = minimal_dir();
    let mut config = build(&dir, documents::MINIMAL, InitOptions::default()).unwrap();
    let err = config.update(Mapping::new()).unwrap_err();
    assert!(matches!(err, ConfigError::Unsupported(_)));
}

#[test]
fn test_missing_input_file_is_driver_error() {
    let dir = ProcessDir::new();
    let err = build(&dir, documents::MINIMAL, InitOptions::default()).unwrap_err();
    match err {
        ConfigError::Driver { declaration, source } => {
            assert_eq!(declaration, "file1.geojson");
            assert!(matches!(source, DriverError::Open { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unknown_output_format() {
    let dir = minimal_dir();
    let yaml = documents::MINIMAL.replace("format: GeoJSON", "format: GTiff");
    let err = build(&dir, &yaml, InitOptions::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(_)));
}

#[test]
fn test_wrong_document_extension() {
    let dir = minimal_dir();
    let path = dir.write_document("test.yaml", documents::MINIMAL);
    let err = Configuration::from_file(path).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(_)));
}
