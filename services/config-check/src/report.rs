//! Human and JSON readable summary of a loaded configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tile_common::Bounds;

use process_config::{Baselevels, Configuration, InputDeclaration};

/// Everything a process sees at one zoom level.
#[derive(Debug, Serialize)]
pub struct ZoomReport {
    pub zoom: u32,
    pub params: Mapping,
    /// Input path to declaration, `None` where nothing is bound.
    pub inputs: BTreeMap<String, Option<String>>,
    pub bounds: Option<[f64; 4]>,
}

#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub config_dir: String,
    pub process_file: String,
    pub mode: String,
    pub zoom_levels: String,
    pub init_zoom_levels: String,
    pub process_bounds: [f64; 4],
    pub init_bounds: [f64; 4],
    pub output_format: String,
    pub global_bounds: Option<[f64; 4]>,
    pub baselevels: Option<Baselevels>,
    pub deprecations: Vec<String>,
    pub zooms: Vec<ZoomReport>,
}

impl ConfigReport {
    pub fn build(config: &Configuration) -> process_config::Result<Self> {
        let mut zooms = Vec::with_capacity(config.init_zoom_levels().len());
        for zoom in config.init_zoom_levels() {
            let snapshot = config.snapshot(zoom)?;
            let inputs = config
                .input_declarations_at(zoom)?
                .into_iter()
                .map(|(path, decl)| (path, decl.map(declaration_label)))
                .collect();
            zooms.push(ZoomReport {
                zoom,
                params: snapshot.params,
                inputs,
                bounds: config.bounds(Some(zoom))?.as_ref().map(Bounds::to_array),
            });
        }

        Ok(Self {
            config_dir: config.config_dir().display().to_string(),
            process_file: config.process_file().display().to_string(),
            mode: config.mode().to_string(),
            zoom_levels: config.zoom_levels().to_string(),
            init_zoom_levels: config.init_zoom_levels().to_string(),
            process_bounds: config.process_bounds().to_array(),
            init_bounds: config.init_bounds().to_array(),
            output_format: config.output_params().format.clone(),
            global_bounds: config.bounds(None)?.as_ref().map(Bounds::to_array),
            baselevels: config.baselevels().copied(),
            deprecations: config.deprecations().to_vec(),
            zooms,
        })
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "config dir:    {}", self.config_dir)?;
        writeln!(out, "process file:  {}", self.process_file)?;
        writeln!(out, "mode:          {}", self.mode)?;
        writeln!(out, "output format: {}", self.output_format)?;
        writeln!(
            out,
            "zoom levels:   {} (initialized {})",
            self.zoom_levels, self.init_zoom_levels
        )?;
        writeln!(out, "bounds:        {}", format_bounds(Some(self.process_bounds)))?;
        writeln!(out, "init bounds:   {}", format_bounds(Some(self.init_bounds)))?;
        writeln!(out, "area bounds:   {}", format_bounds(self.global_bounds))?;
        if let Some(baselevels) = &self.baselevels {
            writeln!(
                out,
                "baselevels:    {} (lower {}, higher {})",
                baselevels.zooms, baselevels.lower, baselevels.higher
            )?;
        }
        for deprecation in &self.deprecations {
            writeln!(out, "deprecated:    {}", deprecation)?;
        }

        for zoom in &self.zooms {
            writeln!(out)?;
            writeln!(out, "zoom {}", zoom.zoom)?;
            writeln!(out, "  bounds: {}", format_bounds(zoom.bounds))?;
            if !zoom.inputs.is_empty() {
                writeln!(out, "  inputs:")?;
                for (path, decl) in &zoom.inputs {
                    writeln!(out, "    {}: {}", path, decl.as_deref().unwrap_or("-"))?;
                }
            }
            if !zoom.params.is_empty() {
                writeln!(out, "  params:")?;
                for (key, value) in &zoom.params {
                    writeln!(out, "    {}: {}", scalar_text(key), inline_yaml(value))?;
                }
            }
        }
        Ok(())
    }
}

fn declaration_label(decl: &InputDeclaration) -> String {
    match decl {
        InputDeclaration::Path(path) => path.clone(),
        InputDeclaration::Abstract(mapping) => {
            format!("{} ({})", decl.describe(), inline_yaml(&Value::Mapping(mapping.clone())))
        }
    }
}

fn format_bounds(bounds: Option<[f64; 4]>) -> String {
    match bounds {
        Some([left, bottom, right, top]) => format!("{}, {}, {}, {}", left, bottom, right, top),
        None => "empty".to_string(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => inline_yaml(other),
    }
}

/// Single line JSON rendering of a YAML value.
fn inline_yaml(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use process_config::InitOptions;
    use test_utils::{fixtures::documents, ProcessDir};

    fn load(document: &str, options: InitOptions) -> (ProcessDir, Configuration) {
        let dir = ProcessDir::new();
        dir.write_geojson("file1.geojson", &[[0.0, 0.0, 5.0, 5.0]]);
        dir.write_geojson("coarse.geojson", &[[-10.0, -10.0, 10.0, 10.0]]);
        dir.write_geojson("fine.geojson", &[[0.0, 0.0, 1.0, 1.0]]);
        let path = dir.write_document("test.mapchete", document);
        let config = Configuration::new(
            path.as_path(),
            options,
            &process_config::DriverRegistry::with_builtin(),
        )
        .unwrap();
        (dir, config)
    }

    #[test]
    fn test_report_lists_every_initialized_zoom() {
        let (_dir, config) = load(documents::MINIMAL, InitOptions::default());
        let report = ConfigReport::build(&config).unwrap();

        assert_eq!(
            report.zooms.iter().map(|z| z.zoom).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(report.output_format, "GeoJSON");
        assert_eq!(report.global_bounds, Some([0.0, 0.0, 5.0, 5.0]));
        assert_eq!(
            report.zooms[0].inputs.get("file1"),
            Some(&Some("file1.geojson".to_string()))
        );
    }

    #[test]
    fn test_report_honors_init_zoom() {
        let (_dir, config) = load(documents::ZOOM_DEPENDENT, InitOptions::default().with_zoom(vec![4]));
        let report = ConfigReport::build(&config).unwrap();

        assert_eq!(report.zooms.len(), 1);
        let zoom = &report.zooms[0];
        assert_eq!(zoom.inputs.get("file1"), Some(&Some("fine.geojson".to_string())));
        assert_eq!(zoom.params.get("resampling"), Some(&Value::from("bilinear")));
    }

    #[test]
    fn test_text_rendering() {
        let (_dir, config) = load(documents::MINIMAL, InitOptions::default().with_zoom(vec![1]));
        let text = ConfigReport::build(&config).unwrap().to_string();

        assert!(text.contains("zoom 1"));
        assert!(text.contains("file1: file1.geojson"));
        assert!(text.contains("area bounds:   0, 0, 5, 5"));
        assert!(!text.contains("zoom 0"));
    }

    #[test]
    fn test_json_rendering() {
        let (_dir, config) = load(documents::MINIMAL, InitOptions::default());
        let report = ConfigReport::build(&config).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["mode"], "continue");
        assert_eq!(json["zooms"].as_array().unwrap().len(), 3);
        assert!(json["baselevels"].is_null());
    }
}
