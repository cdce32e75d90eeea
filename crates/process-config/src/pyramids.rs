//! Process and output pyramids, and output parameter enrichment.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tile_common::TilePyramid;

use crate::drivers::{DriverRegistry, OutputParams};
use crate::error::{ConfigError, Result};
use crate::expr::FORMAT_KEY;
use crate::input::{is_remote, normalize_path};
use crate::schema::{optional_u32, PyramidSection};

/// Output keys replaced by values derived from the output pyramid.
const DERIVED_OUTPUT_KEYS: [&str; 5] = [FORMAT_KEY, "path", "type", "pixelbuffer", "metatiling"];

/// Pyramids sharing one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pyramids {
    pub process: TilePyramid,
    pub output: TilePyramid,
}

/// Build both pyramids.
///
/// Output metatiling defaults to the process metatiling and must not
/// exceed it; output pixelbuffer defaults to 0.
pub fn build_pyramids(section: &PyramidSection, output: &Mapping) -> Result<Pyramids> {
    let process = TilePyramid::new(section.grid, section.metatiling, section.pixelbuffer)?;

    let output_metatiling = optional_u32(output, "metatiling", section.metatiling)?;
    if output_metatiling > section.metatiling {
        return Err(ConfigError::pyramid(format!(
            "output metatiles ({}) must not be bigger than process metatiles ({})",
            output_metatiling, section.metatiling
        )));
    }
    let output_pixelbuffer = optional_u32(output, "pixelbuffer", 0)?;
    let output = TilePyramid::new(section.grid, output_metatiling, output_pixelbuffer)?;

    Ok(Pyramids { process, output })
}

/// Output parameters as handed to the output driver.
///
/// `path` is resolved against `config_dir`; grid, pixelbuffer and
/// metatiling come from the output pyramid.
pub fn output_params(
    raw_output: &Mapping,
    config_dir: &Path,
    pyramid: &TilePyramid,
    drivers: &DriverRegistry,
) -> Result<OutputParams> {
    let format = raw_output
        .get(FORMAT_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::schema("output format not specified"))?;
    let available = drivers.available_output_formats();
    if !available.contains(&format) {
        return Err(ConfigError::schema(format!(
            "output format '{}' not available, use one of {:?}",
            format, available
        )));
    }

    let path = match raw_output.get("path") {
        None | Some(Value::Null) => None,
        Some(Value::String(path)) if is_remote(path) => Some(path.into()),
        Some(Value::String(path)) => Some(normalize_path(&config_dir.join(path))),
        Some(other) => {
            return Err(ConfigError::schema(format!(
                "output path must be a string, got {:?}",
                other
            )))
        }
    };

    let extra = raw_output
        .iter()
        .filter(|(key, _)| {
            key.as_str()
                .map_or(true, |k| !DERIVED_OUTPUT_KEYS.contains(&k))
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(OutputParams {
        format: format.to_string(),
        path,
        grid: pyramid.grid(),
        pixelbuffer: pyramid.pixelbuffer(),
        metatiling: pyramid.metatiling(),
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tile_common::GridType;

    fn section(metatiling: u32) -> PyramidSection {
        PyramidSection {
            grid: GridType::Geodetic,
            metatiling,
            pixelbuffer: 2,
        }
    }

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_output_defaults() {
        let pyramids = build_pyramids(&section(4), &mapping("{format: GeoJSON}")).unwrap();
        assert_eq!(pyramids.process.metatiling(), 4);
        assert_eq!(pyramids.process.pixelbuffer(), 2);
        assert_eq!(pyramids.output.metatiling(), 4);
        assert_eq!(pyramids.output.pixelbuffer(), 0);
        assert_eq!(pyramids.output.grid(), GridType::Geodetic);
    }

    #[test]
    fn test_output_metatiling_constraint() {
        let err = build_pyramids(&section(2), &mapping("{format: GeoJSON, metatiling: 4}"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Pyramid(_)));

        let pyramids =
            build_pyramids(&section(4), &mapping("{format: GeoJSON, metatiling: 2}")).unwrap();
        assert_eq!(pyramids.output.metatiling(), 2);
    }

    #[test]
    fn test_invalid_metatiling() {
        let err = build_pyramids(&section(3), &mapping("{format: GeoJSON}")).unwrap_err();
        assert!(matches!(err, ConfigError::Pyramid(_)));
    }

    #[test]
    fn test_output_params() {
        let pyramid = TilePyramid::new(GridType::Geodetic, 2, 8).unwrap();
        let raw = mapping("{format: GeoJSON, path: ../out, type: geodetic, schema: {properties: {}}}");
        let params = output_params(
            &raw,
            Path::new("/data/process"),
            &pyramid,
            &DriverRegistry::with_builtin(),
        )
        .unwrap();

        assert_eq!(params.format, "GeoJSON");
        assert_eq!(params.path, Some(PathBuf::from("/data/out")));
        assert_eq!(params.grid, GridType::Geodetic);
        assert_eq!(params.metatiling, 2);
        assert_eq!(params.pixelbuffer, 8);
        assert_eq!(params.extra.len(), 1);
        assert!(params.extra.contains_key("schema"));
    }

    #[test]
    fn test_output_params_without_path() {
        let pyramid = TilePyramid::new(GridType::Geodetic, 1, 0).unwrap();
        let params = output_params(
            &mapping("{format: GeoJSON}"),
            Path::new("/data"),
            &pyramid,
            &DriverRegistry::with_builtin(),
        )
        .unwrap();
        assert!(params.path.is_none());
    }

    #[test]
    fn test_unknown_or_missing_format() {
        let pyramid = TilePyramid::new(GridType::Geodetic, 1, 0).unwrap();
        let drivers = DriverRegistry::with_builtin();
        for raw in ["{format: GTiff}", "{path: out}"] {
            let err = output_params(&mapping(raw), Path::new("/data"), &pyramid, &drivers)
                .unwrap_err();
            assert!(matches!(err, ConfigError::Schema(_)), "{}", raw);
        }
    }
}
