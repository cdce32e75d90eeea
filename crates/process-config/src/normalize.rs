//! Mapping of deprecated document keys to their current form.
//!
//! | deprecated                                  | current       |
//! |---------------------------------------------|---------------|
//! | `output.type`, `metatiling`, `pixelbuffer`  | `pyramid`     |
//! | `process_zoom`                              | `zoom_levels` |
//! | `process_minzoom`, `process_maxzoom`        | `zoom_levels` |
//! | `process_bounds`                            | `bounds`      |
//! | `input_files`                               | `input`       |

use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// A document with deprecated keys mapped, plus one message per mapping done.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub mapping: Mapping,
    pub deprecations: Vec<String>,
}

/// Rewrite deprecated keys into their current form.
pub fn normalize(mut config: Mapping) -> Result<Normalized> {
    let mut deprecations = Vec::new();
    let mut deprecated = |message: &str| {
        warn!(deprecation = message, "Deprecated configuration");
        deprecations.push(message.to_string());
    };

    if !config.contains_key("pyramid") {
        deprecated("'pyramid' needs to be defined in root config");
        let output = config
            .get("output")
            .and_then(Value::as_mapping)
            .ok_or_else(|| ConfigError::schema("output parameters not provided"))?;
        let grid = output
            .get("type")
            .cloned()
            .ok_or_else(|| ConfigError::schema("output type missing, cannot derive pyramid"))?;

        let mut pyramid = Mapping::new();
        pyramid.insert(Value::from("grid"), grid);
        pyramid.insert(
            Value::from("metatiling"),
            config.get("metatiling").cloned().unwrap_or(Value::from(1)),
        );
        pyramid.insert(
            Value::from("pixelbuffer"),
            config.get("pixelbuffer").cloned().unwrap_or(Value::from(0)),
        );
        config.insert(Value::from("pyramid"), Value::Mapping(pyramid));
    }

    if !config.contains_key("zoom_levels") {
        deprecated("use new config element 'zoom_levels' instead of 'process_zoom', 'process_minzoom' and 'process_maxzoom'");
        let zoom_levels = if let Some(zoom) = config.get("process_zoom") {
            zoom.clone()
        } else if let (Some(min), Some(max)) =
            (config.get("process_minzoom"), config.get("process_maxzoom"))
        {
            let mut zooms = Mapping::new();
            zooms.insert(Value::from("min"), min.clone());
            zooms.insert(Value::from("max"), max.clone());
            Value::Mapping(zooms)
        } else {
            return Err(ConfigError::schema("process zoom levels not provided in config"));
        };
        config.insert(Value::from("zoom_levels"), zoom_levels);
    }

    if !config.contains_key("bounds") {
        let bounds = match config.get("process_bounds") {
            Some(bounds) => {
                deprecated("'process_bounds' are deprecated and renamed to 'bounds'");
                bounds.clone()
            }
            None => Value::Null,
        };
        config.insert(Value::from("bounds"), bounds);
    }

    match (config.contains_key("input"), config.contains_key("input_files")) {
        (true, true) => {
            return Err(ConfigError::schema(
                "'input' and 'input_files' are not allowed at the same time",
            ))
        }
        (false, true) => {
            deprecated("'input_files' are deprecated and renamed to 'input'");
            if let Some(input) = config.remove("input_files") {
                config.insert(Value::from("input"), input);
            }
        }
        (false, false) => return Err(ConfigError::schema("no 'input' found")),
        (true, false) => {}
    }

    Ok(Normalized {
        mapping: config,
        deprecations,
    })
}
