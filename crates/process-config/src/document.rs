//! Loading process documents.
//!
//! A document is either a `.mapchete` YAML file or an in-memory mapping
//! carrying its own `config_dir`. File contents are parsed as plain YAML;
//! strings such as `tile_${zoom}.tif` reach the process unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// File extension of process documents.
pub const DOCUMENT_EXTENSION: &str = "mapchete";

/// Key carrying the base directory of a mapping document.
pub const CONFIG_DIR_KEY: &str = "config_dir";

// ============================================================================
// Sources
// ============================================================================

/// Where a process document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    /// A `.mapchete` file; its directory is the base directory.
    File(PathBuf),
    /// A parsed document containing a `config_dir` entry.
    Mapping(Mapping),
}

impl DocumentSource {
    /// A mapping document rooted at `config_dir`.
    pub fn in_dir(mut document: Mapping, config_dir: impl AsRef<Path>) -> Self {
        document.insert(
            Value::from(CONFIG_DIR_KEY),
            Value::from(config_dir.as_ref().display().to_string()),
        );
        DocumentSource::Mapping(document)
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::File(path)
    }
}

impl From<&Path> for DocumentSource {
    fn from(path: &Path) -> Self {
        DocumentSource::File(path.to_path_buf())
    }
}

impl From<Mapping> for DocumentSource {
    fn from(document: Mapping) -> Self {
        DocumentSource::Mapping(document)
    }
}

/// A document with its base directory resolved.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Document without the `config_dir` entry.
    pub mapping: Mapping,
    pub config_dir: PathBuf,
    /// Source file, if loaded from disk.
    pub mapchete_file: Option<PathBuf>,
}

/// Load a document and determine its base directory.
pub fn load_document(source: &DocumentSource) -> Result<LoadedDocument> {
    match source {
        DocumentSource::File(path) => load_file(path),
        DocumentSource::Mapping(document) => {
            let mut mapping = document.clone();
            let config_dir = match mapping.remove(CONFIG_DIR_KEY) {
                Some(Value::String(dir)) => PathBuf::from(dir),
                Some(other) => {
                    return Err(ConfigError::schema(format!(
                        "config_dir must be a string, got {:?}",
                        other
                    )))
                }
                None => return Err(ConfigError::schema("config_dir parameter missing")),
            };
            Ok(LoadedDocument {
                mapping,
                config_dir,
                mapchete_file: None,
            })
        }
    }
}

fn load_file(path: &Path) -> Result<LoadedDocument> {
    if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
        return Err(ConfigError::schema(format!(
            "configuration has to be a mapping or a .{} file, got {}",
            DOCUMENT_EXTENSION,
            path.display()
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::schema(format!("cannot read {}: {}", path.display(), e)))?;
    let absolute = fs::canonicalize(path)
        .map_err(|e| ConfigError::schema(format!("cannot resolve {}: {}", path.display(), e)))?;
    let config_dir = absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::schema(format!("{} has no parent directory", path.display())))?;

    let mut mapping = parse_document(&content)?;
    mapping.remove(CONFIG_DIR_KEY);

    debug!(path = %absolute.display(), config_dir = %config_dir.display(), "Loaded process document");
    Ok(LoadedDocument {
        mapping,
        config_dir,
        mapchete_file: Some(absolute),
    })
}

/// Parse document text into a mapping.
pub fn parse_document(content: &str) -> Result<Mapping> {
    match serde_yaml::from_str::<Value>(content)? {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(ConfigError::schema(format!(
            "process document must be a mapping, got {:?}",
            other
        ))),
    }
}
