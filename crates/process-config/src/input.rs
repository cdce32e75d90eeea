//! Input declarations and the registry of opened inputs.
//!
//! The `input` subtree of a document binds names (or slash-joined paths of
//! names) to declarations. A declaration is either a path string or a
//! mapping with a `format` key. Each distinct declaration is opened exactly
//! once, however often it appears across paths and zoom levels.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tile_common::TilePyramid;
use tracing::debug;

use crate::drivers::{Delimiters, DriverRegistry, InputHandle, InputLoad, InputSource};
use crate::error::{ConfigError, Result};
use crate::expr::{key_to_string, FORMAT_KEY};
use crate::hash::{hash_mapping, hash_path, ContentId};
use crate::tree::{Tree, TreeMap};

/// Prefixes of references that are never joined with the base directory.
pub const REMOTE_PREFIXES: [&str; 3] = ["s3://", "http://", "https://"];

/// True for `s3://`, `http://` and `https://` references.
pub fn is_remote(path: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Lexically normalize a path, resolving `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Resolve a declared path against the base directory.
pub fn resolve_path(path: &str, config_dir: &Path) -> String {
    if is_remote(path) {
        path.to_string()
    } else {
        normalize_path(&config_dir.join(path)).display().to_string()
    }
}

/// One input declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum InputDeclaration {
    /// File path or URL.
    Path(String),
    /// Mapping with a `format` key, handed to the driver as is.
    Abstract(Mapping),
}

impl InputDeclaration {
    pub fn content_id(&self) -> Result<ContentId> {
        match self {
            InputDeclaration::Path(path) => Ok(hash_path(path)),
            InputDeclaration::Abstract(mapping) => hash_mapping(mapping),
        }
    }

    /// Source handed to drivers, with relative paths resolved.
    pub fn to_source(&self, config_dir: &Path) -> InputSource {
        match self {
            InputDeclaration::Path(path) => InputSource::Path(resolve_path(path, config_dir)),
            InputDeclaration::Abstract(mapping) => InputSource::Abstract {
                params: mapping.clone(),
                conf_dir: config_dir.to_path_buf(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            InputDeclaration::Path(path) => path.clone(),
            InputDeclaration::Abstract(mapping) => match mapping.get(FORMAT_KEY).and_then(|f| f.as_str()) {
                Some(format) => format!("{} input", format),
                None => "abstract input".to_string(),
            },
        }
    }
}

/// Input tree of one zoom level; `None` leaves are unbound at that zoom.
pub type InputTree = TreeMap<Option<InputDeclaration>>;

/// Convert a resolved `input` value into an input tree.
pub fn input_tree_from_value(value: &Value) -> Result<InputTree> {
    match value {
        Value::Mapping(map) if map.contains_key(FORMAT_KEY) => Err(ConfigError::schema(
            "input must map names to declarations, not be a declaration itself",
        )),
        Value::Mapping(map) => tree_from_mapping(map),
        other => Err(ConfigError::schema(format!(
            "input must be a mapping, got {:?}",
            other
        ))),
    }
}

fn tree_from_mapping(map: &Mapping) -> Result<InputTree> {
    let mut tree = BTreeMap::new();
    for (key, value) in map {
        let name = key_to_string(key)?;
        let node = match value {
            Value::Null => Tree::Leaf(None),
            Value::String(path) => Tree::Leaf(Some(InputDeclaration::Path(path.clone()))),
            Value::Mapping(inner) if inner.contains_key(FORMAT_KEY) => {
                Tree::Leaf(Some(InputDeclaration::Abstract(inner.clone())))
            }
            Value::Mapping(inner) => Tree::Branch(tree_from_mapping(inner)?),
            other => {
                return Err(ConfigError::schema(format!(
                    "invalid input declaration for '{}': {:?}",
                    name, other
                )))
            }
        };
        tree.insert(name, node);
    }
    Ok(tree)
}

/// What inputs are opened against.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub config_dir: &'a Path,
    pub pyramid: &'a TilePyramid,
    pub delimiters: &'a Delimiters,
    pub readonly: bool,
}

/// Opened inputs keyed by content identity.
#[derive(Debug, Default, Clone)]
pub struct InputRegistry {
    handles: BTreeMap<ContentId, InputHandle>,
}

impl InputRegistry {
    /// Open every distinct declaration once.
    ///
    /// Each handle's bounding box is queried right after opening so that
    /// broken inputs fail here. The first failure aborts; no partial
    /// registry is returned.
    pub fn materialize<'a>(
        declarations: impl IntoIterator<Item = &'a InputDeclaration>,
        ctx: &LoadContext<'_>,
        drivers: &DriverRegistry,
    ) -> Result<Self> {
        let mut unique: BTreeMap<ContentId, &InputDeclaration> = BTreeMap::new();
        for declaration in declarations {
            unique.entry(declaration.content_id()?).or_insert(declaration);
        }

        let mut handles = BTreeMap::new();
        for (id, declaration) in unique {
            let source = declaration.to_source(ctx.config_dir);
            let wrap = |e| ConfigError::driver(declaration.describe(), e);

            let driver = drivers.input_driver(&source).map_err(wrap)?;
            let request = InputLoad {
                source: &source,
                pyramid: ctx.pyramid,
                pixelbuffer: ctx.pyramid.pixelbuffer(),
                delimiters: ctx.delimiters,
                readonly: ctx.readonly,
            };
            let handle = driver.load(&request).map_err(wrap)?;
            handle.bbox(ctx.pyramid.crs()).map_err(wrap)?;

            debug!(
                id = %id.short(),
                input = %source.describe(),
                driver = driver.name(),
                "Loaded input"
            );
            handles.insert(id, handle);
        }
        Ok(Self { handles })
    }

    pub fn get(&self, id: &ContentId) -> Option<&InputHandle> {
        self.handles.get(id)
    }

    pub fn handles(&self) -> &BTreeMap<ContentId, InputHandle> {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
