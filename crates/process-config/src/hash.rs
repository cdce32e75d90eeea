//! Content identities for input declarations.
//!
//! Two declarations with the same content get the same [`ContentId`],
//! wherever they appear in the input tree and at whatever zoom level. Path
//! declarations hash their string; abstract declarations hash a canonical
//! JSON form with sorted keys, so key order in the document is irrelevant.

use std::fmt;

use serde_json::Value as JsonValue;
use serde_yaml::Mapping;
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, Result};

const PATH_DOMAIN: &[u8] = b"path\0";
const MAPPING_DOMAIN: &[u8] = b"mapping\0";

/// SHA-256 identity of an input declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId([u8; 32]);

impl ContentId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log output.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short())
    }
}

/// Identity of a path declaration.
pub fn hash_path(path: &str) -> ContentId {
    ContentId(sha256(PATH_DOMAIN, path.as_bytes()))
}

/// Identity of an abstract (mapping) declaration.
pub fn hash_mapping(mapping: &Mapping) -> Result<ContentId> {
    let json = serde_json::to_value(mapping).map_err(|e| {
        ConfigError::schema(format!("input declaration cannot be serialized: {}", e))
    })?;
    let canonical = canonicalize_json(&json);
    let bytes = serde_json::to_vec(&canonical).map_err(|e| {
        ConfigError::schema(format!("input declaration cannot be serialized: {}", e))
    })?;
    Ok(ContentId(sha256(MAPPING_DOMAIN, &bytes)))
}

fn sha256(domain: &[u8], bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Sort object keys recursively; arrays keep their order.
pub fn canonicalize_json(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();

            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(child) = map.get(key) {
                    sorted.insert(key.clone(), canonicalize_json(child));
                }
            }
            JsonValue::Object(sorted)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize_json).collect()),
        other => other.clone(),
    }
}
