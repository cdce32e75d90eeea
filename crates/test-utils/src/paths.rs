//! Temporary process directories for configuration tests.
//!
//! A [`ProcessDir`] is a throwaway configuration base directory holding a
//! process file, input files and `.mapchete` documents. Everything is removed
//! when the value is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::generators::feature_collection;

/// Name of the process file written into every [`ProcessDir`].
pub const PROCESS_FILE: &str = "process.py";

/// A temporary configuration directory.
pub struct ProcessDir {
    dir: TempDir,
}

impl ProcessDir {
    /// Create a new directory containing [`PROCESS_FILE`].
    ///
    /// # Panics
    /// Panics if the directory or the process file cannot be created.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp process dir");
        let this = Self { dir };
        this.write(
            PROCESS_FILE,
            "def execute(mp):\n    with mp.open(\"file1\") as src:\n        return src.read()\n",
        );
        this
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` (relative to the directory) and return the full path.
    ///
    /// Parent directories are created as needed.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write test file");
        path
    }

    /// Write a GeoJSON feature collection with one polygon per bounds.
    pub fn write_geojson(&self, name: &str, bounds: &[[f64; 4]]) -> PathBuf {
        self.write(name, &feature_collection(bounds))
    }

    /// Write a `.mapchete` document.
    pub fn write_document(&self, name: &str, yaml: &str) -> PathBuf {
        self.write(name, yaml)
    }

    /// Remove the process file to simulate a broken configuration.
    pub fn remove_process_file(&self) {
        fs::remove_file(self.dir.path().join(PROCESS_FILE)).expect("remove process file");
    }
}

impl Default for ProcessDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_dir_contains_process_file() {
        let dir = ProcessDir::new();
        assert!(dir.path().join(PROCESS_FILE).is_file());
    }

    #[test]
    fn test_write_creates_nested_dirs() {
        let dir = ProcessDir::new();
        let path = dir.write("inputs/a/b.geojson", "{}");
        assert!(path.is_file());
    }
}
