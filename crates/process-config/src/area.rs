//! Memoized process areas.

use std::cell::RefCell;
use std::collections::HashMap;

use once_cell::unsync::OnceCell;
use tile_common::Area;

use crate::error::Result;

/// Per-zoom and global area caches of one configuration.
///
/// Entries are computed on first request and kept for the lifetime of the
/// owning configuration. Single threaded; this makes the owner `!Sync`.
#[derive(Debug, Default)]
pub(crate) struct AreaCache {
    per_zoom: RefCell<HashMap<u32, Area>>,
    global: OnceCell<Area>,
}

impl AreaCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Cached area at `zoom`, computing it with `compute` on first use.
    pub(crate) fn at_zoom(&self, zoom: u32, compute: impl FnOnce() -> Result<Area>) -> Result<Area> {
        if let Some(area) = self.per_zoom.borrow().get(&zoom) {
            return Ok(area.clone());
        }
        let area = compute()?;
        self.per_zoom.borrow_mut().insert(zoom, area.clone());
        Ok(area)
    }

    /// Cached global area, computing it with `compute` on first use.
    pub(crate) fn global(&self, compute: impl FnOnce() -> Result<Area>) -> Result<Area> {
        self.global.get_or_try_init(compute).cloned()
    }

    #[cfg(test)]
    pub(crate) fn cached_zooms(&self) -> usize {
        self.per_zoom.borrow().len()
    }
}
