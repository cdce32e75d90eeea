//! Tile pyramid definitions.
//!
//! A pyramid is a grid type (the tile matrix layout per zoom level) plus a
//! metatiling factor grouping base tiles into larger units and a pixelbuffer
//! adding overlap around each (meta)tile. Only the pyramid definition is
//! modelled here; tile enumeration belongs to the process runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GridError, GridResult};
use crate::{Bounds, Crs};

/// Metatiling factors accepted by [`TilePyramid::new`].
pub const VALID_METATILING: [u32; 5] = [1, 2, 4, 8, 16];

/// Tile matrix layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    /// WGS84 lon/lat grid with two root tiles (2:1 matrix).
    Geodetic,
    /// Web Mercator grid with a single root tile (1:1 matrix).
    Mercator,
}

impl GridType {
    /// Coordinate reference system of the grid.
    pub fn crs(&self) -> Crs {
        match self {
            GridType::Geodetic => Crs::Epsg4326,
            GridType::Mercator => Crs::Epsg3857,
        }
    }

    /// Full extent of the grid.
    pub fn bounds(&self) -> Bounds {
        self.crs().valid_bounds()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GridType::Geodetic => "geodetic",
            GridType::Mercator => "mercator",
        }
    }
}

impl FromStr for GridType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geodetic" => Ok(GridType::Geodetic),
            "mercator" => Ok(GridType::Mercator),
            _ => Err(GridError::UnknownGrid(s.to_string())),
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tile pyramid with metatiling and pixelbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePyramid {
    grid: GridType,
    metatiling: u32,
    pixelbuffer: u32,
}

impl TilePyramid {
    /// Create a pyramid; metatiling must be a power of two up to 16.
    pub fn new(grid: GridType, metatiling: u32, pixelbuffer: u32) -> GridResult<Self> {
        if !VALID_METATILING.contains(&metatiling) {
            return Err(GridError::InvalidMetatiling(metatiling));
        }
        Ok(Self {
            grid,
            metatiling,
            pixelbuffer,
        })
    }

    pub fn grid(&self) -> GridType {
        self.grid
    }

    pub fn metatiling(&self) -> u32 {
        self.metatiling
    }

    pub fn pixelbuffer(&self) -> u32 {
        self.pixelbuffer
    }

    pub fn crs(&self) -> Crs {
        self.grid.crs()
    }

    pub fn bounds(&self) -> Bounds {
        self.grid.bounds()
    }
}
