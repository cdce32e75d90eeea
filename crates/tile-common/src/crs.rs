//! Coordinate Reference System codes supported by tile grids.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::Bounds;

/// Web Mercator half extent in meters.
pub const MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Latitude limit of the Web Mercator square (approx ±85.05°).
pub const MERCATOR_MAX_LAT: f64 = 85.0511287798066;

const EARTH_RADIUS: f64 = 6378137.0;

/// Well-known CRS codes tile pyramids are defined in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl Crs {
    /// Get the valid bounds for this CRS.
    pub fn valid_bounds(&self) -> Bounds {
        match self {
            Crs::Epsg4326 => Bounds::new(-180.0, -90.0, 180.0, 90.0),
            Crs::Epsg3857 => Bounds::new(
                -MERCATOR_MAX_EXTENT,
                -MERCATOR_MAX_EXTENT,
                MERCATOR_MAX_EXTENT,
                MERCATOR_MAX_EXTENT,
            ),
        }
    }

    /// Transform bounds from this CRS into `target`.
    ///
    /// Geographic input is clamped to the Mercator latitude limit before
    /// projecting. Both projections are axis-aligned, so transforming the
    /// two corners is exact.
    pub fn transform_bounds(&self, bounds: &Bounds, target: Crs) -> Bounds {
        match (self, target) {
            (Crs::Epsg4326, Crs::Epsg3857) => {
                let (left, bottom) = lonlat_to_mercator(bounds.left, bounds.bottom);
                let (right, top) = lonlat_to_mercator(bounds.right, bounds.top);
                Bounds::new(left, bottom, right, top)
            }
            (Crs::Epsg3857, Crs::Epsg4326) => {
                let (left, bottom) = mercator_to_lonlat(bounds.left, bounds.bottom);
                let (right, top) = mercator_to_lonlat(bounds.right, bounds.top);
                Bounds::new(left, bottom, right, top)
            }
            _ => *bounds,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Crs::Epsg4326 => "EPSG:4326",
            Crs::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}
