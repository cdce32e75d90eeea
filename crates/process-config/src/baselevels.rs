//! Baselevel settings.
//!
//! Baselevels are zoom levels whose tiles are derived from neighbouring
//! levels instead of being processed: `lower` resampling builds a level
//! from the next finer one, `higher` from the next coarser one.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tile_common::TilePyramid;

use crate::error::{ConfigError, Result};
use crate::zoom::{zoom_from_value, ZoomLevels};

/// Resampling methods accepted for baselevels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
    Gauss,
}

impl Resampling {
    pub const ALL: [Resampling; 8] = [
        Resampling::Nearest,
        Resampling::Bilinear,
        Resampling::Cubic,
        Resampling::CubicSpline,
        Resampling::Lanczos,
        Resampling::Average,
        Resampling::Mode,
        Resampling::Gauss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resampling::Nearest => "nearest",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::CubicSpline => "cubic_spline",
            Resampling::Lanczos => "lanczos",
            Resampling::Average => "average",
            Resampling::Mode => "mode",
            Resampling::Gauss => "gauss",
        }
    }
}

impl FromStr for Resampling {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ConfigError::schema(format!("unknown resampling method '{}'", s)))
    }
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved baselevel settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baselevels {
    pub zooms: ZoomLevels,
    pub lower: Resampling,
    pub higher: Resampling,
    /// Output grid and pixelbuffer with the process metatiling.
    pub tile_pyramid: TilePyramid,
}

/// Resolve the `baselevels` section.
///
/// A missing `min` or `max` defaults to the process zoom range; a single
/// bound beyond that range therefore fails with `min > max`.
pub fn resolve_baselevels(
    raw: &Mapping,
    zoom_levels: &ZoomLevels,
    process: &TilePyramid,
    output: &TilePyramid,
) -> Result<Baselevels> {
    let min = raw.get("min").filter(|v| !v.is_null());
    let max = raw.get("max").filter(|v| !v.is_null());
    if min.is_none() && max.is_none() {
        return Err(ConfigError::zoom_range(
            "no min and max values given for baselevels",
        ));
    }
    let min = match min {
        Some(value) => zoom_from_value(value, "baselevels min")?,
        None => zoom_levels.min(),
    };
    let max = match max {
        Some(value) => zoom_from_value(value, "baselevels max")?,
        None => zoom_levels.max(),
    };

    let tile_pyramid = TilePyramid::new(output.grid(), process.metatiling(), output.pixelbuffer())?;

    Ok(Baselevels {
        zooms: ZoomLevels::new(min, max)?,
        lower: resampling_at(raw, "lower")?,
        higher: resampling_at(raw, "higher")?,
        tile_pyramid,
    })
}

fn resampling_at(raw: &Mapping, key: &str) -> Result<Resampling> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(Resampling::default()),
        Some(Value::String(method)) => method.parse(),
        Some(other) => Err(ConfigError::schema(format!(
            "baselevels {} must be a resampling method, got {:?}",
            key, other
        ))),
    }
}
