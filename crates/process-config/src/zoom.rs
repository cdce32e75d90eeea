//! Contiguous zoom level ranges.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;
use serde_yaml::Value;

use crate::error::{ConfigError, Result};

/// An inclusive, contiguous range of zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ZoomLevels {
    min: u32,
    max: u32,
}

impl ZoomLevels {
    /// Create a range; `min` must not exceed `max`.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(ConfigError::zoom_range(format!(
                "minimum zoom {} is greater than maximum zoom {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// A range containing a single zoom level.
    pub fn single(zoom: u32) -> Self {
        Self {
            min: zoom,
            max: zoom,
        }
    }

    /// Build a range from one zoom or a pair of zooms.
    ///
    /// A pair may be given in either order.
    pub fn from_slice(zooms: &[u32]) -> Result<Self> {
        match zooms {
            [zoom] => Ok(Self::single(*zoom)),
            [a, b] => Ok(Self {
                min: (*a).min(*b),
                max: (*a).max(*b),
            }),
            _ => Err(ConfigError::zoom_range(format!(
                "expected one or two zoom levels, got {}",
                zooms.len()
            ))),
        }
    }

    /// Parse the `zoom_levels` document value: an integer or a `{min, max}` mapping.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(_) => Ok(Self::single(zoom_from_value(value, "zoom_levels")?)),
            Value::Mapping(map) => {
                let min = map
                    .get("min")
                    .ok_or_else(|| ConfigError::zoom_range("zoom_levels minimum not given"))?;
                let max = map
                    .get("max")
                    .ok_or_else(|| ConfigError::zoom_range("zoom_levels maximum not given"))?;
                Self::new(
                    zoom_from_value(min, "zoom_levels min")?,
                    zoom_from_value(max, "zoom_levels max")?,
                )
            }
            other => Err(ConfigError::zoom_range(format!(
                "zoom_levels must be an integer or a min/max mapping, got {:?}",
                other
            ))),
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of zoom levels in the range.
    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    /// Always false; a range holds at least one zoom.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, zoom: u32) -> bool {
        zoom >= self.min && zoom <= self.max
    }

    /// True if every zoom of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &ZoomLevels) -> bool {
        other.contains(self.min) && other.contains(self.max)
    }

    /// Iterate zoom levels in ascending order.
    pub fn iter(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }
}

impl IntoIterator for ZoomLevels {
    type Item = u32;
    type IntoIter = RangeInclusive<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ZoomLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Read a non-negative integer zoom level.
pub(crate) fn zoom_from_value(value: &Value, what: &str) -> Result<u32> {
    value
        .as_u64()
        .and_then(|z| u32::try_from(z).ok())
        .ok_or_else(|| {
            ConfigError::zoom_range(format!(
                "{} must be a non-negative integer, got {:?}",
                what, value
            ))
        })
}
