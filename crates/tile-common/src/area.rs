//! Process areas as unions of axis-aligned boxes.
//!
//! Input bounding geometries, initialization bounds and the areas derived
//! from them are all rectangles or unions of rectangles, so an [`Area`] is
//! stored as the list of its component boxes. Zero-area boxes are dropped on
//! construction; an area without components is empty.

use serde::{Deserialize, Serialize};

use crate::Bounds;

const EPSILON: f64 = 1e-9;

/// A (possibly empty) union of axis-aligned boxes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Area {
    parts: Vec<Bounds>,
}

impl Area {
    /// The empty area.
    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    /// An area covering a single box. Zero-area bounds give an empty area.
    pub fn from_bounds(bounds: Bounds) -> Self {
        let mut area = Self::empty();
        area.push(bounds);
        area
    }

    /// Union of all given areas.
    pub fn union_all<'a>(areas: impl IntoIterator<Item = &'a Area>) -> Self {
        let mut out = Self::empty();
        for area in areas {
            for part in &area.parts {
                out.push(*part);
            }
        }
        out
    }

    fn push(&mut self, bounds: Bounds) {
        if bounds.is_empty() {
            return;
        }
        if self.parts.iter().any(|p| p.contains(&bounds)) {
            return;
        }
        self.parts.retain(|p| !bounds.contains(p));
        self.parts.push(bounds);
    }

    /// Component boxes of this area.
    pub fn parts(&self) -> &[Bounds] {
        &self.parts
    }

    /// True if the area covers nothing.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Union with another area.
    pub fn union(&self, other: &Area) -> Area {
        Area::union_all([self, other])
    }

    /// Clip the area to a box.
    pub fn intersection_with(&self, bounds: &Bounds) -> Area {
        let mut out = Area::empty();
        for part in &self.parts {
            if let Some(clipped) = part.intersection(bounds) {
                out.push(clipped);
            }
        }
        out
    }

    /// Smallest bounds enclosing the area, `None` if the area is empty.
    pub fn envelope(&self) -> Option<Bounds> {
        let mut iter = self.parts.iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, b| acc.union(b)))
    }

    /// Exact covered surface in squared coordinate units.
    ///
    /// Overlapping components are counted once (slab sweep over the
    /// distinct x coordinates).
    pub fn measure(&self) -> f64 {
        let mut xs: Vec<f64> = self
            .parts
            .iter()
            .flat_map(|b| [b.left, b.right])
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();

        let mut total = 0.0;
        for slab in xs.windows(2) {
            let (x0, x1) = (slab[0], slab[1]);
            let mut spans: Vec<(f64, f64)> = self
                .parts
                .iter()
                .filter(|b| b.left <= x0 && b.right >= x1)
                .map(|b| (b.bottom, b.top))
                .collect();
            if spans.is_empty() {
                continue;
            }
            spans.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut covered = 0.0;
            let (mut start, mut end) = spans[0];
            for &(lo, hi) in &spans[1..] {
                if lo > end {
                    covered += end - start;
                    start = lo;
                    end = hi;
                } else if hi > end {
                    end = hi;
                }
            }
            covered += end - start;
            total += covered * (x1 - x0);
        }
        total
    }

    /// True if every point of `other` is inside this area.
    pub fn covers(&self, other: &Area) -> bool {
        let own = self.measure();
        let merged = self.union(other).measure();
        (merged - own).abs() <= EPSILON * merged.max(1.0)
    }

    /// True if both areas cover exactly the same points.
    pub fn same_extent(&self, other: &Area) -> bool {
        self.covers(other) && other.covers(self)
    }
}

impl From<Bounds> for Area {
    fn from(bounds: Bounds) -> Self {
        Area::from_bounds(bounds)
    }
}
