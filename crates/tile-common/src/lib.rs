//! Common geometry types shared by the tiled process configuration crates.
//!
//! - [`Bounds`]: left/bottom/right/top extents
//! - [`Area`]: union of axis-aligned boxes, used for process areas
//! - [`Crs`]: the two coordinate reference systems tile grids are defined in
//! - [`TilePyramid`]: grid type, metatiling and pixelbuffer

pub mod area;
pub mod bbox;
pub mod crs;
pub mod error;
pub mod pyramid;

pub use area::Area;
pub use bbox::Bounds;
pub use crs::Crs;
pub use error::{GridError, GridResult};
pub use pyramid::{GridType, TilePyramid};
