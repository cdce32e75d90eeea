//! Zoom-dependent process configuration.
//!
//! This crate turns a tiled process document (a `.mapchete` YAML file or
//! an in-memory mapping) into a validated, immutable [`Configuration`]:
//!
//! - **Zoom-conditional values**: keys like `zoom<3` select values per zoom
//! - **Shared inputs**: each distinct input declaration is opened once
//! - **Pyramids**: process and output tile pyramids with metatiling rules
//! - **Areas**: per-zoom and global process areas, computed lazily
//!
//! # Architecture
//!
//! ```text
//! .mapchete / mapping
//!      │
//!      ▼
//! load_document ─► normalize (deprecated keys) ─► RawDocument
//!      │
//!      ├─► build_pyramids ─► process / output TilePyramid
//!      │
//!      ├─► resolve_params(zoom) for each initialized zoom
//!      │         │
//!      │         └─► input subtree ─► flatten ─► ContentId per leaf
//!      │
//!      ├─► output driver load + compatibility check
//!      │
//!      └─► InputRegistry::materialize (one handle per ContentId)
//!               │
//!               ▼
//!          Configuration::snapshot(zoom) / area(zoom)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use process_config::{Configuration, DriverRegistry, InitOptions};
//!
//! let config = Configuration::new(
//!     std::path::Path::new("process.mapchete"),
//!     InitOptions::default().with_zoom(vec![0, 5]),
//!     &DriverRegistry::with_builtin(),
//! )?;
//!
//! let snapshot = config.snapshot(3)?;
//! let dem = snapshot.input_at("dem");
//! let bounds = config.bounds(Some(3))?;
//! ```

mod area;
pub mod baselevels;
pub mod config;
pub mod document;
pub mod drivers;
pub mod error;
pub mod expr;
pub mod hash;
pub mod input;
pub mod mode;
pub mod normalize;
pub mod pyramids;
pub mod schema;
pub mod tree;
pub mod zoom;

// Re-export commonly used types at crate root
pub use baselevels::{Baselevels, Resampling};
pub use config::{Configuration, ConfigurationSnapshot, InitOptions};
pub use document::DocumentSource;
pub use drivers::{
    Delimiters, DriverRegistry, InputDriver, InputHandle, InputLoad, InputReader, InputSource,
    OutputDriver, OutputParams, OutputWriter,
};
pub use error::{ConfigError, DriverError, Result};
pub use expr::{ConfigNode, ZoomPredicate};
pub use hash::ContentId;
pub use input::InputDeclaration;
pub use mode::ProcessingMode;
pub use tree::{flatten, unflatten, Tree, TreeMap};
pub use zoom::ZoomLevels;

// Re-export geometry types used in the public API
pub use tile_common::{Area, Bounds, Crs, GridType, TilePyramid};
