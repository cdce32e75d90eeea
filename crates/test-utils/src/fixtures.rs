//! Common test fixtures for configuration tests.
//!
//! Documents reference input files by relative path; write the matching
//! files into a [`crate::ProcessDir`] before loading them.

/// Common bounds definitions (left, bottom, right, top) for testing.
pub mod bbox {
    /// Global geodetic extent
    pub const GLOBAL: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

    /// Small box at the origin
    pub const ORIGIN_10: [f64; 4] = [0.0, 0.0, 10.0, 10.0];

    /// Box overlapping the right half of [`ORIGIN_10`]
    pub const SHIFTED: [f64; 4] = [5.0, -5.0, 20.0, 5.0];

    /// Box disjoint from [`ORIGIN_10`]
    pub const FAR_AWAY: [f64; 4] = [100.0, 40.0, 110.0, 50.0];

    /// Continental Europe
    pub const EUROPE: [f64; 4] = [-15.0, 35.0, 45.0, 72.0];
}

/// Common `.mapchete` documents.
pub mod documents {
    /// One unconditional path input, zooms 0-2, bounds 0,0,10,10.
    pub const MINIMAL: &str = r#"
process_file: process.py
zoom_levels:
  min: 0
  max: 2
pyramid:
  grid: geodetic
input:
  file1: file1.geojson
output:
  format: GeoJSON
  path: output
bounds: [0, 0, 10, 10]
"#;

    /// Inputs switching by zoom level plus a zoom dependent user parameter.
    pub const ZOOM_DEPENDENT: &str = r#"
process_file: process.py
zoom_levels:
  min: 0
  max: 5
pyramid:
  grid: geodetic
  metatiling: 2
input:
  file1:
    zoom<3: coarse.geojson
    zoom>=3: fine.geojson
  file2: coarse.geojson
output:
  format: GeoJSON
  path: output
  metatiling: 1
resampling:
  zoom<=2: nearest
  zoom>2: bilinear
some_float: 0.5
"#;

    /// The same input declared under two groups.
    pub const SHARED_INPUTS: &str = r#"
process_file: process.py
zoom_levels: 4
pyramid:
  grid: geodetic
input:
  group1:
    file1: shared.geojson
    file2: other.geojson
  group2:
    file1: shared.geojson
    file2: other.geojson
output:
  format: GeoJSON
  path: output
"#;

    /// Legacy document using deprecated keys.
    pub const DEPRECATED: &str = r#"
process_file: process.py
process_minzoom: 0
process_maxzoom: 3
process_bounds: [0, 0, 10, 10]
metatiling: 2
pixelbuffer: 4
input_files:
  file1: file1.geojson
output:
  format: GeoJSON
  path: output
  type: geodetic
"#;

    /// No inputs at all.
    pub const NO_INPUT: &str = r#"
process_file: process.py
zoom_levels:
  min: 0
  max: 3
pyramid:
  grid: geodetic
input: null
output:
  format: GeoJSON
  path: output
bounds: [0, 0, 10, 10]
"#;
}
