//! GeoJSON generators for input files.
//!
//! These generators create predictable feature collections whose bounding
//! boxes are known in advance, so input driver results can be checked
//! against the bounds used to build them.

use serde_json::{json, Value};

/// A closed polygon ring around `bounds` (left, bottom, right, top).
pub fn bounds_ring(bounds: [f64; 4]) -> Vec<[f64; 2]> {
    let [left, bottom, right, top] = bounds;
    vec![
        [left, bottom],
        [right, bottom],
        [right, top],
        [left, top],
        [left, bottom],
    ]
}

/// A GeoJSON polygon feature covering `bounds`.
pub fn polygon_feature(bounds: [f64; 4]) -> Value {
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [bounds_ring(bounds)],
        }
    })
}

/// A serialized GeoJSON feature collection with one polygon per bounds.
///
/// # Example
///
/// ```
/// use test_utils::feature_collection;
///
/// let text = feature_collection(&[[0.0, 0.0, 1.0, 1.0]]);
/// assert!(text.contains("FeatureCollection"));
/// ```
pub fn feature_collection(bounds: &[[f64; 4]]) -> String {
    let features: Vec<Value> = bounds.iter().copied().map(polygon_feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_ring_is_closed() {
        let ring = bounds_ring([0.0, 1.0, 2.0, 3.0]);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_feature_collection_parses() {
        let text = feature_collection(&[[0.0, 0.0, 1.0, 1.0], [2.0, 2.0, 3.0, 3.0]]);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
    }
}
