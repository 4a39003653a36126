//! Point data: map coordinates and labeled field samples

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A position in the raster's map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A ground-truth observation: where, what state, and auxiliary readings
/// such as soil moisture or temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub location: Coordinate,
    /// Categorical health state, e.g. `healthy` or `stressed`
    pub label: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl SamplePoint {
    pub fn new(id: impl Into<String>, location: Coordinate, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location,
            label: label.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_layout_is_flat() {
        let p: SamplePoint = serde_json::from_str(
            r#"{"id": "p1", "x": 76.5, "y": 11.2, "label": "stressed",
                "attributes": {"soil_moisture": 0.18}}"#,
        )
        .unwrap();
        assert_eq!(p.location, Coordinate::new(76.5, 11.2));
        assert_eq!(p.attributes["soil_moisture"], 0.18);
    }
}
