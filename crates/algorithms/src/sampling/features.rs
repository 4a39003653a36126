//! Feature vectors: composite values at labeled sample points

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::sample;
use cropsense_core::raster::BandSet;
use cropsense_core::{Coordinate, Error, Result, SamplePoint};

/// Everything known about one sample point: sampled band values, the point's
/// auxiliary attributes, and its label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub point_id: String,
    pub location: Coordinate,
    pub label: String,
    /// Field name (band or attribute) to value
    pub values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

/// Sample every band of `composites` at every point and merge in the
/// points' auxiliary attributes.
///
/// Fails as a whole if any point is outside the raster extent; an attribute
/// that shares a name with a band is rejected.
pub fn extract_features(
    composites: &BandSet,
    points: &[SamplePoint],
    scale: f64,
) -> Result<Vec<FeatureVector>> {
    points
        .iter()
        .map(|point| {
            let mut values = BTreeMap::new();
            for (name, raster) in composites.iter() {
                values.insert(name.to_string(), sample(raster, point.location, scale)?);
            }
            for (key, &value) in &point.attributes {
                if values.insert(key.clone(), value).is_some() {
                    return Err(Error::invalid_param(
                        "attributes",
                        key,
                        format!("sample point {} attribute collides with a band name", point.id),
                    ));
                }
            }
            Ok(FeatureVector {
                point_id: point.id.clone(),
                location: point.location,
                label: point.label.clone(),
                values,
            })
        })
        .collect()
}
