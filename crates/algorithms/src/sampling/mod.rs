//! Point sampling
//!
//! - Neighborhood-mean lookup of a raster at a map coordinate
//! - Feature extraction: every composite band sampled at labeled points

mod features;
mod point;

pub use features::{extract_features, FeatureVector};
pub use point::{sample, window_radius};
