//! Imagery analysis algorithms
//!
//! - Spectral indices: NDVI, NDWI, NDSI, PIR and any other normalized difference
//! - Temporal compositing: cloud-filtered pixel-wise median over an image stack

mod composite;
mod indices;

pub use composite::{composite, median_composite, Composite, CompositeParams};
pub use indices::{
    compute_index, compute_indices, ndsi, ndvi, ndwi, normalized_difference, pir,
    IndexDefinition, SpectralIndex,
};
