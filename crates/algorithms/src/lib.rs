//! # CropSense Algorithms
//!
//! Crop-health analysis over multispectral image stacks.
//!
//! ## Stages
//!
//! - **imagery**: normalized-difference indices, cloud-filtered median composites
//! - **sampling**: neighborhood-mean point sampling, feature extraction
//! - **classification**: random forest training and per-pixel classification
//! - **alerts**: connected regions, advisories, alert predicates
//! - **pipeline**: the stages above run end to end from one configuration

pub mod alerts;
pub mod classification;
pub mod imagery;
pub mod pipeline;
pub mod sampling;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::alerts::{
        alert_report, regions, regions_with, AdvisoryTable, AlertLabels, AlertParams,
        AlertPredicate, AlertRegion,
    };
    pub use crate::classification::{
        classify, train, ClassificationRaster, ForestParams, RandomForest,
    };
    pub use crate::imagery::{
        composite, compute_index, compute_indices, median_composite, ndsi, ndvi, ndwi,
        normalized_difference, pir, Composite, CompositeParams, IndexDefinition, SpectralIndex,
    };
    pub use crate::pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
    pub use crate::sampling::{extract_features, sample, FeatureVector};
    pub use cropsense_core::prelude::*;
}
