//! End-to-end run: composite, sample, train, classify, group into alerts

mod config;

pub use config::PipelineConfig;

use tracing::{debug, info};

use crate::alerts::{regions_with, AlertRegion};
use crate::classification::{classify, train, ClassificationRaster, RandomForest};
use crate::imagery::{composite, Composite};
use crate::sampling::{extract_features, FeatureVector};
use cropsense_core::raster::ImageStack;
use cropsense_core::{Result, SamplePoint};

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub composite: Composite,
    pub features: Vec<FeatureVector>,
    pub model: RandomForest,
    pub classification: ClassificationRaster,
    pub regions: Vec<AlertRegion>,
}

impl PipelineOutput {
    /// Regions whose label triggered an alert
    pub fn alerts(&self) -> impl Iterator<Item = &AlertRegion> {
        self.regions.iter().filter(|r| r.triggered)
    }
}

/// Run the full pipeline on an image stack and labeled sample points.
///
/// Each stage's error is returned unchanged: [`EmptyStack`] from
/// compositing, [`OutOfBounds`] from sampling, [`DegenerateTraining`] and
/// [`SchemaMismatch`] from training and classification.
///
/// [`EmptyStack`]: cropsense_core::Error::EmptyStack
/// [`OutOfBounds`]: cropsense_core::Error::OutOfBounds
/// [`DegenerateTraining`]: cropsense_core::Error::DegenerateTraining
/// [`SchemaMismatch`]: cropsense_core::Error::SchemaMismatch
pub fn run_pipeline(
    stack: &ImageStack,
    points: &[SamplePoint],
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    config.validate()?;

    info!(
        "Compositing {} observations (cloud cover <= {}%)",
        stack.len(),
        config.cloud_threshold
    );
    let composite = composite(stack, &config.composite_params())?;
    debug!(
        "{} of {} observations used: {:?}",
        composite.observations.len(),
        stack.len(),
        composite.observations
    );

    // Predictors must be composite bands, checked before any training
    let predictors = config.predictor_names();
    let bands = composite.indices.select(&predictors)?;

    info!("Sampling {} points at {} m", points.len(), config.scale);
    let features = extract_features(&composite.indices, points, config.scale)?;

    info!("Training random forest ({} trees) on {:?}", config.tree_count, predictors);
    let model = train(&features, &predictors, &config.forest_params())?;
    debug!("Classes: {:?}", model.classes());

    let (rows, cols) = bands.template().map_or((0, 0), |r| r.shape());
    info!("Classifying {} x {} pixels", rows, cols);
    let classification = classify(&model, &bands)?;
    debug!("Class counts: {:?}", classification.class_counts());

    let regions = regions_with(&classification, &config.alert_params(), &config.alert_labels);
    info!(
        "{} regions, {} alert(s)",
        regions.len(),
        regions.iter().filter(|r| r.triggered).count()
    );

    Ok(PipelineOutput {
        composite,
        features,
        model,
        classification,
        regions,
    })
}
