//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::alerts::{AdvisoryTable, AlertLabels, AlertParams};
use crate::classification::ForestParams;
use crate::imagery::{CompositeParams, IndexDefinition};
use cropsense_core::raster::Connectivity;
use cropsense_core::{Error, Result};

/// Settings for one pipeline run.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum cloud cover (percent) for an observation to be composited
    pub cloud_threshold: f64,
    /// Sampling resolution in map units (meters)
    pub scale: f64,
    /// Trees in the random forest
    pub tree_count: usize,
    /// Region adjacency, 4 or 8
    pub connectivity: Connectivity,
    pub seed: u64,
    /// Indices to composite
    pub indices: Vec<IndexDefinition>,
    /// Composite bands used as predictors; `None` uses every index
    pub predictors: Option<Vec<String>>,
    pub max_depth: Option<usize>,
    /// Labels whose regions raise an alert
    pub alert_labels: AlertLabels,
    /// Advisory overrides by label, merged over the built-in table
    pub advisories: BTreeMap<String, String>,
    pub min_region_pixels: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cloud_threshold: 10.0,
            scale: 10.0,
            tree_count: 10,
            connectivity: Connectivity::Eight,
            seed: 42,
            indices: IndexDefinition::defaults(),
            predictors: None,
            max_depth: None,
            alert_labels: AlertLabels::default(),
            advisories: BTreeMap::new(),
            min_region_pixels: 1,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: PipelineConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.cloud_threshold) {
            return Err(Error::invalid_param(
                "cloud_threshold",
                self.cloud_threshold,
                "must be a percentage between 0 and 100",
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::invalid_param("scale", self.scale, "must be a positive number"));
        }
        if self.tree_count == 0 {
            return Err(Error::invalid_param("tree_count", 0, "must be at least 1"));
        }
        if self.indices.is_empty() {
            return Err(Error::invalid_param("indices", "[]", "at least one index is required"));
        }
        if let Some(predictors) = &self.predictors {
            if predictors.is_empty() {
                return Err(Error::invalid_param("predictors", "[]", "at least one predictor is required"));
            }
        }
        Ok(())
    }

    /// Predictor band names, in model order
    pub fn predictor_names(&self) -> Vec<String> {
        match &self.predictors {
            Some(p) => p.clone(),
            None => self.indices.iter().map(|d| d.name.clone()).collect(),
        }
    }

    pub fn composite_params(&self) -> CompositeParams {
        CompositeParams {
            cloud_threshold: self.cloud_threshold,
            indices: self.indices.clone(),
        }
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.tree_count,
            max_depth: self.max_depth,
            seed: self.seed,
            ..Default::default()
        }
    }

    pub fn alert_params(&self) -> AlertParams {
        AlertParams {
            connectivity: self.connectivity,
            min_region_pixels: self.min_region_pixels,
            advisories: AdvisoryTable::default().merged(&self.advisories),
        }
    }
}
