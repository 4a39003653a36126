//! Random forest: bagged CART trees with per-split feature subsampling

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::tree::{DecisionTree, TreeParams};
use crate::maybe_rayon::*;
use crate::sampling::FeatureVector;
use cropsense_core::{Error, Result};

/// Parameters for [`train`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees (default: 10)
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum samples needed to split a node (default: 2)
    pub min_samples_split: usize,
    /// Predictors tried per split; `None` uses `ceil(sqrt(p))`
    pub features_per_split: Option<usize>,
    /// Seed for bootstrap draws and feature subsets (default: 42)
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 10,
            max_depth: None,
            min_samples_split: 2,
            features_per_split: None,
            seed: 42,
        }
    }
}

/// A trained ensemble. Immutable; retraining produces a new model.
///
/// Deserializing checks that every tree only refers to known predictors
/// and classes, so a loaded model cannot index out of range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForestData")]
pub struct RandomForest {
    predictors: Vec<String>,
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
}

/// Unchecked wire form of [`RandomForest`]
#[derive(Deserialize)]
struct ForestData {
    predictors: Vec<String>,
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl TryFrom<ForestData> for RandomForest {
    type Error = Error;

    fn try_from(data: ForestData) -> Result<Self> {
        if data.predictors.is_empty() {
            return Err(Error::invalid_param("predictors", "[]", "model has no predictors"));
        }
        if data.classes.len() < 2 {
            return Err(Error::DegenerateTraining {
                classes: data.classes.len(),
            });
        }
        if data.trees.is_empty() {
            return Err(Error::invalid_param("trees", 0, "model has no trees"));
        }
        if let Some(t) = data
            .trees
            .iter()
            .position(|tree| !tree.fits(data.predictors.len(), data.classes.len()))
        {
            return Err(Error::invalid_param(
                "trees",
                t,
                format!(
                    "tree refers to a predictor beyond {} or a class beyond {}",
                    data.predictors.len(),
                    data.classes.len()
                ),
            ));
        }
        Ok(Self {
            predictors: data.predictors,
            classes: data.classes,
            trees: data.trees,
        })
    }
}

impl RandomForest {
    /// Predictor names in the order the model expects them
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Class labels, sorted; class code `i + 1` is `classes[i]`
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Vote counts per class for one predictor vector
    pub fn votes(&self, x: &[f64]) -> Vec<usize> {
        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            votes[tree.predict(x)] += 1;
        }
        votes
    }

    /// Winning class index and the fraction of trees that voted for it.
    ///
    /// Ties go to the lowest class index. `None` if any predictor is
    /// not finite.
    pub fn predict(&self, x: &[f64]) -> Option<(usize, f64)> {
        if x.len() != self.predictors.len() || x.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let votes = self.votes(x);
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        Some((best, votes[best] as f64 / self.trees.len() as f64))
    }

    /// Predicted label for one predictor vector
    pub fn predict_label(&self, x: &[f64]) -> Option<&str> {
        self.predict(x).map(|(class, _)| self.classes[class].as_str())
    }
}

/// Train a random forest on labeled feature vectors.
///
/// Each tree is grown on a bootstrap sample of the training rows. Rows with
/// a non-finite predictor are dropped before the class check.
///
/// # Errors
/// - [`Error::SchemaMismatch`] if a feature vector lacks one of `predictors`
/// - [`Error::DegenerateTraining`] if fewer than 2 distinct labels remain
/// - [`Error::InvalidParameter`] for an empty predictor list or zero trees
pub fn train(
    features: &[FeatureVector],
    predictors: &[String],
    params: &ForestParams,
) -> Result<RandomForest> {
    if predictors.is_empty() {
        return Err(Error::invalid_param("predictors", "[]", "at least one predictor is required"));
    }
    if params.n_trees == 0 {
        return Err(Error::invalid_param("n_trees", 0, "must be at least 1"));
    }

    let mut x: Vec<Vec<f64>> = Vec::with_capacity(features.len());
    let mut labels: Vec<&str> = Vec::with_capacity(features.len());
    for fv in features {
        let row = predictors
            .iter()
            .map(|name| {
                fv.get(name).ok_or_else(|| Error::SchemaMismatch {
                    expected: predictors.to_vec(),
                    found: fv.values.keys().cloned().collect(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if row.iter().any(|v| !v.is_finite()) {
            warn!("Dropping sample {} ({}): non-finite predictor", fv.point_id, fv.label);
            continue;
        }
        x.push(row);
        labels.push(fv.label.as_str());
    }

    let classes: Vec<String> = labels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    if classes.len() < 2 {
        return Err(Error::DegenerateTraining {
            classes: classes.len(),
        });
    }

    let y: Vec<usize> = labels
        .iter()
        .map(|l| classes.iter().position(|c| c == l).unwrap_or(0))
        .collect();

    let n_features = predictors.len();
    let tree_params = TreeParams {
        max_depth: params.max_depth,
        min_samples_split: params.min_samples_split,
        features_per_split: params
            .features_per_split
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features),
    };
    let n_samples = x.len();

    debug!(
        "Training {} trees on {} samples, {} predictors, {} classes",
        params.n_trees,
        n_samples,
        n_features,
        classes.len()
    );

    let trees: Vec<DecisionTree> = tree_seeds(params.seed, params.n_trees)
        .into_par_iter()
        .map(|tree_seed| {
            let mut rng = StdRng::seed_from_u64(tree_seed);
            let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            DecisionTree::fit(&x, &y, classes.len(), &bootstrap, &tree_params, &mut rng)
        })
        .collect();

    Ok(RandomForest {
        predictors: predictors.to_vec(),
        classes,
        trees,
    })
}

/// Per-tree seeds drawn from a generator seeded with the model seed.
///
/// Drawn up front so results do not depend on scheduling.
fn tree_seeds(seed: u64, n_trees: usize) -> Vec<u64> {
    let mut seeder = StdRng::seed_from_u64(seed);
    (0..n_trees).map(|_| seeder.gen()).collect()
}
