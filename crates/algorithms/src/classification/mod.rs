//! Supervised classification
//!
//! A random forest of CART trees is trained on sampled feature vectors and
//! applied pixel by pixel to the composite rasters:
//! - [`train`]: bootstrap-aggregated trees, `ceil(sqrt(p))` predictors per split
//! - [`classify`]: majority vote per pixel plus a vote-share confidence raster

mod classify;
mod forest;
mod tree;

pub use classify::{classify, ClassEntry, ClassificationRaster};
pub use forest::{train, ForestParams, RandomForest};
pub use tree::{DecisionTree, Node, TreeParams};
