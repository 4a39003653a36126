//! CART decision tree (Gini impurity) used as the forest's base learner

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Splits must lower impurity by more than this
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0). `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Predictors drawn at random for each split
    pub features_per_split: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        class: usize,
    },
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted classification tree over class indices `0..n_classes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

/// Borrowed training table: `x[i]` holds the predictors of sample `i`,
/// `y[i]` its class index
struct Training<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent class; ties go to the lowest class index
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

impl DecisionTree {
    /// Grow a tree on the samples listed in `samples` (indices into `x`/`y`,
    /// repeats allowed for bootstrap draws).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        samples: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let data = Training { x, y, n_classes };
        let mut samples = samples.to_vec();
        let root = Self::grow(&data, &mut samples, 0, params, rng);
        Self { root }
    }

    fn grow(
        data: &Training<'_>,
        samples: &mut [usize],
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Node {
        let mut counts = vec![0usize; data.n_classes];
        for &i in samples.iter() {
            counts[data.y[i]] += 1;
        }
        let leaf = Node::Leaf {
            class: majority(&counts),
        };

        let impurity = gini(&counts, samples.len());
        if impurity == 0.0
            || samples.len() < params.min_samples_split.max(2)
            || params.max_depth.is_some_and(|d| depth >= d)
        {
            return leaf;
        }

        let best = match Self::best_split(data, samples, params.features_per_split, rng) {
            Some(b) if b.impurity < impurity - MIN_IMPURITY_DECREASE => b,
            _ => return leaf,
        };

        // Partition in place: left block first
        let mut mid = 0;
        for i in 0..samples.len() {
            if data.x[samples[i]][best.feature] <= best.threshold {
                samples.swap(i, mid);
                mid += 1;
            }
        }
        let (left, right) = samples.split_at_mut(mid);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(Self::grow(data, left, depth + 1, params, rng)),
            right: Box::new(Self::grow(data, right, depth + 1, params, rng)),
        }
    }

    /// Lowest weighted Gini over a random subset of predictors, thresholds at
    /// midpoints between consecutive distinct values
    fn best_split(
        data: &Training<'_>,
        samples: &[usize],
        features_per_split: usize,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n_features = data.x.get(samples[0]).map_or(0, Vec::len);
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);
        features.truncate(features_per_split.clamp(1, n_features.max(1)));
        // Fixed evaluation order so ties resolve the same way for a given draw
        features.sort_unstable();

        let total = samples.len();
        let mut best: Option<BestSplit> = None;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(total);

        for feature in features {
            column.clear();
            column.extend(samples.iter().map(|&i| (data.x[i][feature], data.y[i])));
            column.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut right = vec![0usize; data.n_classes];
            for &(_, class) in &column {
                right[class] += 1;
            }
            let mut left = vec![0usize; data.n_classes];

            for i in 0..total - 1 {
                let (value, class) = column[i];
                left[class] += 1;
                right[class] -= 1;

                let next = column[i + 1].0;
                if next <= value {
                    continue;
                }

                let n_left = i + 1;
                let n_right = total - n_left;
                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / total as f64;

                if best.as_ref().map_or(true, |b| weighted < b.impurity) {
                    best = Some(BestSplit {
                        feature,
                        threshold: value + (next - value) / 2.0,
                        impurity: weighted,
                    });
                }
            }
        }

        best
    }

    /// Class index for one predictor vector
    pub fn predict(&self, x: &[f64]) -> usize {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Whether every split and leaf stays within `n_features` / `n_classes`
    pub fn fits(&self, n_features: usize, n_classes: usize) -> bool {
        fn walk(node: &Node, n_features: usize, n_classes: usize) -> bool {
            match node {
                Node::Leaf { class } => *class < n_classes,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < n_features
                        && walk(left, n_features, n_classes)
                        && walk(right, n_features, n_classes)
                }
            }
        }
        walk(&self.root, n_features, n_classes)
    }

    /// Longest root-to-leaf path
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}
