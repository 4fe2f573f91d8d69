//! Bagged regression trees.
//!
//! The concrete [`Estimator`] adapter: bootstrap-sampled variance-reduction
//! trees aggregated by mean. Deterministic for a fixed seed, which keeps
//! pipeline runs reproducible.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use loadcast_core::{LoadcastError, LoadcastResult};

use crate::estimator::Estimator;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict_row(row)
                } else {
                    right.predict_row(row)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressionTree {
    root: Option<TreeNode>,
}

struct TreeParams {
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
}

impl RegressionTree {
    fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let root = build_node(x, y, indices, 0, params, rng);
        Self { root: Some(root) }
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        match &self.root {
            Some(root) => root.predict_row(row),
            None => 0.0,
        }
    }
}

fn mean(y: &[f64], indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn build_node(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    depth: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> TreeNode {
    let n = indices.len();
    let leaf_value = mean(y, indices);

    let is_pure = indices.iter().all(|&i| (y[i] - leaf_value).abs() < 1e-12);
    if n < params.min_samples_split || depth >= params.max_depth || is_pure {
        return TreeNode::Leaf { value: leaf_value };
    }

    let n_features = x[0].len();
    let k = params.max_features.min(n_features).max(1);
    let candidates = index::sample(rng, n_features, k);

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, sse)
    for feature in candidates {
        if let Some((threshold, sse)) = best_split_on_feature(x, y, indices, feature, params) {
            if best.map_or(true, |(_, _, best_sse)| sse < best_sse) {
                best = Some((feature, threshold, sse));
            }
        }
    }

    let Some((feature, threshold, _)) = best else {
        return TreeNode::Leaf { value: leaf_value };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);
    if left_idx.is_empty() || right_idx.is_empty() {
        return TreeNode::Leaf { value: leaf_value };
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(build_node(x, y, &left_idx, depth + 1, params, rng)),
        right: Box::new(build_node(x, y, &right_idx, depth + 1, params, rng)),
    }
}

/// Scan sorted thresholds for one feature and return the split minimizing the
/// summed squared error of both sides, honoring `min_samples_leaf`.
fn best_split_on_feature(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    feature: usize,
    params: &TreeParams,
) -> Option<(f64, f64)> {
    let n = indices.len();
    let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (x[i][feature], y[i])).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_sum: f64 = pairs.iter().map(|(_, yi)| yi).sum();
    let total_sq: f64 = pairs.iter().map(|(_, yi)| yi * yi).sum();

    let mut left_sum = 0.0;
    let mut left_sq = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for i in 1..n {
        left_sum += pairs[i - 1].1;
        left_sq += pairs[i - 1].1 * pairs[i - 1].1;

        if pairs[i - 1].0 == pairs[i].0 {
            continue;
        }
        if i < params.min_samples_leaf || n - i < params.min_samples_leaf {
            continue;
        }

        let right_sum = total_sum - left_sum;
        let right_sq = total_sq - left_sq;
        let left_n = i as f64;
        let right_n = (n - i) as f64;
        let sse = (left_sq - left_sum * left_sum / left_n)
            + (right_sq - right_sum * right_sum / right_n);

        if best.map_or(true, |(_, best_sse)| sse < best_sse) {
            let threshold = (pairs[i - 1].0 + pairs[i].0) / 2.0;
            best = Some((threshold, sse));
        }
    }
    best
}

/// Bagged-tree regressor with builder-style configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaggedTreeRegressor {
    trees: Vec<RegressionTree>,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    n_features: usize,
}

impl Default for BaggedTreeRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl BaggedTreeRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

impl Estimator for BaggedTreeRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> LoadcastResult<()> {
        if x.is_empty() {
            return Err(LoadcastError::InsufficientData(
                "no training rows".into(),
            ));
        }
        if x.len() != y.len() {
            return Err(LoadcastError::Validation(format!(
                "feature matrix has {} rows but target has {}",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 {
            return Err(LoadcastError::Validation("no feature columns".into()));
        }
        if let Some(bad) = x.iter().find(|row| row.len() != n_features) {
            return Err(LoadcastError::Validation(format!(
                "ragged feature matrix: expected {} columns, found {}",
                n_features,
                bad.len()
            )));
        }
        self.n_features = n_features;

        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: ((n_features as f64).sqrt().ceil() as usize).max(1),
        };

        let n_samples = x.len();
        let mut trees = Vec::with_capacity(self.n_estimators);
        for tree_idx in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
            let sample: Vec<usize> = (0..n_samples)
                .map(|_| rng.gen_range(0..n_samples))
                .collect();
            trees.push(RegressionTree::fit(x, y, &sample, &params, &mut rng));
        }
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> LoadcastResult<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(LoadcastError::Validation(
                "estimator has not been fitted".into(),
            ));
        }
        let mut preds = Vec::with_capacity(x.len());
        for row in x {
            if row.len() != self.n_features {
                return Err(LoadcastError::Validation(format!(
                    "expected {} features, got {}",
                    self.n_features,
                    row.len()
                )));
            }
            let sum: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
            preds.push(sum / self.trees.len() as f64);
        }
        Ok(preds)
    }
}
