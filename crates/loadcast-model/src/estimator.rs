//! The estimator capability boundary.

use tracing::{info, warn};

use loadcast_core::LoadcastResult;
use loadcast_ts::FeatureTable;

/// A pluggable regression capability: fit on a row-major feature matrix,
/// predict a float per row. Implementations must accept a single-row matrix,
/// since the recursive forecaster predicts one step at a time.
pub trait Estimator {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> LoadcastResult<()>;
    fn predict(&self, x: &[Vec<f64>]) -> LoadcastResult<Vec<f64>>;
}

/// Fit an estimator on a feature table.
///
/// Missing engineered values are normalized to zero; rows whose target is
/// missing (possible under the `none` fill policy) cannot supervise anything
/// and are excluded with a warning.
pub fn train_estimator<E: Estimator>(estimator: &mut E, table: &FeatureTable) -> LoadcastResult<()> {
    let matrix = table.feature_matrix();
    let target = table.target();

    let mut x: Vec<Vec<f64>> = Vec::with_capacity(matrix.len());
    let mut y: Vec<f64> = Vec::with_capacity(matrix.len());
    for (row, &t) in matrix.into_iter().zip(target.iter()) {
        if t.is_finite() {
            x.push(row);
            y.push(t);
        }
    }
    let skipped = table.len() - y.len();
    if skipped > 0 {
        warn!(skipped, "rows with missing target excluded from training");
    }

    info!(
        rows = y.len(),
        features = table.feature_names().len(),
        "training estimator"
    );
    estimator.fit(&x, &y)
}
