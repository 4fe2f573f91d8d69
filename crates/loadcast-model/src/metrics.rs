//! Model evaluation.

use tracing::{info, warn};

use loadcast_core::{LoadcastError, LoadcastResult};
use loadcast_ts::FeatureTable;

use crate::estimator::Estimator;

/// Mean absolute error between two equal-length vectors.
pub fn mean_absolute_error(truth: &[f64], preds: &[f64]) -> LoadcastResult<f64> {
    if truth.len() != preds.len() {
        return Err(LoadcastError::Validation(format!(
            "truth has {} values but predictions have {}",
            truth.len(),
            preds.len()
        )));
    }
    if truth.is_empty() {
        return Err(LoadcastError::Validation(
            "cannot compute MAE over zero samples".into(),
        ));
    }
    let sum: f64 = truth
        .iter()
        .zip(preds.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    Ok(sum / truth.len() as f64)
}

/// Evaluate an estimator on a validation table, returning the MAE.
///
/// An empty table is the degenerate-split case: it is logged and yields
/// `None` rather than an error, and the pipeline continues without an
/// evaluation figure. Rows with a missing target are skipped.
pub fn evaluate<E: Estimator>(
    estimator: &E,
    table: &FeatureTable,
) -> LoadcastResult<Option<f64>> {
    if table.is_empty() {
        warn!("empty evaluation table; skipping evaluation");
        return Ok(None);
    }

    let matrix = table.feature_matrix();
    let mut x: Vec<Vec<f64>> = Vec::new();
    let mut truth: Vec<f64> = Vec::new();
    for (row, &t) in matrix.into_iter().zip(table.target().iter()) {
        if t.is_finite() {
            x.push(row);
            truth.push(t);
        }
    }
    if truth.is_empty() {
        warn!("evaluation table has no rows with an observed target");
        return Ok(None);
    }

    let preds = estimator.predict(&x)?;
    let mae = mean_absolute_error(&truth, &preds)?;
    info!(mae, samples = truth.len(), "evaluation complete");
    Ok(Some(mae))
}
