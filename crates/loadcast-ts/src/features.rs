//! Feature construction on the hourly grid.
//!
//! Derives lag, trailing-rolling, and calendar/cyclic columns from a
//! normalized [`HourlyGrid`], then trims the head rows that lack full lag
//! history so the table has a deterministic shape. Missing values inside the
//! table are `f64::NAN`; [`FeatureTable::feature_matrix`] normalizes them to
//! zero when handing data to an estimator.

use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::warn;

use loadcast_core::{HourlyGrid, LoadcastError, PipelineConfig};

/// Prefix of lag feature columns (`target_lag_{k}`).
pub const LAG_PREFIX: &str = "target_lag_";

/// A feature table: one row per grid hour (after head trimming), column-major
/// storage, and the exact feature column order the estimator trains on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    timestamps: Vec<DateTime<Utc>>,
    target: Vec<f64>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    lags: Vec<usize>,
}

impl FeatureTable {
    /// Assemble a table from parts, checking the shape invariants.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        target: Vec<f64>,
        names: Vec<String>,
        columns: Vec<Vec<f64>>,
        lags: Vec<usize>,
    ) -> Result<Self, LoadcastError> {
        if names.len() != columns.len() {
            return Err(LoadcastError::Validation(format!(
                "feature table has {} names but {} columns",
                names.len(),
                columns.len()
            )));
        }
        if target.len() != timestamps.len() {
            return Err(LoadcastError::Validation(
                "target length does not match timestamps".into(),
            ));
        }
        if let Some(bad) = columns.iter().position(|c| c.len() != timestamps.len()) {
            return Err(LoadcastError::Validation(format!(
                "column '{}' length does not match timestamps",
                names[bad]
            )));
        }
        Ok(Self {
            timestamps,
            target,
            names,
            columns,
            lags,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Feature column names in training order.
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// The lag set that survived trimming, ascending.
    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// One row's feature values in column order, NaN preserved.
    pub fn row(&self, idx: usize) -> Vec<f64> {
        self.columns.iter().map(|col| col[idx]).collect()
    }

    /// Row-major feature matrix with NaN normalized to zero, ready for an
    /// estimator.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        (0..self.len())
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| {
                        let v = col[row];
                        if v.is_finite() {
                            v
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Select a subset of rows, preserving order.
    pub fn take(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| indices.iter().map(|&i| col[i]).collect())
                .collect(),
            lags: self.lags.clone(),
        }
    }
}

/// Extract ascending lag offsets from feature column names (`target_lag_{k}`).
///
/// Used when a table is rebuilt from a file and the trim outcome is no longer
/// attached.
pub fn lag_offsets_from_names<S: AsRef<str>>(names: &[S]) -> Vec<usize> {
    let mut lags: Vec<usize> = names
        .iter()
        .filter_map(|name| name.as_ref().strip_prefix(LAG_PREFIX))
        .filter_map(|suffix| suffix.parse::<usize>().ok())
        .collect();
    lags.sort_unstable();
    lags.dedup();
    lags
}

/// Build the feature table for a normalized grid.
///
/// Lag trimming drops the largest requested lag while
/// `n_rows - max(remaining) < min_train_rows`, falling back to `{1, 24}`
/// (filtered to offsets shorter than the grid) when the requested set is
/// exhausted. The trade-off is explicit: short series lose long-range lag
/// signal instead of failing. Every adjustment is logged and visible through
/// [`FeatureTable::lags`].
pub fn build_features(
    grid: &HourlyGrid,
    cfg: &PipelineConfig,
) -> Result<FeatureTable, LoadcastError> {
    let n_rows = grid.len();
    if n_rows == 0 {
        return Err(LoadcastError::InsufficientData(
            "hourly grid has zero rows".into(),
        ));
    }

    let values: Vec<f64> = grid
        .values()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    let timestamps = grid.timestamps();

    let lags = trim_lags(&cfg.lags, n_rows, cfg.min_train_rows);
    let mut windows: Vec<usize> = cfg.windows.clone();
    windows.sort_unstable();
    windows.dedup();

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for &k in &lags {
        names.push(format!("{LAG_PREFIX}{k}"));
        columns.push(lag_column(&values, k));
    }

    for &w in &windows {
        let (mean, std, median) = rolling_stats(&values, w);
        names.push(format!("target_roll_mean_{w}"));
        columns.push(mean);
        names.push(format!("target_roll_std_{w}"));
        columns.push(std);
        names.push(format!("target_roll_med_{w}"));
        columns.push(median);
    }

    for (name, column) in calendar_columns(&timestamps) {
        names.push(name);
        columns.push(column);
    }

    // Deterministic head trim: the first max(lag) rows go, not whichever rows
    // happen to hold nulls.
    let trim = lags.last().copied().unwrap_or(0);
    let trimmed_columns: Vec<Vec<f64>> = columns
        .into_iter()
        .map(|col| col[trim..].to_vec())
        .collect();

    FeatureTable::new(
        timestamps[trim..].to_vec(),
        values[trim..].to_vec(),
        names,
        trimmed_columns,
        lags,
    )
}

fn trim_lags(requested: &[usize], n_rows: usize, min_train_rows: usize) -> Vec<usize> {
    let mut lags: Vec<usize> = requested.to_vec();
    lags.sort_unstable();
    lags.dedup();

    while let Some(&max_lag) = lags.last() {
        if n_rows as i64 - max_lag as i64 >= min_train_rows as i64 {
            break;
        }
        warn!(
            lag = max_lag,
            n_rows, min_train_rows, "dropping largest lag to satisfy min_train_rows"
        );
        lags.pop();
    }

    if lags.is_empty() {
        let fallback: Vec<usize> = [1usize, 24]
            .into_iter()
            .filter(|&k| k < n_rows)
            .collect();
        warn!(
            ?fallback,
            "requested lag set exhausted; using minimal default lags"
        );
        return fallback;
    }
    lags
}

fn lag_column(values: &[f64], k: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| if t >= k { values[t - k] } else { f64::NAN })
        .collect()
}

/// Trailing rolling mean/std/median with `min_periods = 1`: a partial window
/// at the head of the series is computed over however many finite values are
/// available. The sample std of a single value is defined as 0, not missing.
fn rolling_stats(values: &[f64], w: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut means = Vec::with_capacity(n);
    let mut stds = Vec::with_capacity(n);
    let mut medians = Vec::with_capacity(n);

    for t in 0..n {
        let lo = (t + 1).saturating_sub(w);
        let window: Vec<f64> = values[lo..=t].iter().copied().filter(|v| v.is_finite()).collect();
        if window.is_empty() {
            means.push(f64::NAN);
            stds.push(f64::NAN);
            medians.push(f64::NAN);
            continue;
        }
        let count = window.len() as f64;
        let mean = window.iter().sum::<f64>() / count;
        means.push(mean);
        if window.len() < 2 {
            stds.push(0.0);
        } else {
            let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
            stds.push(var.sqrt());
        }
        medians.push(median(window));
    }

    (means, stds, medians)
}

fn median(mut window: Vec<f64>) -> f64 {
    window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = window.len() / 2;
    if window.len() % 2 == 0 {
        (window[mid - 1] + window[mid]) / 2.0
    } else {
        window[mid]
    }
}

fn calendar_columns(timestamps: &[DateTime<Utc>]) -> Vec<(String, Vec<f64>)> {
    let n = timestamps.len();
    let mut hour = Vec::with_capacity(n);
    let mut dayofweek = Vec::with_capacity(n);
    let mut month = Vec::with_capacity(n);
    let mut dayofyear = Vec::with_capacity(n);
    let mut is_weekend = Vec::with_capacity(n);
    let mut hour_sin = Vec::with_capacity(n);
    let mut hour_cos = Vec::with_capacity(n);

    for ts in timestamps {
        let h = ts.hour() as f64;
        let dow = ts.weekday().num_days_from_monday() as f64;
        hour.push(h);
        dayofweek.push(dow);
        month.push(ts.month() as f64);
        dayofyear.push(ts.ordinal() as f64);
        is_weekend.push(if dow >= 5.0 { 1.0 } else { 0.0 });
        let angle = 2.0 * std::f64::consts::PI * h / 24.0;
        hour_sin.push(angle.sin());
        hour_cos.push(angle.cos());
    }

    vec![
        ("hour".to_string(), hour),
        ("dayofweek".to_string(), dayofweek),
        ("month".to_string(), month),
        ("dayofyear".to_string(), dayofyear),
        ("is_weekend".to_string(), is_weekend),
        ("hour_sin".to_string(), hour_sin),
        ("hour_cos".to_string(), hour_cos),
    ]
}
