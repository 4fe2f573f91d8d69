//! Pipeline configuration.
//!
//! Every knob the pipeline honors lives here and is validated once at
//! construction. There is no ambient module state: directories, tokens, and
//! feature parameters are all passed in explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadcastError;

/// Gap-fill policy applied when reindexing a series onto the hourly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    /// Carry the last known value forward; leading gaps stay unfilled.
    Forward,
    /// Carry the next known value backward; trailing gaps stay unfilled.
    Backward,
    /// Linear interpolation between known values, extended at both boundaries
    /// with the nearest available value.
    Interpolate,
    /// Leave gaps as explicit missing markers, propagated downstream.
    None,
}

impl FromStr for FillPolicy {
    type Err = LoadcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "ffill" => Ok(FillPolicy::Forward),
            "backward" | "bfill" => Ok(FillPolicy::Backward),
            "interpolate" => Ok(FillPolicy::Interpolate),
            "none" => Ok(FillPolicy::None),
            other => Err(LoadcastError::Config(format!(
                "unknown fill policy '{other}'; use forward, backward, interpolate, or none"
            ))),
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillPolicy::Forward => "forward",
            FillPolicy::Backward => "backward",
            FillPolicy::Interpolate => "interpolate",
            FillPolicy::None => "none",
        };
        f.write_str(name)
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Lag offsets in hours for `target_lag_{k}` columns.
    #[serde(default = "default_lags")]
    pub lags: Vec<usize>,
    /// Trailing-window sizes in hours for rolling mean/std/median columns.
    #[serde(default = "default_windows")]
    pub windows: Vec<usize>,
    #[serde(default = "default_fill")]
    pub fill: FillPolicy,
    /// Number of future hours to forecast.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Minimum rows that must remain for training after lag trimming.
    #[serde(default = "default_min_train_rows")]
    pub min_train_rows: usize,
    /// Hours reserved at the end of the series for validation.
    #[serde(default = "default_val_hours")]
    pub val_hours: i64,
}

fn default_lags() -> Vec<usize> {
    vec![1, 2, 3, 24, 168]
}

fn default_windows() -> Vec<usize> {
    vec![3, 24]
}

fn default_fill() -> FillPolicy {
    FillPolicy::Forward
}

fn default_horizon() -> usize {
    6
}

fn default_min_train_rows() -> usize {
    48
}

fn default_val_hours() -> i64 {
    24 * 7
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lags: default_lags(),
            windows: default_windows(),
            fill: default_fill(),
            horizon: default_horizon(),
            min_train_rows: default_min_train_rows(),
            val_hours: default_val_hours(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration once, before any data is touched.
    pub fn validate(&self) -> Result<(), LoadcastError> {
        if self.lags.is_empty() {
            return Err(LoadcastError::Config("lag set must not be empty".into()));
        }
        if self.lags.contains(&0) {
            return Err(LoadcastError::Config("lag offsets must be >= 1 hour".into()));
        }
        if self.windows.contains(&0) {
            return Err(LoadcastError::Config(
                "rolling windows must be >= 1 hour".into(),
            ));
        }
        if self.horizon == 0 {
            return Err(LoadcastError::Config("horizon must be >= 1".into()));
        }
        if self.min_train_rows == 0 {
            return Err(LoadcastError::Config("min_train_rows must be >= 1".into()));
        }
        if self.val_hours < 0 {
            return Err(LoadcastError::Config("val_hours must be >= 0".into()));
        }
        Ok(())
    }
}
