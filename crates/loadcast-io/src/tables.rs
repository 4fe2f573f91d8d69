//! Typed conversions between pipeline structs and DataFrames.
//!
//! On disk, timestamps are RFC 3339 UTC strings and missing values are
//! nulls. Readers also accept epoch-second integer timestamp columns so
//! externally produced files can be ingested without a rewrite step.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use tracing::warn;

use loadcast_core::{HourlyGrid, HourlyPoint, Observation};
use loadcast_model::ForecastPoint;
use loadcast_ts::FeatureTable;

pub const DATETIME_COLUMN: &str = "datetime";
pub const TARGET_COLUMN: &str = "target";
pub const PREDICTION_COLUMN: &str = "prediction";

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Extract the datetime column as UTC timestamps.
///
/// Accepts a utf8 column of RFC 3339 strings or an integer column of epoch
/// seconds. Unparseable entries come back as `None`.
fn column_datetime(df: &DataFrame) -> Result<Vec<Option<DateTime<Utc>>>> {
    let series = df
        .column(DATETIME_COLUMN)
        .with_context(|| format!("frame is missing a '{}' column", DATETIME_COLUMN))?;
    if let Ok(chunked) = series.utf8() {
        return Ok(chunked
            .into_iter()
            .map(|opt| {
                opt.and_then(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .map(|dt| dt.with_timezone(&Utc))
                        .ok()
                })
            })
            .collect());
    }
    let casted = series
        .cast(&DataType::Int64)
        .context("casting datetime column to Int64")?;
    Ok(casted
        .i64()?
        .into_iter()
        .map(|opt| opt.and_then(|secs| DateTime::from_timestamp(secs, 0)))
        .collect())
}

fn column_f64(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(column)
        .with_context(|| format!("frame is missing a '{}' column", column))?;
    let casted = series
        .cast(&DataType::Float64)
        .with_context(|| format!("casting column '{}' to Float64", column))?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Build a raw-series frame: RFC 3339 datetimes plus observed targets.
pub fn series_to_frame(series: &[Observation]) -> Result<DataFrame> {
    let datetimes: Vec<String> = series.iter().map(|obs| rfc3339(&obs.timestamp)).collect();
    let values: Vec<f64> = series.iter().map(|obs| obs.value).collect();
    DataFrame::new(vec![
        Series::new(DATETIME_COLUMN, datetimes),
        Series::new(TARGET_COLUMN, values),
    ])
    .context("building raw series frame")
}

/// Parse a raw-series frame back into observations, sorted ascending.
///
/// Rows with an unparseable timestamp or a null target are dropped with a
/// warning; they carry no usable signal.
pub fn frame_to_series(df: &DataFrame) -> Result<Vec<Observation>> {
    let timestamps = column_datetime(df)?;
    let values = column_f64(df, TARGET_COLUMN)?;
    let mut out = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;
    for (ts, value) in timestamps.into_iter().zip(values.into_iter()) {
        match (ts, value) {
            (Some(timestamp), Some(value)) if value.is_finite() => {
                out.push(Observation { timestamp, value })
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "dropped rows with unparseable timestamp or missing target");
    }
    if out.is_empty() {
        return Err(anyhow!("frame contains no usable observations"));
    }
    out.sort_by_key(|obs| obs.timestamp);
    Ok(out)
}

/// Build an hourly-grid frame; unfilled points become nulls.
pub fn grid_to_frame(grid: &HourlyGrid) -> Result<DataFrame> {
    let datetimes: Vec<String> = grid.points().iter().map(|p| rfc3339(&p.timestamp)).collect();
    let values: Vec<Option<f64>> = grid.points().iter().map(|p| p.value).collect();
    DataFrame::new(vec![
        Series::new(DATETIME_COLUMN, datetimes),
        Series::new(TARGET_COLUMN, values),
    ])
    .context("building hourly grid frame")
}

/// Parse an hourly-grid frame. Timestamps must all parse; values may be null.
pub fn frame_to_grid(df: &DataFrame) -> Result<HourlyGrid> {
    let timestamps = column_datetime(df)?;
    let values = column_f64(df, TARGET_COLUMN)?;
    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, value) in timestamps.into_iter().zip(values.into_iter()) {
        let timestamp = ts.ok_or_else(|| anyhow!("hourly grid has an unparseable timestamp"))?;
        points.push(HourlyPoint {
            timestamp,
            value: value.filter(|v| v.is_finite()),
        });
    }
    Ok(HourlyGrid::from_points(points))
}

/// Build a feature-table frame: datetime, target, then feature columns in
/// table order. Non-finite values become nulls.
pub fn features_to_frame(table: &FeatureTable) -> Result<DataFrame> {
    let datetimes: Vec<String> = table.timestamps().iter().map(rfc3339).collect();
    let targets: Vec<Option<f64>> = table
        .target()
        .iter()
        .map(|&v| if v.is_finite() { Some(v) } else { None })
        .collect();
    let mut columns = vec![
        Series::new(DATETIME_COLUMN, datetimes),
        Series::new(TARGET_COLUMN, targets),
    ];
    for name in table.feature_names() {
        let values: Vec<Option<f64>> = table
            .column(name)
            .ok_or_else(|| anyhow!("feature table lost column '{}'", name))?
            .iter()
            .map(|&v| if v.is_finite() { Some(v) } else { None })
            .collect();
        columns.push(Series::new(name, values));
    }
    DataFrame::new(columns).context("building feature frame")
}

/// Parse a feature frame. Every column other than datetime and target is a
/// feature, in file order; nulls come back as NaN.
pub fn frame_to_features(df: &DataFrame) -> Result<FeatureTable> {
    let raw_timestamps = column_datetime(df)?;
    let mut timestamps = Vec::with_capacity(raw_timestamps.len());
    for ts in raw_timestamps {
        timestamps.push(ts.ok_or_else(|| anyhow!("feature frame has an unparseable timestamp"))?);
    }
    let target: Vec<f64> = column_f64(df, TARGET_COLUMN)?
        .into_iter()
        .map(|opt| opt.unwrap_or(f64::NAN))
        .collect();

    let mut names = Vec::new();
    let mut columns = Vec::new();
    for column in df.get_column_names() {
        if column == DATETIME_COLUMN || column == TARGET_COLUMN {
            continue;
        }
        let values: Vec<f64> = column_f64(df, column)?
            .into_iter()
            .map(|opt| opt.unwrap_or(f64::NAN))
            .collect();
        names.push(column.to_string());
        columns.push(values);
    }
    let lags = loadcast_ts::lag_offsets_from_names(&names);
    FeatureTable::new(timestamps, target, names, columns, lags).map_err(Into::into)
}

/// Build a predictions frame: forecast datetimes, an all-null target column
/// and the predicted values.
pub fn forecast_to_frame(points: &[ForecastPoint]) -> Result<DataFrame> {
    let datetimes: Vec<String> = points.iter().map(|p| rfc3339(&p.datetime)).collect();
    let targets: Vec<Option<f64>> = vec![None; points.len()];
    let predictions: Vec<f64> = points.iter().map(|p| p.prediction).collect();
    DataFrame::new(vec![
        Series::new(DATETIME_COLUMN, datetimes),
        Series::new(TARGET_COLUMN, targets),
        Series::new(PREDICTION_COLUMN, predictions),
    ])
    .context("building predictions frame")
}
