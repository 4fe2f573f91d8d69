//! Recursive multi-step forecasting.
//!
//! A bounded, synchronous state machine: the anchor feature row is copied into
//! working memory and advanced one hour per step, feeding each step's
//! prediction back into the smallest lag slot. The machine owns its working
//! copy for the duration of one run; nothing is shared across runs.
//!
//! Two behaviors are intentional and preserved from the system this replaces:
//!
//! * The lag cascade shifts values by *position* in the sorted offset list,
//!   not by true hour distance. With offsets `{1, 24, 168}` the value moving
//!   into `target_lag_24` is the previous `target_lag_1`, which is an
//!   approximation rather than a real 24-hour-old value.
//! * Only `hour` (and its sin/cos encoding) advances per step; day-of-week,
//!   month, day-of-year, and the weekend flag stay frozen at their anchor
//!   values across the whole horizon.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use loadcast_core::{floor_to_hour, LoadcastError, LoadcastResult};
use loadcast_ts::features::lag_offsets_from_names;
use loadcast_ts::{FeatureTable, LAG_PREFIX};

use crate::estimator::Estimator;

/// Snapshot of the feature situation at the last observed timestamp `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorRow {
    /// The raw last-observed timestamp (not floored); forecast labels are
    /// relative to it.
    pub timestamp: DateTime<Utc>,
    names: Vec<String>,
    values: Vec<f64>,
}

impl AnchorRow {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }
}

/// One forecast output row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub step: usize,
    /// `anchor timestamp + step hours`.
    pub datetime: DateTime<Utc>,
    pub prediction: f64,
}

/// Build the anchor row for a forecast run.
///
/// `last_observed` is the maximum raw-series timestamp. The anchor is the
/// feature row at `floor_to_hour(last_observed)`; when the table has no row at
/// that hour (stale data), the most recent row stands in, and the anchor's
/// calendar features may then lag the true last observed hour. Feature names
/// the table does not carry enter the anchor as NaN and are zero-filled at
/// prediction time; they are never recomputed.
pub fn build_anchor(
    last_observed: DateTime<Utc>,
    table: &FeatureTable,
    feature_names: &[String],
) -> LoadcastResult<AnchorRow> {
    if table.is_empty() {
        return Err(LoadcastError::InsufficientData(
            "feature table has no rows to anchor a forecast".into(),
        ));
    }

    let last_complete = floor_to_hour(last_observed);
    let row_idx = match table
        .timestamps()
        .iter()
        .position(|ts| *ts == last_complete)
    {
        Some(idx) => idx,
        None => {
            warn!(
                %last_complete,
                "no feature row at the last complete hour; anchoring on the latest row"
            );
            (0..table.len())
                .max_by_key(|&i| table.timestamps()[i])
                .expect("non-empty table")
        }
    };

    let values = feature_names
        .iter()
        .map(|name| {
            table
                .column(name)
                .map(|col| col[row_idx])
                .unwrap_or(f64::NAN)
        })
        .collect();

    Ok(AnchorRow {
        timestamp: last_observed,
        names: feature_names.to_vec(),
        values,
    })
}

/// Run the forecast state machine for exactly `horizon` transitions.
///
/// Each step assembles the working row in training column order (NaN
/// normalized to zero), predicts one value, cascades the lag slots, advances
/// the cyclic hour, and records the prediction. An estimator failure aborts
/// the whole run with a [`LoadcastError::Forecast`]; no partial output is
/// returned.
pub fn recursive_forecast<E: Estimator>(
    estimator: &E,
    anchor: &AnchorRow,
    horizon: usize,
) -> LoadcastResult<Vec<ForecastPoint>> {
    let mut cur = anchor.values.clone();
    let names = &anchor.names;

    // Sorted lag offsets paired with their column positions.
    let lag_offsets = lag_offsets_from_names(names);
    let lag_slots: Vec<(usize, usize)> = lag_offsets
        .iter()
        .filter_map(|&k| {
            names
                .iter()
                .position(|n| n == &format!("{LAG_PREFIX}{k}"))
                .map(|idx| (k, idx))
        })
        .collect();

    let hour_idx = names.iter().position(|n| n == "hour");
    let hour_sin_idx = names.iter().position(|n| n == "hour_sin");
    let hour_cos_idx = names.iter().position(|n| n == "hour_cos");

    let mut output = Vec::with_capacity(horizon);
    for step in 1..=horizon {
        let row: Vec<f64> = cur
            .iter()
            .map(|&v| if v.is_finite() { v } else { 0.0 })
            .collect();
        let preds = estimator
            .predict(&[row])
            .map_err(|err| LoadcastError::Forecast(err.to_string()))?;
        let Some(&prediction) = preds.first() else {
            return Err(LoadcastError::Forecast(
                "estimator returned no prediction for a single-row input".into(),
            ));
        };

        // Positional lag cascade: walking largest to smallest, every slot
        // takes the previous value of the next-smaller offset, and the
        // smallest takes the fresh prediction.
        if !lag_slots.is_empty() {
            let previous: Vec<f64> = lag_slots.iter().map(|&(_, idx)| cur[idx]).collect();
            for j in (1..lag_slots.len()).rev() {
                cur[lag_slots[j].1] = previous[j - 1];
            }
            cur[lag_slots[0].1] = prediction;
        }

        // Advance the cyclic hour only; other calendar fields stay frozen.
        if let Some(idx) = hour_idx {
            let hour = ((cur[idx] as i64) + 1).rem_euclid(24) as f64;
            cur[idx] = hour;
            let angle = 2.0 * std::f64::consts::PI * hour / 24.0;
            if let Some(sin_idx) = hour_sin_idx {
                cur[sin_idx] = angle.sin();
            }
            if let Some(cos_idx) = hour_cos_idx {
                cur[cos_idx] = angle.cos();
            }
        }

        output.push(ForecastPoint {
            step,
            datetime: anchor.timestamp + Duration::hours(step as i64),
            prediction,
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::TimeZone;
    use loadcast_core::LoadcastResult;

    struct ConstantEstimator(f64);

    impl Estimator for ConstantEstimator {
        fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> LoadcastResult<()> {
            Ok(())
        }

        fn predict(&self, x: &[Vec<f64>]) -> LoadcastResult<Vec<f64>> {
            Ok(vec![self.0; x.len()])
        }
    }

    /// Records every feature vector it is asked to score.
    struct RecordingEstimator {
        constant: f64,
        seen: RefCell<Vec<Vec<f64>>>,
    }

    impl RecordingEstimator {
        fn new(constant: f64) -> Self {
            Self {
                constant,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Estimator for RecordingEstimator {
        fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> LoadcastResult<()> {
            Ok(())
        }

        fn predict(&self, x: &[Vec<f64>]) -> LoadcastResult<Vec<f64>> {
            self.seen.borrow_mut().extend(x.iter().cloned());
            Ok(vec![self.constant; x.len()])
        }
    }

    struct FailingEstimator;

    impl Estimator for FailingEstimator {
        fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> LoadcastResult<()> {
            Ok(())
        }

        fn predict(&self, _x: &[Vec<f64>]) -> LoadcastResult<Vec<f64>> {
            Err(loadcast_core::LoadcastError::Validation(
                "estimator has not been fitted".into(),
            ))
        }
    }

    fn anchor_with(names: &[&str], values: &[f64]) -> AnchorRow {
        AnchorRow {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 17, 0, 0).unwrap(),
            names: names.iter().map(|s| s.to_string()).collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn constant_estimator_yields_constant_horizon() {
        let anchor = anchor_with(
            &["target_lag_1", "hour", "hour_sin", "hour_cos"],
            &[120.0, 17.0, 0.0, 0.0],
        );
        let points = recursive_forecast(&ConstantEstimator(42.5), &anchor, 6).unwrap();

        assert_eq!(points.len(), 6);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.step, i + 1);
            assert_eq!(point.prediction, 42.5);
            assert_eq!(
                point.datetime,
                anchor.timestamp + Duration::hours((i + 1) as i64)
            );
        }
        for pair in points.windows(2) {
            assert_eq!(pair[1].datetime - pair[0].datetime, Duration::hours(1));
        }
    }

    #[test]
    fn cascade_shifts_by_position_not_distance() {
        let anchor = anchor_with(
            &["target_lag_1", "target_lag_24", "target_lag_168"],
            &[10.0, 20.0, 30.0],
        );
        let estimator = RecordingEstimator::new(7.0);
        recursive_forecast(&estimator, &anchor, 2).unwrap();

        let seen = estimator.seen.borrow();
        assert_eq!(seen[0], vec![10.0, 20.0, 30.0]);
        // After one step: lag_168 took lag_24's old value, lag_24 took
        // lag_1's old value (not a true 24-hour-back value), lag_1 took the
        // prediction.
        assert_eq!(seen[1], vec![7.0, 10.0, 20.0]);
    }

    #[test]
    fn hour_advances_and_wraps() {
        let anchor = anchor_with(
            &["target_lag_1", "hour", "hour_sin", "hour_cos"],
            &[1.0, 23.0, 0.0, 0.0],
        );
        let estimator = RecordingEstimator::new(0.0);
        recursive_forecast(&estimator, &anchor, 2).unwrap();

        let seen = estimator.seen.borrow();
        let hour_idx = 1;
        assert_eq!(seen[0][hour_idx], 23.0);
        assert_eq!(seen[1][hour_idx], 0.0);
        let angle = 0.0f64;
        assert!((seen[1][2] - angle.sin()).abs() < 1e-12);
        assert!((seen[1][3] - angle.cos()).abs() < 1e-12);
    }

    #[test]
    fn calendar_fields_other_than_hour_stay_frozen() {
        let anchor = anchor_with(
            &["target_lag_1", "hour", "dayofweek", "month", "dayofyear", "is_weekend"],
            &[1.0, 22.0, 4.0, 6.0, 153.0, 0.0],
        );
        let estimator = RecordingEstimator::new(0.0);
        recursive_forecast(&estimator, &anchor, 5).unwrap();

        let seen = estimator.seen.borrow();
        for row in seen.iter() {
            assert_eq!(row[2], 4.0);
            assert_eq!(row[3], 6.0);
            assert_eq!(row[4], 153.0);
            assert_eq!(row[5], 0.0);
        }
        // Even though five steps cross midnight, nothing but hour moved.
        assert_eq!(seen[4][1], (22.0 + 4.0) % 24.0);
    }

    #[test]
    fn missing_features_enter_as_zero() {
        let anchor = anchor_with(&["target_lag_1", "unknown_feature"], &[5.0, f64::NAN]);
        let estimator = RecordingEstimator::new(1.0);
        recursive_forecast(&estimator, &anchor, 1).unwrap();
        assert_eq!(estimator.seen.borrow()[0], vec![5.0, 0.0]);
    }

    #[test]
    fn estimator_failure_aborts_without_partial_output() {
        let anchor = anchor_with(&["target_lag_1"], &[5.0]);
        let err = recursive_forecast(&FailingEstimator, &anchor, 6).unwrap_err();
        assert!(matches!(err, LoadcastError::Forecast(_)));
        assert!(err.to_string().contains("not been fitted"));
    }

    mod anchor {
        use super::*;
        use chrono::Duration;
        use loadcast_core::{FillPolicy, Observation, PipelineConfig};
        use loadcast_ts::{build_features, ensure_hourly_index};

        fn feature_table(hours: usize) -> FeatureTable {
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let series: Vec<Observation> = (0..hours)
                .map(|i| Observation {
                    timestamp: base + Duration::hours(i as i64),
                    value: 100.0 + i as f64,
                })
                .collect();
            let grid = ensure_hourly_index(&series, FillPolicy::Forward).unwrap();
            let cfg = PipelineConfig {
                lags: vec![1, 2],
                windows: vec![3],
                min_train_rows: 10,
                ..Default::default()
            };
            build_features(&grid, &cfg).unwrap()
        }

        #[test]
        fn anchor_uses_row_at_last_complete_hour() {
            let table = feature_table(48);
            let names: Vec<String> = table.feature_names().to_vec();
            // Raw data extends 20 minutes past hour 47.
            let last_observed = *table.timestamps().last().unwrap() + Duration::minutes(20);
            let anchor = build_anchor(last_observed, &table, &names).unwrap();

            assert_eq!(anchor.timestamp, last_observed);
            let last_idx = table.len() - 1;
            assert_eq!(
                anchor.get("target_lag_1"),
                Some(table.column("target_lag_1").unwrap()[last_idx])
            );
            assert_eq!(anchor.get("hour"), Some(23.0));
        }

        #[test]
        fn anchor_falls_back_to_latest_row() {
            let table = feature_table(48);
            let names: Vec<String> = table.feature_names().to_vec();
            // Last observation hours past the end of the feature table.
            let last_observed = *table.timestamps().last().unwrap() + Duration::hours(10);
            let anchor = build_anchor(last_observed, &table, &names).unwrap();

            let last_idx = table.len() - 1;
            assert_eq!(
                anchor.get("target_roll_mean_3"),
                Some(table.column("target_roll_mean_3").unwrap()[last_idx])
            );
        }

        #[test]
        fn unknown_feature_names_become_nan() {
            let table = feature_table(48);
            let mut names: Vec<String> = table.feature_names().to_vec();
            names.push("not_a_column".to_string());
            let last = *table.timestamps().last().unwrap();
            let anchor = build_anchor(last, &table, &names).unwrap();
            assert!(anchor.get("not_a_column").unwrap().is_nan());
        }

        #[test]
        fn empty_table_cannot_anchor() {
            let table = feature_table(48);
            let empty = table.take(&[]);
            let err = build_anchor(Utc::now(), &empty, &[]).unwrap_err();
            assert!(matches!(err, LoadcastError::InsufficientData(_)));
        }
    }
}
