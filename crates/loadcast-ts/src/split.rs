//! Deterministic time-ordered train/validation split.

use chrono::Duration;
use tracing::warn;

use crate::features::FeatureTable;

/// Split a feature table at `max(ts) - val_hours`.
///
/// Rows at or before the cutoff train; the remainder validate. Whenever both
/// sides are non-empty, `max(train.ts) < min(val.ts)` holds, so there is no
/// leakage and no overlap. An empty validation side is a valid outcome for a
/// short series (it is logged, never raised), and the caller skips evaluation.
pub fn train_val_split_time(table: &FeatureTable, val_hours: i64) -> (FeatureTable, FeatureTable) {
    if table.is_empty() {
        return (table.take(&[]), table.take(&[]));
    }

    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&i| table.timestamps()[i]);

    let max_ts = table.timestamps()[*order.last().expect("non-empty table")];
    let cutoff = max_ts - Duration::hours(val_hours);

    let (train_idx, val_idx): (Vec<usize>, Vec<usize>) = order
        .into_iter()
        .partition(|&i| table.timestamps()[i] <= cutoff);

    if val_idx.is_empty() {
        warn!(
            val_hours,
            rows = table.len(),
            "validation split is empty; evaluation will be skipped"
        );
    }

    (table.take(&train_idx), table.take(&val_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_features;
    use crate::grid::ensure_hourly_index;
    use chrono::{Duration, TimeZone, Utc};
    use loadcast_core::{FillPolicy, Observation, PipelineConfig};

    fn table(hours: usize) -> FeatureTable {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series: Vec<Observation> = (0..hours)
            .map(|i| Observation {
                timestamp: base + Duration::hours(i as i64),
                value: i as f64,
            })
            .collect();
        let grid = ensure_hourly_index(&series, FillPolicy::Forward).unwrap();
        let cfg = PipelineConfig {
            lags: vec![1, 24],
            windows: vec![3],
            min_train_rows: 24,
            ..Default::default()
        };
        build_features(&grid, &cfg).unwrap()
    }

    #[test]
    fn split_has_no_leakage() {
        let table = table(200);
        let (train, val) = train_val_split_time(&table, 24);
        assert!(!train.is_empty());
        assert!(!val.is_empty());
        let train_max = train.timestamps().iter().max().unwrap();
        let val_min = val.timestamps().iter().min().unwrap();
        assert!(train_max < val_min);
    }

    #[test]
    fn split_partitions_all_rows() {
        let table = table(200);
        let (train, val) = train_val_split_time(&table, 24);
        assert_eq!(train.len() + val.len(), table.len());
        assert_eq!(val.len(), 24);
    }

    #[test]
    fn oversized_validation_window_empties_train() {
        let table = table(60);
        let (train, val) = train_val_split_time(&table, 10_000);
        // Everything lands after the cutoff, so validation takes it all;
        // the degenerate side is train here.
        assert!(train.is_empty());
        assert_eq!(val.len(), table.len());
    }

    #[test]
    fn zero_val_hours_puts_everything_in_train() {
        let table = table(60);
        let (train, val) = train_val_split_time(&table, 0);
        assert_eq!(train.len(), table.len());
        assert!(val.is_empty());
    }
}
