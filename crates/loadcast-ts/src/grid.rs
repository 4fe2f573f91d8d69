//! Hourly grid normalization.
//!
//! The indicator API may skip hours or deliver sub-hourly samples, so raw
//! observations are reindexed onto a continuous UTC hourly grid before any
//! feature work happens.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use loadcast_core::series::HOUR_SECS;
use loadcast_core::{
    ceil_to_hour, floor_to_hour, is_hour_boundary, FillPolicy, HourlyGrid, HourlyPoint,
    LoadcastError, Observation,
};

/// Reindex an irregular series onto a continuous hourly grid in
/// `[floor_to_hour(min ts), ceil_to_hour(max ts)]`, filling gaps per `fill`.
///
/// Observations that do not land exactly on an hour boundary are dropped from
/// direct assignment: this mirrors a resample-then-reindex semantics and is
/// policy, not an accident. When two observations land on the same boundary,
/// the later one wins. Both situations are logged.
pub fn ensure_hourly_index(
    series: &[Observation],
    fill: FillPolicy,
) -> Result<HourlyGrid, LoadcastError> {
    if series.is_empty() {
        return Err(LoadcastError::EmptySeries);
    }

    let mut sorted: Vec<Observation> = series.to_vec();
    sorted.sort_by_key(|obs| obs.timestamp);

    let start = floor_to_hour(sorted[0].timestamp);
    let end = ceil_to_hour(sorted[sorted.len() - 1].timestamp);

    let mut on_grid: BTreeMap<i64, f64> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;
    for obs in &sorted {
        if is_hour_boundary(obs.timestamp) {
            if on_grid.insert(obs.timestamp.timestamp(), obs.value).is_some() {
                duplicates += 1;
            }
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!(
            dropped,
            "observations off the hour boundary were not assigned to the grid"
        );
    }
    if duplicates > 0 {
        warn!(duplicates, "duplicate hourly timestamps; later value kept");
    }

    let n = ((end.timestamp() - start.timestamp()) / HOUR_SECS) as usize + 1;
    let mut values: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(n);
    for i in 0..n {
        let ts = start + Duration::hours(i as i64);
        timestamps.push(ts);
        values.push(on_grid.get(&ts.timestamp()).copied());
    }

    apply_fill(&mut values, fill);

    let points = timestamps
        .into_iter()
        .zip(values)
        .map(|(timestamp, value)| HourlyPoint { timestamp, value })
        .collect();
    Ok(HourlyGrid::from_points(points))
}

fn apply_fill(values: &mut [Option<f64>], fill: FillPolicy) {
    match fill {
        FillPolicy::Forward => {
            let mut last = None;
            for slot in values.iter_mut() {
                match *slot {
                    Some(v) => last = Some(v),
                    None => *slot = last,
                }
            }
        }
        FillPolicy::Backward => {
            let mut next = None;
            for slot in values.iter_mut().rev() {
                match *slot {
                    Some(v) => next = Some(v),
                    None => *slot = next,
                }
            }
        }
        FillPolicy::Interpolate => interpolate(values),
        FillPolicy::None => {}
    }
}

/// Linear interpolation between known values; boundary gaps take the nearest
/// known value. A series with no known values at all is left untouched.
fn interpolate(values: &mut [Option<f64>]) {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|value| (i, value)))
        .collect();
    if known.is_empty() {
        return;
    }

    let (first_idx, first_val) = known[0];
    let (last_idx, last_val) = known[known.len() - 1];
    for slot in values[..first_idx].iter_mut() {
        *slot = Some(first_val);
    }
    for slot in values[last_idx + 1..].iter_mut() {
        *slot = Some(last_val);
    }

    for pair in known.windows(2) {
        let (lo_idx, lo_val) = pair[0];
        let (hi_idx, hi_val) = pair[1];
        let span = (hi_idx - lo_idx) as f64;
        for idx in lo_idx + 1..hi_idx {
            let frac = (idx - lo_idx) as f64 / span;
            values[idx] = Some(lo_val + (hi_val - lo_val) * frac);
        }
    }
}
