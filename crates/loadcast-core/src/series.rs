//! Raw and hourly-grid series types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds per hourly bucket.
pub const HOUR_SECS: i64 = 3600;

/// A single raw observation: a UTC instant and a demand value.
///
/// Observations are produced externally (API fetch, CSV fallback) and consumed
/// read-only by the pipeline. Input order is not assumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One row of the hourly grid. `value` is `None` when the fill policy left the
/// hour unfilled (leading gaps under forward fill, trailing gaps under
/// backward fill, or everything a `none` policy did not observe).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// A continuous hourly series: strictly increasing timestamps at exactly
/// one-hour spacing, no gaps, spanning the closed range
/// `[floor_to_hour(min ts), ceil_to_hour(max ts)]` of the source series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyGrid {
    points: Vec<HourlyPoint>,
}

impl HourlyGrid {
    /// Wrap a vector of points. The caller (the grid normalizer) is
    /// responsible for the hourly-spacing invariant; it is checked in debug
    /// builds only.
    pub fn from_points(points: Vec<HourlyPoint>) -> Self {
        debug_assert!(points
            .windows(2)
            .all(|pair| pair[1].timestamp - pair[0].timestamp == Duration::hours(1)));
        Self { points }
    }

    pub fn points(&self) -> &[HourlyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First grid timestamp, if any.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Last grid timestamp, if any.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Floor a UTC instant to the start of its hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(HOUR_SECS);
    DateTime::<Utc>::from_timestamp(floored, 0).expect("hour-floored timestamp is in range")
}

/// Ceil a UTC instant to the end of its hour. Instants already on an hour
/// boundary are returned unchanged.
pub fn ceil_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_to_hour(ts);
    if floored == ts && ts.timestamp_subsec_nanos() == 0 {
        floored
    } else {
        floored + Duration::hours(1)
    }
}

/// True when the instant lands exactly on an hour boundary.
pub fn is_hour_boundary(ts: DateTime<Utc>) -> bool {
    ts.timestamp().rem_euclid(HOUR_SECS) == 0 && ts.timestamp_subsec_nanos() == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn floor_truncates_within_hour() {
        let ts = utc(2024, 3, 1, 14, 37, 12);
        assert_eq!(floor_to_hour(ts), utc(2024, 3, 1, 14, 0, 0));
    }

    #[test]
    fn floor_is_identity_on_boundary() {
        let ts = utc(2024, 3, 1, 14, 0, 0);
        assert_eq!(floor_to_hour(ts), ts);
    }

    #[test]
    fn ceil_rounds_up_within_hour() {
        let ts = utc(2024, 3, 1, 14, 0, 1);
        assert_eq!(ceil_to_hour(ts), utc(2024, 3, 1, 15, 0, 0));
    }

    #[test]
    fn ceil_is_identity_on_boundary() {
        let ts = utc(2024, 3, 1, 14, 0, 0);
        assert_eq!(ceil_to_hour(ts), ts);
    }

    #[test]
    fn grid_exposes_range() {
        let points = vec![
            HourlyPoint {
                timestamp: utc(2024, 1, 1, 0, 0, 0),
                value: Some(1.0),
            },
            HourlyPoint {
                timestamp: utc(2024, 1, 1, 1, 0, 0),
                value: None,
            },
        ];
        let grid = HourlyGrid::from_points(points);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.start(), Some(utc(2024, 1, 1, 0, 0, 0)));
        assert_eq!(grid.end(), Some(utc(2024, 1, 1, 1, 0, 0)));
        assert_eq!(grid.values(), vec![Some(1.0), None]);
    }

    #[test]
    fn hour_boundary_detection() {
        assert!(is_hour_boundary(utc(2024, 1, 1, 5, 0, 0)));
        assert!(!is_hour_boundary(utc(2024, 1, 1, 5, 30, 0)));
    }
}
