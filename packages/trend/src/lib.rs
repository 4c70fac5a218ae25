#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Period-over-period trend analysis and time bucketing.
//!
//! Pure aggregation over caller-supplied windows: no clock access, no
//! retained state, every function recomputes from its inputs. Results
//! are ephemeral display values and are never persisted by this crate.

use chrono::{DateTime, DurationRound, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Symmetric dead band (in percent) below which period-over-period change
/// is reported as stable, to avoid flapping on noise.
pub const DEAD_BAND_PCT: f64 = 2.0;

/// Direction of a period-over-period change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    /// Metric increased beyond the dead band.
    Up,
    /// Metric decreased beyond the dead band.
    Down,
    /// Change within the dead band, or no previous data.
    Stable,
}

/// Result of comparing a metric across two time windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    /// Mean metric value over the current window.
    pub current: f64,
    /// Mean metric value over the previous window.
    pub previous: f64,
    /// Percent change from previous to current; 0 when previous is 0.
    pub change_pct: f64,
    /// Classified direction of the change.
    pub direction: TrendDirection,
}

/// A timestamped AQI value, the input shape for all bucketing functions.
///
/// The facade converts scored pollution readings into samples so this
/// crate stays a pure aggregation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiSample {
    /// When the underlying reading was measured.
    pub measured_at: DateTime<Utc>,
    /// Resolved AQI value.
    pub aqi: f64,
}

/// Average AQI for one hour of the day (0-23).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyAqi {
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Average AQI over samples in that hour.
    pub aqi: f64,
}

/// Average AQI over one hour or day boundary-aligned bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    /// Inclusive start of the bucket (hour or day boundary).
    pub start: DateTime<Utc>,
    /// Average AQI over samples in the bucket.
    pub avg_aqi: f64,
    /// Number of samples in the bucket.
    pub count: usize,
}

/// Error returned when a peak is requested over an empty series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot compute the peak of an empty series")]
pub struct EmptySeriesError;

#[allow(clippy::cast_precision_loss)]
fn mean<T>(items: &[T], metric: impl Fn(&T) -> f64) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(metric).sum::<f64>() / items.len() as f64
}

/// Compares the mean of a metric across two windows.
///
/// An empty window has mean 0. When the previous mean is 0 the change is
/// defined as 0 % and the direction as [`TrendDirection::Stable`] — an
/// explicit contract to keep division-by-zero out of downstream display
/// code. Otherwise the direction uses a ±[`DEAD_BAND_PCT`] dead band.
pub fn compare_periods<T>(
    current: &[T],
    previous: &[T],
    metric: impl Fn(&T) -> f64,
) -> TrendResult {
    let current_mean = mean(current, &metric);
    let previous_mean = mean(previous, &metric);

    let (change_pct, direction) = if previous_mean == 0.0 {
        (0.0, TrendDirection::Stable)
    } else {
        let pct = (current_mean - previous_mean) / previous_mean * 100.0;
        let direction = if pct > DEAD_BAND_PCT {
            TrendDirection::Up
        } else if pct < -DEAD_BAND_PCT {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };
        (pct, direction)
    };

    TrendResult {
        current: current_mean,
        previous: previous_mean,
        change_pct,
        direction,
    }
}

/// Finds the hour with the highest AQI; ties resolve to the earliest hour.
///
/// # Errors
///
/// Returns [`EmptySeriesError`] if the series is empty. Callers should
/// omit the peak-pollution display rather than treat this as fatal.
pub fn peak_hour(series: &[HourlyAqi]) -> Result<HourlyAqi, EmptySeriesError> {
    let mut best: Option<HourlyAqi> = None;
    for entry in series {
        let replace = best.is_none_or(|b| {
            entry.aqi > b.aqi || (entry.aqi == b.aqi && entry.hour < b.hour)
        });
        if replace {
            best = Some(*entry);
        }
    }
    best.ok_or(EmptySeriesError)
}

fn bucket_by(samples: &[AqiSample], bucket_width: TimeDelta) -> Vec<TimeBucket> {
    let mut buckets: std::collections::BTreeMap<DateTime<Utc>, (f64, usize)> =
        std::collections::BTreeMap::new();

    for sample in samples {
        let start = sample
            .measured_at
            .duration_trunc(bucket_width)
            .unwrap_or(sample.measured_at);
        let entry = buckets.entry(start).or_insert((0.0, 0));
        entry.0 += sample.aqi;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(start, (sum, count))| TimeBucket {
            start,
            #[allow(clippy::cast_precision_loss)]
            avg_aqi: sum / count as f64,
            count,
        })
        .collect()
}

/// Groups samples by hour boundary, averaging AQI per bucket.
///
/// Buckets are returned in chronological order. Pure function of the
/// input; repeated calls give the same result.
#[must_use]
pub fn bucket_by_hour(samples: &[AqiSample]) -> Vec<TimeBucket> {
    bucket_by(samples, TimeDelta::hours(1))
}

/// Groups samples by day boundary, averaging AQI per bucket.
#[must_use]
pub fn bucket_by_day(samples: &[AqiSample]) -> Vec<TimeBucket> {
    bucket_by(samples, TimeDelta::days(1))
}

/// Folds samples onto hour-of-day (0-23), averaging AQI per hour.
///
/// Only hours with at least one sample appear; the result is sorted by
/// hour. This feeds the daily-profile chart and [`peak_hour`].
#[must_use]
pub fn hourly_profile(samples: &[AqiSample]) -> Vec<HourlyAqi> {
    let mut by_hour: std::collections::BTreeMap<u32, (f64, usize)> =
        std::collections::BTreeMap::new();

    for sample in samples {
        let entry = by_hour.entry(sample.measured_at.hour()).or_insert((0.0, 0));
        entry.0 += sample.aqi;
        entry.1 += 1;
    }

    by_hour
        .into_iter()
        .map(|(hour, (sum, count))| HourlyAqi {
            hour,
            #[allow(clippy::cast_precision_loss)]
            aqi: sum / count as f64,
        })
        .collect()
}
