#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facade over the clustering, scoring, trend, and prediction engines.
//!
//! The UI/API layer consumes this crate only: it supplies in-memory
//! collections fetched from the external report store and gets back
//! decision-ready artifacts (risk zones, pollution zones, AQI summaries,
//! predicted alerts). Nothing here performs I/O or retains state between
//! calls.

pub mod ingest;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;

pub use civic_pulse_air_quality::{
    AirQualityError, AqiLevel, Pollutant, ScoredReading, classify, concentration_to_aqi,
    overall_aqi, score_reading,
};
pub use civic_pulse_cluster::{
    INCIDENT_CLUSTER_THRESHOLD_METERS, POLLUTION_CLUSTER_THRESHOLD_METERS,
    RISK_ZONE_RADIUS_METERS, PollutionZone, RiskLevel, RiskZone, cluster_events, cluster_readings,
};
pub use civic_pulse_geo::{GeoPoint, InvalidCoordinateError};
pub use civic_pulse_incident_models::{IncidentEvent, IncidentKind, IncidentSeverity};
pub use civic_pulse_pollution_models::{PollutionReading, ReadingSource};
pub use civic_pulse_predict::{AlertCategory, PredictedAlert, generate_predictions};
pub use civic_pulse_trend::{
    AqiSample, EmptySeriesError, HourlyAqi, TrendDirection, TrendResult, bucket_by_day,
    bucket_by_hour, compare_periods, hourly_profile, peak_hour,
};
pub use ingest::MalformedRecordError;

/// Errors that can cross the facade boundary.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A latitude/longitude pair was outside the valid range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// AQI was requested but no usable pollutant data was present.
    #[error("Air quality scoring failed: {0}")]
    AirQuality(#[from] AirQualityError),

    /// A peak or trend was requested over an empty series.
    #[error("Empty series: {0}")]
    EmptySeries(#[from] EmptySeriesError),

    /// A raw record was missing a required field.
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] MalformedRecordError),
}

/// Window width used for the summary's current/previous comparison.
pub const SUMMARY_WINDOW_HOURS: i64 = 24;

/// Dashboard-ready AQI summary over a batch of readings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiSummary {
    /// AQI of the most recent scorable reading in the current window.
    pub current_aqi: Option<u32>,
    /// Band of `current_aqi`.
    pub level: Option<&'static AqiLevel>,
    /// Current 24 h window vs the 24 h before it.
    pub trend: TrendResult,
    /// Peak hour over the current window; `None` when there is no data,
    /// in which case the caller omits the peak-pollution display.
    pub peak: Option<HourlyAqi>,
}

/// Scores a batch of readings into trend samples.
///
/// Unscorable readings (no concentrations and no raw AQI) are skipped
/// with a warning; one bad record never aborts the batch.
#[must_use]
pub fn samples_from_readings(readings: &[PollutionReading]) -> Vec<AqiSample> {
    readings
        .iter()
        .filter_map(|reading| match score_reading(reading) {
            Ok(scored) => Some(AqiSample {
                measured_at: reading.measured_at,
                aqi: f64::from(scored.aqi),
            }),
            Err(e) => {
                log::warn!("Skipping unscorable pollution reading: {e}");
                None
            }
        })
        .collect()
}

/// Builds the dashboard AQI summary from a batch of readings.
///
/// The trend compares the 24 hours before `now` against the 24 hours
/// before that. Readings outside both windows are simply ignored, so
/// callers can pass whatever recent batch the store returns.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn aqi_summary(readings: &[PollutionReading], now: DateTime<Utc>) -> AqiSummary {
    let samples = samples_from_readings(readings);

    let window = TimeDelta::hours(SUMMARY_WINDOW_HOURS);
    let current_start = now - window;
    let previous_start = current_start - window;

    let current: Vec<AqiSample> = samples
        .iter()
        .copied()
        .filter(|s| s.measured_at > current_start && s.measured_at <= now)
        .collect();
    let previous: Vec<AqiSample> = samples
        .iter()
        .copied()
        .filter(|s| s.measured_at > previous_start && s.measured_at <= current_start)
        .collect();

    let trend = compare_periods(&current, &previous, |s| s.aqi);

    let latest = current
        .iter()
        .max_by_key(|s| s.measured_at)
        .map(|s| s.aqi.max(0.0).floor() as u32);

    AqiSummary {
        current_aqi: latest,
        level: latest.map(classify),
        trend,
        peak: peak_hour(&hourly_profile(&current)).ok(),
    }
}
