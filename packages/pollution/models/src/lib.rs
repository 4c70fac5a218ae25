#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Air quality reading types.
//!
//! A [`PollutionReading`] carries either a pre-computed AQI value (some
//! upstream APIs report one directly), raw pollutant concentrations, or
//! both. At least one of the two must be present for a reading to be
//! scorable; the scoring crate enforces that.

use chrono::{DateTime, Utc};
use civic_pulse_geo::GeoPoint;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Where a pollution reading came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingSource {
    /// Automated pull from an external air-quality API.
    Api,
    /// Manually entered by an operator.
    Manual,
    /// Submitted by a citizen through the reporting form.
    UserReport,
}

/// A single geotagged air-quality measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutionReading {
    /// Storage-assigned record id.
    pub id: i64,
    /// Where the measurement was taken.
    pub location: GeoPoint,
    /// Pre-computed AQI reported by the source, if any.
    pub aqi: Option<f64>,
    /// PM2.5 concentration in µg/m³.
    pub pm25: Option<f64>,
    /// PM10 concentration in µg/m³.
    pub pm10: Option<f64>,
    /// Ozone concentration in µg/m³.
    pub o3: Option<f64>,
    /// Nitrogen dioxide concentration in µg/m³.
    pub no2: Option<f64>,
    /// Sulfur dioxide concentration in µg/m³.
    pub so2: Option<f64>,
    /// Carbon monoxide concentration in µg/m³.
    pub co: Option<f64>,
    /// Where this reading came from.
    pub source: ReadingSource,
    /// When the measurement was taken.
    pub measured_at: DateTime<Utc>,
}

impl PollutionReading {
    /// Returns `true` if any raw pollutant concentration is present.
    #[must_use]
    pub const fn has_concentration(&self) -> bool {
        self.pm25.is_some()
            || self.pm10.is_some()
            || self.o3.is_some()
            || self.no2.is_some()
            || self.so2.is_some()
            || self.co.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_reading() -> PollutionReading {
        PollutionReading {
            id: 1,
            location: GeoPoint::new(41.0, -87.0).unwrap(),
            aqi: None,
            pm25: None,
            pm10: None,
            o3: None,
            no2: None,
            so2: None,
            co: None,
            source: ReadingSource::Api,
            measured_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn has_concentration_false_when_all_absent() {
        assert!(!bare_reading().has_concentration());
    }

    #[test]
    fn has_concentration_true_for_any_pollutant() {
        let mut r = bare_reading();
        r.no2 = Some(12.0);
        assert!(r.has_concentration());
    }

    #[test]
    fn raw_aqi_alone_is_not_a_concentration() {
        let mut r = bare_reading();
        r.aqi = Some(75.0);
        assert!(!r.has_concentration());
    }
}
