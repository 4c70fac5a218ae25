#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! EPA breakpoint AQI scoring and band classification.
//!
//! Converts raw pollutant concentrations into Air Quality Index values
//! using the US EPA piecewise-linear breakpoint convention, and maps an
//! AQI value onto one of six fixed health bands. The band descriptions
//! are displayed verbatim by the caller and feed alert text, so they are
//! part of the contract, not just presentation strings.

use civic_pulse_pollution_models::PollutionReading;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while scoring air-quality data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AirQualityError {
    /// Neither PM2.5 nor PM10 concentration is present.
    #[error("no pollutant concentration present")]
    MissingConcentration,

    /// A reading carries neither pollutant concentrations nor a raw AQI.
    #[error("reading {reading_id} has neither pollutant concentrations nor a raw AQI value")]
    MissingData {
        /// Id of the unscorable reading.
        reading_id: i64,
    },
}

/// Pollutants with a defined breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    /// Fine particulate matter (≤2.5 µm).
    Pm25,
    /// Coarse particulate matter (≤10 µm).
    Pm10,
}

/// One contiguous segment of a breakpoint table: concentrations in
/// `[c_lo, c_hi]` map linearly onto AQI `[aqi_lo, aqi_hi]`.
struct Segment {
    c_lo: f64,
    c_hi: f64,
    aqi_lo: f64,
    aqi_hi: f64,
}

const fn seg(c_lo: f64, c_hi: f64, aqi_lo: f64, aqi_hi: f64) -> Segment {
    Segment {
        c_lo,
        c_hi,
        aqi_lo,
        aqi_hi,
    }
}

/// PM2.5 breakpoints (µg/m³ → AQI), EPA convention.
const PM25_SEGMENTS: [Segment; 6] = [
    seg(0.0, 12.0, 0.0, 50.0),
    seg(12.0, 35.4, 50.0, 100.0),
    seg(35.4, 55.4, 100.0, 150.0),
    seg(55.4, 150.4, 150.0, 200.0),
    seg(150.4, 250.4, 200.0, 300.0),
    seg(250.4, 350.4, 300.0, 400.0),
];

/// PM10 breakpoints (µg/m³ → AQI), EPA convention.
const PM10_SEGMENTS: [Segment; 6] = [
    seg(0.0, 54.0, 0.0, 50.0),
    seg(54.0, 154.0, 50.0, 100.0),
    seg(154.0, 254.0, 100.0, 150.0),
    seg(254.0, 354.0, 150.0, 200.0),
    seg(354.0, 424.0, 200.0, 300.0),
    seg(424.0, 504.0, 300.0, 400.0),
];

/// Converts a pollutant concentration (µg/m³) to an AQI value.
///
/// Linear interpolation within the matching breakpoint segment, floored
/// to an integer. Negative concentrations are treated as 0.
/// Concentrations above the highest defined segment extrapolate with the
/// last segment's slope; there is deliberately no upper clamp.
#[must_use]
pub fn concentration_to_aqi(pollutant: Pollutant, concentration: f64) -> u32 {
    let segments: &[Segment] = match pollutant {
        Pollutant::Pm25 => &PM25_SEGMENTS,
        Pollutant::Pm10 => &PM10_SEGMENTS,
    };

    let c = concentration.max(0.0);

    for segment in segments {
        if c <= segment.c_hi {
            return interpolate(segment, c);
        }
    }

    // Beyond the top segment: keep extrapolating with the last slope.
    let last = &segments[segments.len() - 1];
    interpolate(last, c)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn interpolate(segment: &Segment, c: f64) -> u32 {
    let slope = (segment.aqi_hi - segment.aqi_lo) / (segment.c_hi - segment.c_lo);
    let aqi = slope.mul_add(c - segment.c_lo, segment.aqi_lo);
    aqi.floor().max(0.0) as u32
}

/// Computes the overall AQI from the available particulate concentrations.
///
/// Per EPA convention the worst pollutant dominates, so this returns the
/// maximum of the per-pollutant values.
///
/// # Errors
///
/// Returns [`AirQualityError::MissingConcentration`] if neither
/// concentration is present.
pub fn overall_aqi(pm25: Option<f64>, pm10: Option<f64>) -> Result<u32, AirQualityError> {
    let pm25_aqi = pm25.map(|c| concentration_to_aqi(Pollutant::Pm25, c));
    let pm10_aqi = pm10.map(|c| concentration_to_aqi(Pollutant::Pm10, c));

    match (pm25_aqi, pm10_aqi) {
        (Some(a), Some(b)) => Ok(a.max(b)),
        (Some(a), None) | (None, Some(a)) => Ok(a),
        (None, None) => Err(AirQualityError::MissingConcentration),
    }
}

/// One of the six fixed AQI health bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiLevel {
    /// Display name of the band.
    pub name: &'static str,
    /// Display color of the band.
    pub color: &'static str,
    /// Health-impact description, displayed verbatim.
    pub description: &'static str,
    /// Inclusive lower bound of the band.
    pub min: u32,
    /// Inclusive upper bound of the band; `None` for the open-ended top.
    pub max: Option<u32>,
}

/// The six AQI bands, contiguous and non-overlapping over all `aqi >= 0`.
pub const AQI_LEVELS: [AqiLevel; 6] = [
    AqiLevel {
        name: "Good",
        color: "green",
        description: "Air quality is satisfactory, and air pollution poses little or no risk.",
        min: 0,
        max: Some(50),
    },
    AqiLevel {
        name: "Moderate",
        color: "yellow",
        description: "Air quality is acceptable. There may be a risk for some people, \
                      particularly those who are unusually sensitive to air pollution.",
        min: 51,
        max: Some(100),
    },
    AqiLevel {
        name: "Unhealthy for Sensitive Groups",
        color: "orange",
        description: "Members of sensitive groups may experience health effects. The general \
                      public is less likely to be affected.",
        min: 101,
        max: Some(150),
    },
    AqiLevel {
        name: "Unhealthy",
        color: "red",
        description: "Some members of the general public may experience health effects; \
                      members of sensitive groups may experience more serious health effects.",
        min: 151,
        max: Some(200),
    },
    AqiLevel {
        name: "Very Unhealthy",
        color: "purple",
        description: "Health alert: The risk of health effects is increased for everyone.",
        min: 201,
        max: Some(300),
    },
    AqiLevel {
        name: "Hazardous",
        color: "maroon",
        description: "Health warning of emergency conditions: everyone is more likely to be \
                      affected.",
        min: 301,
        max: None,
    },
];

/// Maps an AQI value onto its health band.
///
/// Every `aqi >= 0` lands in exactly one band.
#[must_use]
pub fn classify(aqi: u32) -> &'static AqiLevel {
    AQI_LEVELS
        .iter()
        .find(|level| level.max.is_none_or(|max| aqi <= max))
        .unwrap_or(&AQI_LEVELS[AQI_LEVELS.len() - 1])
}

/// A reading with its resolved AQI value and health band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredReading {
    /// The resolved integer AQI.
    pub aqi: u32,
    /// The band the AQI falls in.
    pub level: &'static AqiLevel,
}

/// Scores a single reading: pollutant concentrations first, falling back
/// to the source-reported raw `aqi` field.
///
/// # Errors
///
/// Returns [`AirQualityError::MissingData`] if the reading has neither
/// usable concentrations nor a raw AQI value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_reading(reading: &PollutionReading) -> Result<ScoredReading, AirQualityError> {
    let aqi = match overall_aqi(reading.pm25, reading.pm10) {
        Ok(aqi) => aqi,
        Err(AirQualityError::MissingConcentration) => match reading.aqi {
            Some(raw) if raw.is_finite() => raw.max(0.0).floor() as u32,
            _ => {
                return Err(AirQualityError::MissingData {
                    reading_id: reading.id,
                });
            }
        },
        Err(other) => return Err(other),
    };

    Ok(ScoredReading {
        aqi,
        level: classify(aqi),
    })
}
