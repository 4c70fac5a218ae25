//! Malformed-tolerant conversion of raw store records into typed inputs.
//!
//! The external report store hands over loosely-typed JSON. Records that
//! are missing required fields are skipped with a warning instead of
//! aborting the batch, so one bad row never takes the dashboard down.
//! Unknown incident type tags normalize to [`IncidentKind::Other`].

use chrono::{DateTime, Utc};
use civic_pulse_geo::{GeoPoint, InvalidCoordinateError};
use civic_pulse_incident_models::{IncidentEvent, IncidentKind, IncidentSeverity};
use civic_pulse_pollution_models::{PollutionReading, ReadingSource};
use serde_json::Value;
use thiserror::Error;

/// Why a raw record could not be converted into a typed input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedRecordError {
    /// A required field was absent or had the wrong JSON type.
    #[error("missing or invalid required field '{0}'")]
    MissingField(&'static str),

    /// The record's coordinates were outside the valid range.
    #[error("{0}")]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// The record's timestamp could not be parsed.
    #[error("unparseable timestamp '{0}': expected RFC 3339 or unix seconds")]
    BadTimestamp(String),
}

fn field_f64(record: &Value, field: &'static str) -> Result<f64, MalformedRecordError> {
    record
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(MalformedRecordError::MissingField(field))
}

fn field_i64(record: &Value, field: &'static str) -> Result<i64, MalformedRecordError> {
    record
        .get(field)
        .and_then(Value::as_i64)
        .ok_or(MalformedRecordError::MissingField(field))
}

fn field_str<'a>(
    record: &'a Value,
    field: &'static str,
) -> Result<&'a str, MalformedRecordError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or(MalformedRecordError::MissingField(field))
}

/// Accepts either a nested `location: {lat, lng}` object or flat
/// top-level `lat`/`lng` fields, whichever the source emits.
fn parse_location(record: &Value) -> Result<GeoPoint, MalformedRecordError> {
    let holder = record.get("location").unwrap_or(record);
    let lat = field_f64(holder, "lat")?;
    let lng = field_f64(holder, "lng")?;
    Ok(GeoPoint::new(lat, lng)?)
}

fn parse_timestamp(
    record: &Value,
    field: &'static str,
) -> Result<DateTime<Utc>, MalformedRecordError> {
    let value = record
        .get(field)
        .ok_or(MalformedRecordError::MissingField(field))?;

    if let Some(s) = value.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| MalformedRecordError::BadTimestamp(s.to_string()));
    }
    if let Some(secs) = value.as_i64() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| MalformedRecordError::BadTimestamp(secs.to_string()));
    }
    Err(MalformedRecordError::BadTimestamp(value.to_string()))
}

/// Severity is optional in source records; absent or unrecognized values
/// default to medium rather than rejecting the whole record.
fn parse_severity(record: &Value) -> IncidentSeverity {
    let Some(value) = record.get("severity") else {
        return IncidentSeverity::Medium;
    };

    if let Some(s) = value.as_str() {
        return match s.trim().to_lowercase().as_str() {
            "low" => IncidentSeverity::Low,
            "high" => IncidentSeverity::High,
            _ => IncidentSeverity::Medium,
        };
    }
    value
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .and_then(|n| IncidentSeverity::from_value(n).ok())
        .unwrap_or(IncidentSeverity::Medium)
}

fn parse_source(record: &Value) -> ReadingSource {
    match record.get("source").and_then(Value::as_str) {
        Some(s) => match s.trim().to_lowercase().as_str() {
            "manual" => ReadingSource::Manual,
            "user_report" | "user-report" | "userreport" => ReadingSource::UserReport,
            _ => ReadingSource::Api,
        },
        None => ReadingSource::Api,
    }
}

fn optional_f64(record: &Value, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64)
}

/// Converts one raw incident record into a typed event.
///
/// # Errors
///
/// Returns [`MalformedRecordError`] if `id`, `type`, the location, or
/// `occurredAt` is missing or unusable.
pub fn event_from_record(record: &Value) -> Result<IncidentEvent, MalformedRecordError> {
    let id = field_i64(record, "id")?;
    let kind = IncidentKind::from_tag(field_str(record, "type")?);
    let location = parse_location(record)?;
    let severity = parse_severity(record);
    let occurred_at = parse_timestamp(record, "occurredAt")?;

    Ok(IncidentEvent {
        id,
        kind,
        location,
        severity,
        occurred_at,
    })
}

/// Converts a batch of raw incident records, skipping malformed ones.
#[must_use]
pub fn events_from_records(records: &[Value]) -> Vec<IncidentEvent> {
    records
        .iter()
        .filter_map(|record| match event_from_record(record) {
            Ok(event) => Some(event),
            Err(e) => {
                log::warn!("Skipping malformed incident record: {e}");
                None
            }
        })
        .collect()
}

/// Converts one raw pollution record into a typed reading.
///
/// All pollutant fields are optional here; whether the reading is
/// scorable is decided later, per record, by the scoring layer.
///
/// # Errors
///
/// Returns [`MalformedRecordError`] if `id`, the location, or
/// `measuredAt` is missing or unusable.
pub fn reading_from_record(record: &Value) -> Result<PollutionReading, MalformedRecordError> {
    Ok(PollutionReading {
        id: field_i64(record, "id")?,
        location: parse_location(record)?,
        aqi: optional_f64(record, "aqi"),
        pm25: optional_f64(record, "pm25"),
        pm10: optional_f64(record, "pm10"),
        o3: optional_f64(record, "o3"),
        no2: optional_f64(record, "no2"),
        so2: optional_f64(record, "so2"),
        co: optional_f64(record, "co"),
        source: parse_source(record),
        measured_at: parse_timestamp(record, "measuredAt")?,
    })
}

/// Converts a batch of raw pollution records, skipping malformed ones.
#[must_use]
pub fn readings_from_records(records: &[Value]) -> Vec<PollutionReading> {
    records
        .iter()
        .filter_map(|record| match reading_from_record(record) {
            Ok(reading) => Some(reading),
            Err(e) => {
                log::warn!("Skipping malformed pollution record: {e}");
                None
            }
        })
        .collect()
}
