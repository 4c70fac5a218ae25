#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Civic incident taxonomy types and severity definitions.
//!
//! This crate defines the canonical incident kind taxonomy used across
//! the entire system. The report-intake layer normalizes free-form
//! source tags into this closed taxonomy so typos surface at the
//! boundary instead of silently falling through to default handling.

use chrono::{DateTime, Utc};
use civic_pulse_geo::GeoPoint;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity level for a reported incident, from 1 (low) to 3 (high).
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
pub enum IncidentSeverity {
    /// Level 1: Cosmetic or low-impact issues
    Low = 1,
    /// Level 2: Issues degrading normal use of public infrastructure
    Medium = 2,
    /// Level 3: Issues posing immediate risk to people or property
    High = 3,
}

impl IncidentSeverity {
    /// Returns the numeric value of this severity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a severity level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-3.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            _ => Err(InvalidSeverityError { value }),
        }
    }
}

/// Error returned when attempting to create an [`IncidentSeverity`] from an
/// invalid numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity value {}: expected 1-3", self.value)
    }
}

impl std::error::Error for InvalidSeverityError {}

/// Closed taxonomy of civic incident kinds.
///
/// Source systems report free-form string tags (`"pothole"`,
/// `"street_light"`, ...); [`IncidentKind::from_tag`] normalizes them,
/// falling back to [`IncidentKind::Other`] for anything unrecognized.
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
pub enum IncidentKind {
    /// Road surface pothole
    Pothole,
    /// Damaged road surface other than potholes (cracks, sinkholes)
    RoadDamage,
    /// Debris, flooding, or other blockage of a roadway
    RoadObstruction,
    /// Broken or missing street lighting
    StreetLight,
    /// Uncollected garbage or illegal dumping
    Garbage,
    /// Theft, vandalism, assault, or other security concern
    Security,
    /// Scams, phishing, or financial fraud reports
    Fraud,
    /// Water supply or drainage problems
    Water,
    /// Reports that don't map to any other kind
    Other,
}

impl IncidentKind {
    /// Normalizes a free-form source tag into the closed taxonomy.
    ///
    /// Matching is case-insensitive and tolerates `-`/`_`/space
    /// separators. Unrecognized tags become [`Self::Other`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let normalized: String = tag
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "pothole" | "potholes" => Self::Pothole,
            "road_damage" | "road" | "broken_road" => Self::RoadDamage,
            "road_obstruction" | "obstruction" | "road_block" | "flooding" => {
                Self::RoadObstruction
            }
            "street_light" | "streetlight" | "broken_light" => Self::StreetLight,
            "garbage" | "trash" | "dumping" => Self::Garbage,
            "security" | "theft" | "vandalism" | "cybersecurity" => Self::Security,
            "fraud" | "scam" | "phishing" => Self::Fraud,
            "water" | "water_leak" | "drainage" => Self::Water,
            _ => Self::Other,
        }
    }

    /// Returns `true` for kinds affecting road accessibility.
    #[must_use]
    pub const fn is_road_related(self) -> bool {
        matches!(self, Self::Pothole | Self::RoadDamage | Self::RoadObstruction)
    }

    /// Returns `true` for security-related kinds.
    #[must_use]
    pub const fn is_security(self) -> bool {
        matches!(self, Self::Security)
    }

    /// Returns `true` for fraud-related kinds.
    #[must_use]
    pub const fn is_fraud(self) -> bool {
        matches!(self, Self::Fraud)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pothole,
            Self::RoadDamage,
            Self::RoadObstruction,
            Self::StreetLight,
            Self::Garbage,
            Self::Security,
            Self::Fraud,
            Self::Water,
            Self::Other,
        ]
    }
}

/// A single geotagged incident report, as supplied by the external
/// report-storage collaborator. Read-only input to the analytics core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentEvent {
    /// Storage-assigned record id.
    pub id: i64,
    /// Normalized incident kind.
    pub kind: IncidentKind,
    /// Where the incident was reported.
    pub location: GeoPoint,
    /// Reporter-assessed severity.
    pub severity: IncidentSeverity,
    /// When the incident occurred.
    pub occurred_at: DateTime<Utc>,
}
