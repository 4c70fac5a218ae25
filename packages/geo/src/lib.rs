#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic coordinate type and geodesic distance math.
//!
//! [`GeoPoint`] is the validated coordinate value object used across the
//! whole system. All distance computation goes through [`distance_meters`]
//! so every consumer (clustering, zone matching) agrees on the same
//! geodesic model.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated WGS84 coordinate pair.
///
/// Construction rejects out-of-range values rather than clamping, so a
/// `GeoPoint` in hand is always a usable coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint", rename_all = "camelCase")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

/// Unvalidated mirror of [`GeoPoint`] used as the serde intermediate so
/// deserialization goes through the same range check as [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeoPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = InvalidCoordinateError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl GeoPoint {
    /// Creates a coordinate pair from decimal degrees.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if `lat` is outside [-90, 90],
    /// `lng` is outside [-180, 180], or either value is non-finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinateError> {
        if !lat.is_finite()
            || !lng.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
        {
            return Err(InvalidCoordinateError { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }
}

/// Error returned when a latitude/longitude pair is outside the valid
/// WGS84 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinateError {
    /// The rejected latitude value.
    pub lat: f64,
    /// The rejected longitude value.
    pub lng: f64,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinate ({}, {}): expected lat in [-90, 90] and lng in [-180, 180]",
            self.lat, self.lng
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// Great-circle distance between two coordinates in meters, using the
/// haversine formula.
#[must_use]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    // Floating-point overshoot can push h a hair past 1.0 for
    // near-antipodal pairs, which would take sqrt/asin out of domain.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(GeoPoint::new(90.1, 0.0).is_err());
        assert!(GeoPoint::new(-90.1, 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(GeoPoint::new(0.0, 180.1).is_err());
        assert!(GeoPoint::new(0.0, -180.1).is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = point(41.8781, -87.6298);
        assert!(distance_meters(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(41.8781, -87.6298);
        let b = point(40.7128, -74.0060);
        let ab = distance_meters(a, b);
        let ba = distance_meters(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = point(0.0, 0.0);
        let b = point(1.0, 0.0);
        let d = distance_meters(a, b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 180.0);
        let d = distance_meters(a, b);
        assert!(d.is_finite());
        // Half the Earth's circumference.
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn deserialization_validates_range() {
        let ok: Result<GeoPoint, _> = serde_json::from_str(r#"{"lat": 41.0, "lng": -87.0}"#);
        assert!(ok.is_ok());
        let bad: Result<GeoPoint, _> = serde_json::from_str(r#"{"lat": 91.0, "lng": 0.0}"#);
        assert!(bad.is_err());
    }
}
