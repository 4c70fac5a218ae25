#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Proximity clustering and risk zone classification.
//!
//! A single [`ProximityClusterer`] parameterized by a distance threshold
//! replaces the two clustering paths the system previously had (grid-snap
//! rounding for pollution, explicit distance merging for incidents).
//! Clustering is a single online pass: each point joins the nearest
//! existing cluster within the threshold or seeds a new one, with the
//! centroid maintained as the running mean of member coordinates.
//!
//! A clusterer is built fresh per run and holds no state across runs.
//! Freezing is expressed through ownership: [`ProximityClusterer::finish`]
//! consumes the accumulator, so no further points can be added to its
//! output.

use std::collections::BTreeMap;

use civic_pulse_air_quality::score_reading;
use civic_pulse_geo::{GeoPoint, distance_meters};
use civic_pulse_incident_models::{IncidentEvent, IncidentKind, IncidentSeverity};
use civic_pulse_pollution_models::PollutionReading;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Merge threshold for incident clustering.
pub const INCIDENT_CLUSTER_THRESHOLD_METERS: f64 = 1_000.0;

/// Merge threshold for pollution reading clustering.
pub const POLLUTION_CLUSTER_THRESHOLD_METERS: f64 = 2_000.0;

/// Fixed display radius assigned to every risk zone. This is a
/// presentation value, not a measure of actual point spread.
pub const RISK_ZONE_RADIUS_METERS: f64 = 2_000.0;

/// Discrete risk tier assigned to a cluster of incidents.
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
pub enum RiskLevel {
    /// Small, low-severity cluster.
    Low,
    /// Cluster of 3+ events or containing a high-severity event.
    Medium,
    /// Cluster of 5+ events or containing 2+ high-severity events.
    High,
}

/// A frozen cluster: centroid, member ids in insertion order, and size.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Arithmetic mean of member coordinates.
    pub centroid: GeoPoint,
    /// Member record ids, in the order they were consumed.
    pub member_ids: Vec<i64>,
    /// Number of members.
    pub size: usize,
}

/// A cluster of incidents with its risk classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskZone {
    /// Arithmetic mean of member coordinates.
    pub centroid: GeoPoint,
    /// Member event ids, in the order they were consumed.
    pub member_ids: Vec<i64>,
    /// Number of member events.
    pub size: usize,
    /// Discrete risk tier from the size/severity rules.
    pub risk_level: RiskLevel,
    /// Most frequent incident kind among members. Ties resolve to the
    /// kind encountered first in input order, so callers should supply a
    /// consistent ordering (typically reverse-chronological).
    pub dominant_kind: IncidentKind,
    /// Fixed display radius in meters.
    pub radius_meters: f64,
}

impl RiskZone {
    /// Returns `true` if `point` falls within this zone's display radius.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        distance_meters(self.centroid, point) <= self.radius_meters
    }
}

/// A cluster of pollution readings with aggregate AQI figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutionZone {
    /// Arithmetic mean of member coordinates.
    pub centroid: GeoPoint,
    /// Member reading ids, in the order they were consumed.
    pub member_ids: Vec<i64>,
    /// Number of member readings.
    pub size: usize,
    /// Worst member AQI.
    pub max_aqi: u32,
    /// Mean member AQI.
    pub avg_aqi: f64,
}

/// Running accumulator for one cluster.
struct ClusterAccum {
    centroid: GeoPoint,
    lat_sum: f64,
    lng_sum: f64,
    member_ids: Vec<i64>,
}

impl ClusterAccum {
    fn seeded(location: GeoPoint, id: i64) -> Self {
        Self {
            centroid: location,
            lat_sum: location.lat(),
            lng_sum: location.lng(),
            member_ids: vec![id],
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn absorb(&mut self, location: GeoPoint, id: i64) {
        self.lat_sum += location.lat();
        self.lng_sum += location.lng();
        self.member_ids.push(id);
        let n = self.member_ids.len() as f64;
        // A mean of in-range coordinates is itself in range, so the
        // previous centroid only ever stands in for a degenerate sum.
        self.centroid =
            GeoPoint::new(self.lat_sum / n, self.lng_sum / n).unwrap_or(self.centroid);
    }
}

/// Online distance-threshold clusterer over geotagged records.
///
/// Starts empty, accumulates points one at a time, and freezes into a
/// list of [`Cluster`]s sorted by descending member count when
/// [`finish`](Self::finish) consumes it.
pub struct ProximityClusterer {
    threshold_meters: f64,
    clusters: Vec<ClusterAccum>,
}

impl ProximityClusterer {
    /// Creates an empty clusterer with the given merge threshold.
    #[must_use]
    pub const fn new(threshold_meters: f64) -> Self {
        Self {
            threshold_meters,
            clusters: Vec::new(),
        }
    }

    /// Number of clusters accumulated so far.
    #[must_use]
    pub const fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Consumes one point: joins the nearest cluster within the threshold
    /// or seeds a new singleton cluster.
    pub fn push(&mut self, location: GeoPoint, id: i64) {
        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in self.clusters.iter().enumerate() {
            let d = distance_meters(cluster.centroid, location);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((idx, d));
            }
        }

        match best {
            Some((idx, d)) if d <= self.threshold_meters => {
                self.clusters[idx].absorb(location, id);
            }
            _ => self.clusters.push(ClusterAccum::seeded(location, id)),
        }
    }

    /// Freezes the run, returning clusters sorted by descending member
    /// count (stable, so equal-sized clusters keep creation order).
    #[must_use]
    pub fn finish(mut self) -> Vec<Cluster> {
        self.clusters
            .sort_by(|a, b| b.member_ids.len().cmp(&a.member_ids.len()));

        self.clusters
            .into_iter()
            .map(|accum| Cluster {
                centroid: accum.centroid,
                size: accum.member_ids.len(),
                member_ids: accum.member_ids,
            })
            .collect()
    }
}

/// Applies the size/severity rules to one cluster's member composition.
const fn risk_level(size: usize, high_severity_count: usize) -> RiskLevel {
    if size >= 5 || high_severity_count >= 2 {
        RiskLevel::High
    } else if size >= 3 || high_severity_count >= 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Most frequent kind among members, first-encountered winning ties.
fn dominant_kind(kinds: &[IncidentKind]) -> IncidentKind {
    let mut counts: Vec<(IncidentKind, usize)> = Vec::new();
    for kind in kinds {
        match counts.iter_mut().find(|(k, _)| k == kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((*kind, 1)),
        }
    }

    let mut best = (IncidentKind::Other, 0);
    for (kind, count) in counts {
        if count > best.1 {
            best = (kind, count);
        }
    }
    best.0
}

/// Clusters incident events and classifies each cluster into a
/// [`RiskZone`], sorted by descending size.
///
/// Zero input events produce an empty list, never an error.
#[must_use]
pub fn cluster_events(events: &[IncidentEvent], threshold_meters: f64) -> Vec<RiskZone> {
    let by_id: BTreeMap<i64, &IncidentEvent> = events.iter().map(|e| (e.id, e)).collect();

    let mut clusterer = ProximityClusterer::new(threshold_meters);
    for event in events {
        clusterer.push(event.location, event.id);
    }

    clusterer
        .finish()
        .into_iter()
        .map(|cluster| {
            let members: Vec<&IncidentEvent> = cluster
                .member_ids
                .iter()
                .filter_map(|id| by_id.get(id).copied())
                .collect();

            let high_count = members
                .iter()
                .filter(|e| e.severity == IncidentSeverity::High)
                .count();
            let kinds: Vec<IncidentKind> = members.iter().map(|e| e.kind).collect();

            RiskZone {
                centroid: cluster.centroid,
                size: cluster.size,
                member_ids: cluster.member_ids,
                risk_level: risk_level(members.len(), high_count),
                dominant_kind: dominant_kind(&kinds),
                radius_meters: RISK_ZONE_RADIUS_METERS,
            }
        })
        .collect()
}

/// Clusters pollution readings into [`PollutionZone`]s, sorted by
/// descending size.
///
/// Readings that cannot be scored (no concentrations and no raw AQI) are
/// skipped with a warning rather than aborting the batch. Zero usable
/// readings produce an empty list.
#[must_use]
pub fn cluster_readings(readings: &[PollutionReading], threshold_meters: f64) -> Vec<PollutionZone> {
    let mut aqi_by_id: BTreeMap<i64, u32> = BTreeMap::new();
    let mut clusterer = ProximityClusterer::new(threshold_meters);

    for reading in readings {
        match score_reading(reading) {
            Ok(scored) => {
                aqi_by_id.insert(reading.id, scored.aqi);
                clusterer.push(reading.location, reading.id);
            }
            Err(e) => {
                log::warn!("Skipping unscorable pollution reading: {e}");
            }
        }
    }

    clusterer
        .finish()
        .into_iter()
        .map(|cluster| {
            let aqis: Vec<u32> = cluster
                .member_ids
                .iter()
                .filter_map(|id| aqi_by_id.get(id).copied())
                .collect();

            let max_aqi = aqis.iter().copied().max().unwrap_or(0);
            #[allow(clippy::cast_precision_loss)]
            let avg_aqi = if aqis.is_empty() {
                0.0
            } else {
                f64::from(aqis.iter().sum::<u32>()) / aqis.len() as f64
            };

            PollutionZone {
                centroid: cluster.centroid,
                size: cluster.size,
                member_ids: cluster.member_ids,
                max_aqi,
                avg_aqi,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use civic_pulse_pollution_models::ReadingSource;

    use super::*;

    fn ts(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    fn event(id: i64, lat: f64, lng: f64, kind: IncidentKind, severity: IncidentSeverity) -> IncidentEvent {
        IncidentEvent {
            id,
            kind,
            location: GeoPoint::new(lat, lng).unwrap(),
            severity,
            occurred_at: ts(id),
        }
    }

    fn reading(id: i64, lat: f64, lng: f64, pm25: Option<f64>) -> PollutionReading {
        PollutionReading {
            id,
            location: GeoPoint::new(lat, lng).unwrap(),
            aqi: None,
            pm25,
            pm10: None,
            o3: None,
            no2: None,
            so2: None,
            co: None,
            source: ReadingSource::Api,
            measured_at: ts(id),
        }
    }

    #[test]
    fn empty_input_yields_empty_cluster_list() {
        assert!(cluster_events(&[], INCIDENT_CLUSTER_THRESHOLD_METERS).is_empty());
        assert!(cluster_readings(&[], POLLUTION_CLUSTER_THRESHOLD_METERS).is_empty());
    }

    #[test]
    fn nearby_events_form_one_high_risk_cluster() {
        // Five events within ~500 m of each other, two high severity.
        let events = vec![
            event(1, 41.8781, -87.6298, IncidentKind::Pothole, IncidentSeverity::High),
            event(2, 41.8790, -87.6300, IncidentKind::Pothole, IncidentSeverity::Low),
            event(3, 41.8800, -87.6310, IncidentKind::Garbage, IncidentSeverity::Medium),
            event(4, 41.8795, -87.6290, IncidentKind::Pothole, IncidentSeverity::High),
            event(5, 41.8785, -87.6305, IncidentKind::StreetLight, IncidentSeverity::Low),
        ];

        let zones = cluster_events(&events, 1_000.0);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].size, 5);
        assert_eq!(zones[0].risk_level, RiskLevel::High);
        assert_eq!(zones[0].dominant_kind, IncidentKind::Pothole);
        assert!((zones[0].radius_meters - RISK_ZONE_RADIUS_METERS).abs() < f64::EPSILON);
    }

    #[test]
    fn distant_events_stay_separate() {
        // Chicago and New York are far beyond any reasonable threshold.
        let events = vec![
            event(1, 41.8781, -87.6298, IncidentKind::Pothole, IncidentSeverity::Low),
            event(2, 40.7128, -74.0060, IncidentKind::Pothole, IncidentSeverity::Low),
        ];

        let zones = cluster_events(&events, 1_000.0);
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.size == 1));
        assert!(zones.iter().all(|z| z.risk_level == RiskLevel::Low));
    }

    #[test]
    fn cluster_count_is_order_invariant() {
        let mut events = vec![
            event(1, 41.8781, -87.6298, IncidentKind::Pothole, IncidentSeverity::Low),
            event(2, 41.8782, -87.6299, IncidentKind::Pothole, IncidentSeverity::Low),
            event(3, 40.7128, -74.0060, IncidentKind::Security, IncidentSeverity::High),
            event(4, 40.7129, -74.0061, IncidentKind::Security, IncidentSeverity::High),
        ];

        let forward = cluster_events(&events, 1_000.0);
        events.reverse();
        let backward = cluster_events(&events, 1_000.0);

        assert_eq!(forward.len(), backward.len());

        let mut forward_members: Vec<Vec<i64>> = forward
            .iter()
            .map(|z| {
                let mut ids = z.member_ids.clone();
                ids.sort_unstable();
                ids
            })
            .collect();
        let mut backward_members: Vec<Vec<i64>> = backward
            .iter()
            .map(|z| {
                let mut ids = z.member_ids.clone();
                ids.sort_unstable();
                ids
            })
            .collect();
        forward_members.sort();
        backward_members.sort();
        assert_eq!(forward_members, backward_members);
    }

    #[test]
    fn one_high_severity_event_raises_pair_to_medium() {
        let events = vec![
            event(1, 41.8781, -87.6298, IncidentKind::Security, IncidentSeverity::High),
            event(2, 41.8782, -87.6299, IncidentKind::Garbage, IncidentSeverity::Low),
        ];

        let zones = cluster_events(&events, 1_000.0);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn dominant_kind_tie_goes_to_first_encountered() {
        let events = vec![
            event(1, 41.8781, -87.6298, IncidentKind::Garbage, IncidentSeverity::Low),
            event(2, 41.8782, -87.6299, IncidentKind::Pothole, IncidentSeverity::Low),
        ];

        let zones = cluster_events(&events, 1_000.0);
        assert_eq!(zones[0].dominant_kind, IncidentKind::Garbage);
    }

    #[test]
    fn zones_are_sorted_by_descending_size() {
        let events = vec![
            event(1, 40.7128, -74.0060, IncidentKind::Security, IncidentSeverity::Low),
            event(2, 41.8781, -87.6298, IncidentKind::Pothole, IncidentSeverity::Low),
            event(3, 41.8782, -87.6299, IncidentKind::Pothole, IncidentSeverity::Low),
            event(4, 41.8783, -87.6297, IncidentKind::Pothole, IncidentSeverity::Low),
        ];

        let zones = cluster_events(&events, 1_000.0);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].size, 3);
        assert_eq!(zones[1].size, 1);
    }

    #[test]
    fn centroid_is_mean_of_member_coordinates() {
        let events = vec![
            event(1, 41.0, -87.0, IncidentKind::Pothole, IncidentSeverity::Low),
            event(2, 41.002, -87.002, IncidentKind::Pothole, IncidentSeverity::Low),
        ];

        let zones = cluster_events(&events, 1_000.0);
        assert_eq!(zones.len(), 1);
        assert!((zones[0].centroid.lat() - 41.001).abs() < 1e-9);
        assert!((zones[0].centroid.lng() - -87.001).abs() < 1e-9);
    }

    #[test]
    fn unscorable_readings_are_skipped_not_fatal() {
        let readings = vec![
            reading(1, 41.0, -87.0, Some(40.0)),
            reading(2, 41.001, -87.001, None),
            reading(3, 41.002, -87.002, Some(10.0)),
        ];

        let zones = cluster_readings(&readings, POLLUTION_CLUSTER_THRESHOLD_METERS);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].size, 2);
        assert_eq!(zones[0].member_ids, vec![1, 3]);
    }

    #[test]
    fn pollution_zone_aggregates_member_aqi() {
        // PM2.5 40 → AQI 111, PM2.5 10 → AQI 41.
        let readings = vec![
            reading(1, 41.0, -87.0, Some(40.0)),
            reading(2, 41.001, -87.001, Some(10.0)),
        ];

        let zones = cluster_readings(&readings, POLLUTION_CLUSTER_THRESHOLD_METERS);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].max_aqi, 111);
        assert!((zones[0].avg_aqi - 76.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clusterer_reports_cluster_count_while_accumulating() {
        let mut clusterer = ProximityClusterer::new(1_000.0);
        assert_eq!(clusterer.cluster_count(), 0);
        clusterer.push(GeoPoint::new(41.0, -87.0).unwrap(), 1);
        assert_eq!(clusterer.cluster_count(), 1);
        clusterer.push(GeoPoint::new(41.0001, -87.0001).unwrap(), 2);
        assert_eq!(clusterer.cluster_count(), 1);
        clusterer.push(GeoPoint::new(45.0, -90.0).unwrap(), 3);
        assert_eq!(clusterer.cluster_count(), 2);
    }
}
