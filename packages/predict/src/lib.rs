#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Deterministic prediction rules over recent incidents and risk zones.
//!
//! A fixed, ordered set of rules is evaluated against the recent event
//! window, the current risk zone list, and an explicit `now` timestamp.
//! Each evaluation pass mints fresh alerts; deduplication against
//! previously delivered notifications is the caller's concern.
//!
//! `now` is always a parameter, never an ambient clock read, so every
//! rule is a pure function and deterministically testable.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc, Weekday};
use civic_pulse_cluster::{RiskLevel, RiskZone};
use civic_pulse_geo::GeoPoint;
use civic_pulse_incident_models::{IncidentEvent, IncidentKind, IncidentSeverity};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// How far before December 25 the holiday fraud rule starts firing.
pub const SEASONAL_FRAUD_LEAD_DAYS: i64 = 30;

/// Maximum number of high-risk zones surfaced per evaluation pass.
pub const HIGH_RISK_ZONE_LIMIT: usize = 3;

/// Recency window for zone activity and the road-pattern rule.
pub const ROAD_PATTERN_WINDOW_DAYS: i64 = 7;

/// Recency window for the security-surge rule.
pub const SECURITY_SURGE_WINDOW_DAYS: i64 = 14;

/// Hour of day (24h) from which the weekend-traffic rule applies.
pub const WEEKEND_TRAFFIC_START_HOUR: u32 = 17;

/// Which family of rule produced an alert.
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
pub enum AlertCategory {
    /// Calendar-driven rules (holidays, monsoon season).
    Seasonal,
    /// Rules anchored to a specific risk zone.
    Location,
    /// Rules over the incident-type histogram.
    Pattern,
    /// Rules keyed to day-of-week and hour.
    TimeBased,
}

/// A rule-triggered predictive alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedAlert {
    /// Freshly minted id for this evaluation pass.
    pub id: Uuid,
    /// Which rule family triggered.
    pub category: AlertCategory,
    /// Short display title.
    pub title: String,
    /// Longer human-readable description.
    pub description: String,
    /// Alert severity, reused from the incident severity scale.
    pub severity: IncidentSeverity,
    /// Anchor location, for zone-scoped alerts.
    pub location: Option<GeoPoint>,
    /// Suggested operator action, if the rule has one.
    pub action: Option<String>,
}

fn alert(
    category: AlertCategory,
    severity: IncidentSeverity,
    title: impl Into<String>,
    description: impl Into<String>,
) -> PredictedAlert {
    PredictedAlert {
        id: Uuid::new_v4(),
        category,
        title: title.into(),
        description: description.into(),
        severity,
        location: None,
        action: None,
    }
}

fn count_recent(
    events: &[IncidentEvent],
    now: DateTime<Utc>,
    window_days: i64,
    matches: impl Fn(&IncidentEvent) -> bool,
) -> usize {
    let cutoff = now - TimeDelta::days(window_days);
    events
        .iter()
        .filter(|e| matches(e) && e.occurred_at > cutoff && e.occurred_at <= now)
        .count()
}

/// Holiday fraud rule: November/December, within 30 days before Dec 25.
fn seasonal_fraud(now: DateTime<Utc>) -> Option<PredictedAlert> {
    if !matches!(now.month(), 11 | 12) {
        return None;
    }

    let christmas = NaiveDate::from_ymd_opt(now.year(), 12, 25)?;
    let days_until = (christmas - now.date_naive()).num_days();
    if days_until <= 0 || days_until > SEASONAL_FRAUD_LEAD_DAYS {
        return None;
    }

    let mut a = alert(
        AlertCategory::Seasonal,
        IncidentSeverity::High,
        "Holiday season fraud spike expected",
        format!(
            "Fraud and scam reports historically surge in the weeks before December 25 \
             ({days_until} days away). Expect increased phishing, fake-delivery, and \
             online-shopping scams."
        ),
    );
    a.action = Some("Publish a scam-awareness notice and triage fraud reports daily".to_string());
    Some(a)
}

/// Monsoon pothole rule: June through September, with potholes on record.
fn seasonal_pothole(now: DateTime<Utc>, events: &[IncidentEvent]) -> Option<PredictedAlert> {
    if !(6..=9).contains(&now.month()) {
        return None;
    }
    if !events.iter().any(|e| e.kind == IncidentKind::Pothole) {
        return None;
    }

    let mut a = alert(
        AlertCategory::Seasonal,
        IncidentSeverity::Medium,
        "Rainy-season road deterioration expected",
        "Pothole reports are already coming in and heavy rain accelerates road surface \
         damage. Expect pothole formation to outpace repairs through September.",
    );
    a.action = Some("Schedule preventive road inspections on high-traffic corridors".to_string());
    Some(a)
}

/// High-risk-zone rule: surfaces up to three high zones with recent
/// in-radius activity, one alert per zone.
fn high_risk_zones(
    events: &[IncidentEvent],
    zones: &[RiskZone],
    now: DateTime<Utc>,
) -> Vec<PredictedAlert> {
    zones
        .iter()
        .filter(|zone| zone.risk_level == RiskLevel::High)
        .filter(|zone| {
            count_recent(events, now, ROAD_PATTERN_WINDOW_DAYS, |e| {
                zone.contains(e.location)
            }) > 0
        })
        .take(HIGH_RISK_ZONE_LIMIT)
        .map(|zone| {
            let mut a = alert(
                AlertCategory::Location,
                IncidentSeverity::High,
                format!("Sustained activity in {} risk zone", zone.dominant_kind.as_ref()),
                format!(
                    "A cluster of {} incidents (mostly {}) remains active with new \
                     reports in the last {ROAD_PATTERN_WINDOW_DAYS} days.",
                    zone.size,
                    zone.dominant_kind.as_ref(),
                ),
            );
            a.location = Some(zone.centroid);
            a.action = Some("Prioritize this zone for inspection or patrol".to_string());
            a
        })
        .collect()
}

/// Road-accessibility pattern: 3+ road events total, 2+ in the last week.
fn road_pattern(events: &[IncidentEvent], now: DateTime<Utc>) -> Option<PredictedAlert> {
    let total = events.iter().filter(|e| e.kind.is_road_related()).count();
    let recent = count_recent(events, now, ROAD_PATTERN_WINDOW_DAYS, |e| {
        e.kind.is_road_related()
    });

    if total < 3 || recent < 2 {
        return None;
    }

    let mut a = alert(
        AlertCategory::Pattern,
        IncidentSeverity::Medium,
        "Road accessibility is deteriorating",
        format!(
            "{total} road-related reports on record, {recent} of them within the last \
             {ROAD_PATTERN_WINDOW_DAYS} days. Accessibility problems are accelerating."
        ),
    );
    a.action = Some("Bundle open road reports into a single maintenance work order".to_string());
    Some(a)
}

/// Security surge pattern: 5+ security events total, 3+ in two weeks.
fn security_surge(events: &[IncidentEvent], now: DateTime<Utc>) -> Option<PredictedAlert> {
    let total = events.iter().filter(|e| e.kind.is_security()).count();
    let recent = count_recent(events, now, SECURITY_SURGE_WINDOW_DAYS, |e| {
        e.kind.is_security()
    });

    if total < 5 || recent < 3 {
        return None;
    }

    let mut a = alert(
        AlertCategory::Pattern,
        IncidentSeverity::High,
        "Security incident surge detected",
        format!(
            "{total} security reports on record, {recent} of them within the last \
             {SECURITY_SURGE_WINDOW_DAYS} days."
        ),
    );
    a.action = Some("Notify local enforcement and increase evening patrols".to_string());
    Some(a)
}

/// Weekend-traffic rule: Friday/Saturday evenings with road issues open.
fn weekend_traffic(events: &[IncidentEvent], now: DateTime<Utc>) -> Option<PredictedAlert> {
    if !matches!(now.weekday(), Weekday::Fri | Weekday::Sat) {
        return None;
    }
    if now.hour() < WEEKEND_TRAFFIC_START_HOUR {
        return None;
    }
    if !events.iter().any(|e| e.kind.is_road_related()) {
        return None;
    }

    Some(alert(
        AlertCategory::TimeBased,
        IncidentSeverity::Low,
        "Weekend evening congestion likely",
        "Open road-accessibility reports will worsen weekend evening traffic. \
         Expect slower response times in affected corridors.",
    ))
}

/// Evaluates every rule against the supplied inputs and returns triggered
/// alerts sorted by descending severity; ties keep rule-evaluation order.
///
/// Rules that find no match simply emit nothing; empty inputs produce an
/// empty list, never an error.
#[must_use]
pub fn generate_predictions(
    recent_events: &[IncidentEvent],
    risk_zones: &[RiskZone],
    now: DateTime<Utc>,
) -> Vec<PredictedAlert> {
    let mut alerts = Vec::new();

    alerts.extend(seasonal_fraud(now));
    alerts.extend(seasonal_pothole(now, recent_events));
    alerts.extend(high_risk_zones(recent_events, risk_zones, now));
    alerts.extend(road_pattern(recent_events, now));
    alerts.extend(security_surge(recent_events, now));
    alerts.extend(weekend_traffic(recent_events, now));

    log::debug!(
        "Prediction pass over {} events and {} zones produced {} alerts",
        recent_events.len(),
        risk_zones.len(),
        alerts.len()
    );

    // Stable sort: equal severities keep rule-evaluation order.
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use civic_pulse_cluster::RISK_ZONE_RADIUS_METERS;

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn event_at(
        id: i64,
        kind: IncidentKind,
        occurred_at: DateTime<Utc>,
    ) -> IncidentEvent {
        IncidentEvent {
            id,
            kind,
            location: GeoPoint::new(41.8781, -87.6298).unwrap(),
            severity: IncidentSeverity::Medium,
            occurred_at,
        }
    }

    fn high_zone(centroid: GeoPoint) -> RiskZone {
        RiskZone {
            centroid,
            member_ids: vec![1, 2, 3, 4, 5],
            size: 5,
            risk_level: RiskLevel::High,
            dominant_kind: IncidentKind::Security,
            radius_meters: RISK_ZONE_RADIUS_METERS,
        }
    }

    #[test]
    fn empty_inputs_produce_no_alerts() {
        // A neutral date: a Wednesday in March, nowhere near any season.
        let now = at(2025, 3, 12, 10);
        assert!(generate_predictions(&[], &[], now).is_empty());
    }

    #[test]
    fn december_produces_exactly_one_seasonal_alert() {
        // Ten days before December 25.
        let now = at(2024, 12, 15, 10);
        let alerts = generate_predictions(&[], &[], now);

        let seasonal: Vec<_> = alerts
            .iter()
            .filter(|a| a.category == AlertCategory::Seasonal)
            .collect();
        assert_eq!(seasonal.len(), 1);
        assert_eq!(seasonal[0].severity, IncidentSeverity::High);
    }

    #[test]
    fn fraud_rule_respects_the_30_day_lead() {
        // November 1 is 54 days out: month matches but the lead doesn't.
        assert!(seasonal_fraud(at(2024, 11, 1, 10)).is_none());
        // November 30 is 25 days out.
        assert!(seasonal_fraud(at(2024, 11, 30, 10)).is_some());
        // December 25 itself and later don't fire.
        assert!(seasonal_fraud(at(2024, 12, 25, 10)).is_none());
        assert!(seasonal_fraud(at(2024, 12, 28, 10)).is_none());
    }

    #[test]
    fn pothole_rule_fires_in_monsoon_months_with_reports() {
        let now = at(2025, 7, 10, 9);
        let events = vec![event_at(1, IncidentKind::Pothole, now - TimeDelta::days(2))];

        let alerts = generate_predictions(&events, &[], now);
        assert!(alerts.iter().any(|a| a.category == AlertCategory::Seasonal
            && a.severity == IncidentSeverity::Medium));

        // Same events in March: no seasonal alert.
        assert!(seasonal_pothole(at(2025, 3, 10, 9), &events).is_none());
    }

    #[test]
    fn high_risk_zone_needs_recent_in_radius_activity() {
        let now = at(2025, 3, 12, 10);
        let centroid = GeoPoint::new(41.8781, -87.6298).unwrap();
        let zone = high_zone(centroid);

        // Event inside the zone but 30 days old: no alert.
        let stale = vec![event_at(1, IncidentKind::Security, now - TimeDelta::days(30))];
        assert!(high_risk_zones(&stale, std::slice::from_ref(&zone), now).is_empty());

        // Fresh in-radius event: one alert anchored at the centroid.
        let fresh = vec![event_at(1, IncidentKind::Security, now - TimeDelta::days(1))];
        let alerts = high_risk_zones(&fresh, std::slice::from_ref(&zone), now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].location, Some(centroid));
        assert_eq!(alerts[0].category, AlertCategory::Location);
    }

    #[test]
    fn at_most_three_zone_alerts_per_pass() {
        let now = at(2025, 3, 12, 10);
        let fresh = vec![event_at(1, IncidentKind::Security, now - TimeDelta::days(1))];
        let zones: Vec<RiskZone> = (0..5)
            .map(|_| high_zone(GeoPoint::new(41.8781, -87.6298).unwrap()))
            .collect();

        assert_eq!(high_risk_zones(&fresh, &zones, now).len(), HIGH_RISK_ZONE_LIMIT);
    }

    #[test]
    fn road_pattern_requires_total_and_recent_counts() {
        let now = at(2025, 3, 12, 10);

        // Three road events but only one recent: no alert.
        let mostly_stale = vec![
            event_at(1, IncidentKind::Pothole, now - TimeDelta::days(20)),
            event_at(2, IncidentKind::RoadDamage, now - TimeDelta::days(15)),
            event_at(3, IncidentKind::RoadObstruction, now - TimeDelta::days(1)),
        ];
        assert!(road_pattern(&mostly_stale, now).is_none());

        // Two recent out of three total: alert.
        let active = vec![
            event_at(1, IncidentKind::Pothole, now - TimeDelta::days(20)),
            event_at(2, IncidentKind::RoadDamage, now - TimeDelta::days(3)),
            event_at(3, IncidentKind::RoadObstruction, now - TimeDelta::days(1)),
        ];
        let alert = road_pattern(&active, now).unwrap();
        assert_eq!(alert.category, AlertCategory::Pattern);
        assert_eq!(alert.severity, IncidentSeverity::Medium);
    }

    #[test]
    fn security_surge_requires_five_total_three_recent() {
        let now = at(2025, 3, 12, 10);
        let mut events: Vec<IncidentEvent> = (0..4)
            .map(|i| event_at(i, IncidentKind::Security, now - TimeDelta::days(20)))
            .collect();
        events.push(event_at(10, IncidentKind::Security, now - TimeDelta::days(1)));
        events.push(event_at(11, IncidentKind::Security, now - TimeDelta::days(2)));

        // Six total but only two recent.
        assert!(security_surge(&events, now).is_none());

        events.push(event_at(12, IncidentKind::Security, now - TimeDelta::days(3)));
        let alert = security_surge(&events, now).unwrap();
        assert_eq!(alert.severity, IncidentSeverity::High);
    }

    #[test]
    fn weekend_traffic_fires_friday_evening_only() {
        // 2025-03-14 is a Friday.
        let friday_evening = at(2025, 3, 14, 18);
        let friday_morning = at(2025, 3, 14, 9);
        let wednesday_evening = at(2025, 3, 12, 18);

        let events = vec![event_at(1, IncidentKind::Pothole, friday_morning)];

        assert!(weekend_traffic(&events, friday_evening).is_some());
        assert!(weekend_traffic(&events, friday_morning).is_none());
        assert!(weekend_traffic(&events, wednesday_evening).is_none());
        assert!(weekend_traffic(&[], friday_evening).is_none());
    }

    #[test]
    fn alerts_are_sorted_by_descending_severity() {
        // Friday evening in July with road events: pothole (medium), road
        // pattern (medium), and weekend traffic (low) all fire.
        let now = at(2025, 7, 11, 19);
        let events = vec![
            event_at(1, IncidentKind::Pothole, now - TimeDelta::days(1)),
            event_at(2, IncidentKind::Pothole, now - TimeDelta::days(2)),
            event_at(3, IncidentKind::RoadDamage, now - TimeDelta::days(10)),
        ];

        let alerts = generate_predictions(&events, &[], now);
        assert!(alerts.len() >= 3);
        for pair in alerts.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        assert_eq!(alerts[alerts.len() - 1].category, AlertCategory::TimeBased);
    }
}
