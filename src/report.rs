//! Risk Assessment Report
//!
//! Flattens one pipeline run into the record handed to downstream
//! work-order tooling: the matched events, the impact aggregate, the ranked
//! at-risk assets and a recommended maintenance priority.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::engine::impact::affected_asset_types;
use crate::engine::predictor::round_to;
use crate::types::{Criticality, ImpactSummary, QueryEvent, RiskResult, SimilarEvent};

/// Priority of the inspection work the assessment calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl MaintenancePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenancePriority::Low => "LOW",
            MaintenancePriority::Medium => "MEDIUM",
            MaintenancePriority::High => "HIGH",
            MaintenancePriority::Critical => "CRITICAL",
        }
    }

    /// Priority implied by an asset's criticality (unrecognized labels map to Medium).
    pub fn from_criticality(criticality: &Criticality) -> Self {
        match criticality {
            Criticality::Low => MaintenancePriority::Low,
            Criticality::Medium | Criticality::Unrecognized(_) => MaintenancePriority::Medium,
            Criticality::High => MaintenancePriority::High,
            Criticality::Critical => MaintenancePriority::Critical,
        }
    }

    /// Highest tier among `assets`, or `Low` when there are none.
    pub fn for_assets(assets: &[RiskResult]) -> Self {
        assets
            .iter()
            .map(|a| Self::from_criticality(&a.criticality))
            .max()
            .unwrap_or(MaintenancePriority::Low)
    }
}

impl std::fmt::Display for MaintenancePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A matched historical event as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: i64,
    /// Rounded to 3 decimals
    pub distance: f64,
    pub date: NaiveDateTime,
    pub event_type: String,
    pub severity: String,
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub precipitation_mm: f64,
    pub summary: String,
}

/// Incident counts per damage severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentStatistics {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl IncidentStatistics {
    /// Fold `by_damage_severity` into the four tiers. Labels match case-insensitively;
    /// anything else is not counted here.
    pub fn from_summary(summary: &ImpactSummary) -> Self {
        let mut stats = Self::default();
        for (label, &count) in &summary.by_damage_severity {
            match label.trim().to_ascii_lowercase().as_str() {
                "critical" => stats.critical += count,
                "high" => stats.high += count,
                "medium" => stats.medium += count,
                "low" => stats.low += count,
                _ => {}
            }
        }
        stats
    }
}

/// Outcome of one end-to-end assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub query: QueryEvent,
    pub events: Vec<EventSummary>,
    pub impact: ImpactSummary,
    pub affected_asset_types: Vec<String>,
    pub estimated_downtime_hours: f64,
    pub estimated_repair_cost: f64,
    pub incident_statistics: IncidentStatistics,
    pub number_of_at_risk_assets: usize,
    pub top_at_risk_assets: Vec<RiskResult>,
    pub recommended_priority: MaintenancePriority,
    /// Codes of `top_at_risk_assets`, in rank order
    pub inspection_assets: Vec<String>,
}

impl RiskAssessment {
    /// Assemble the report. `similar` ids are resolved against `dataset`,
    /// the snapshot the search ran on.
    pub fn build(
        query: &QueryEvent,
        dataset: &Dataset,
        similar: &[SimilarEvent],
        impact: ImpactSummary,
        at_risk: Vec<RiskResult>,
        top_at_risk: usize,
    ) -> Self {
        let events = similar
            .iter()
            .filter_map(|s| {
                let e = dataset.event(s.event_id)?;
                Some(EventSummary {
                    event_id: e.event_id,
                    distance: round_to(s.distance, 3),
                    date: e.date,
                    event_type: e.event_type.clone(),
                    severity: e.severity.clone(),
                    temperature_c: e.features.temperature_c,
                    wind_speed_kmh: e.features.wind_speed_kmh,
                    precipitation_mm: e.features.precipitation_mm,
                    summary: e.summary_line(),
                })
            })
            .collect();

        let number_of_at_risk_assets = at_risk.len();
        let top_at_risk_assets: Vec<RiskResult> = at_risk.into_iter().take(top_at_risk).collect();

        Self {
            query: query.clone(),
            events,
            affected_asset_types: affected_asset_types(&impact),
            estimated_downtime_hours: impact.total_downtime_hours,
            estimated_repair_cost: impact.total_estimated_cost,
            incident_statistics: IncidentStatistics::from_summary(&impact),
            number_of_at_risk_assets,
            recommended_priority: MaintenancePriority::for_assets(&top_at_risk_assets),
            inspection_assets: top_at_risk_assets.iter().map(|r| r.code.clone()).collect(),
            top_at_risk_assets,
            impact,
        }
    }

    /// The one-line summaries of the matched events.
    pub fn event_lines(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.summary.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn result(code: &str, criticality: Criticality, score: f64) -> RiskResult {
        RiskResult {
            code: code.to_string(),
            name: code.to_string(),
            asset_type: "Pole".to_string(),
            category: "Electrical".to_string(),
            risk_score: score,
            criticality,
            condition_score: 5.0,
            age_years: 10.0,
            installation_date: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            historical_incident_count: 1,
        }
    }

    #[test]
    fn test_priority_is_highest_criticality() {
        let assets = vec![
            result("A", Criticality::Low, 9.0),
            result("B", Criticality::High, 8.0),
            result("C", Criticality::Medium, 7.0),
        ];
        assert_eq!(MaintenancePriority::for_assets(&assets), MaintenancePriority::High);
        assert_eq!(MaintenancePriority::for_assets(&[]), MaintenancePriority::Low);
        assert_eq!(
            MaintenancePriority::for_assets(&[result("X", Criticality::Unrecognized("Vital".into()), 1.0)]),
            MaintenancePriority::Medium
        );
    }

    #[test]
    fn test_priority_serializes_uppercase() {
        let json = serde_json::to_string(&MaintenancePriority::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_incident_statistics_fold() {
        let mut by_damage_severity = BTreeMap::new();
        by_damage_severity.insert("High".to_string(), 3);
        by_damage_severity.insert("critical".to_string(), 1);
        by_damage_severity.insert("Minor".to_string(), 7);
        let summary = ImpactSummary {
            by_damage_severity,
            ..ImpactSummary::default()
        };
        let stats = IncidentStatistics::from_summary(&summary);
        assert_eq!(
            stats,
            IncidentStatistics {
                critical: 1,
                high: 3,
                medium: 0,
                low: 0
            }
        );
    }

    #[test]
    fn test_build_truncates_and_counts() {
        let dataset = Dataset::empty();
        let at_risk: Vec<RiskResult> = (0..15)
            .map(|i| result(&format!("P{i:02}"), Criticality::Low, 20.0 - i as f64))
            .collect();
        let query = QueryEvent::from(crate::types::WeatherFeatures {
            temperature_c: 1.0,
            wind_speed_kmh: 2.0,
            precipitation_mm: 3.0,
            humidity_percent: 4.0,
            duration_hours: 5.0,
        });
        let report = RiskAssessment::build(&query, &dataset, &[], ImpactSummary::default(), at_risk, 10);
        assert_eq!(report.number_of_at_risk_assets, 15);
        assert_eq!(report.top_at_risk_assets.len(), 10);
        assert_eq!(report.inspection_assets[0], "P00");
        assert_eq!(report.recommended_priority, MaintenancePriority::Low);
        assert!(report.events.is_empty());
    }
}
