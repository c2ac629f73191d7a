//! Engine outputs: similarity matches, impact aggregates and per-asset risk.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Criticality;

/// One neighbour returned by the similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarEvent {
    pub event_id: i64,
    /// Euclidean distance in normalized feature space
    pub distance: f64,
}

/// An asset that appeared repeatedly in the matched incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskAsset {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub incident_count: usize,
    pub criticality: Criticality,
}

/// Damage-pattern statistics over the incidents of a set of historical events.
///
/// Maps are ordered by key so serialized output is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub total_incidents: usize,
    pub unique_assets: usize,
    pub by_asset_type: BTreeMap<String, usize>,
    pub by_criticality: BTreeMap<String, usize>,
    pub by_damage_severity: BTreeMap<String, usize>,
    /// Most frequently affected assets, most incidents first
    pub high_risk_assets: Vec<HighRiskAsset>,
    pub total_estimated_cost: f64,
    pub total_downtime_hours: f64,
}

impl ImpactSummary {
    /// True when no incident matched.
    pub fn is_empty(&self) -> bool {
        self.total_incidents == 0
    }
}

/// Predicted vulnerability of a currently deployed asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub category: String,
    /// Weighted score, rounded to 2 decimals
    pub risk_score: f64,
    pub criticality: Criticality,
    pub condition_score: f64,
    /// Age in years, rounded to 1 decimal
    pub age_years: f64,
    pub installation_date: NaiveDate,
    /// Incidents recorded for this asset's type in the matched events
    pub historical_incident_count: usize,
}
