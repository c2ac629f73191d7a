//! Impact Aggregator
//!
//! Joins the incidents of a set of historical events against the asset
//! registry and reduces them to damage-pattern statistics.
//!
//! Incidents naming an asset code missing from the registry stay in the
//! result with unresolved asset fields: they count toward totals, severity,
//! cost and downtime, but not toward any asset-keyed grouping.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::types::{Asset, HighRiskAsset, ImpactSummary, Incident};

#[derive(Debug, Clone, Copy)]
pub struct ImpactAnalyzer {
    top_assets_limit: usize,
}

impl ImpactAnalyzer {
    pub fn new(top_assets_limit: usize) -> Self {
        Self { top_assets_limit }
    }

    /// Aggregate the incidents of `event_ids`.
    ///
    /// An empty or fully non-matching id set returns the zero aggregate.
    pub fn analyze(&self, dataset: &Dataset, event_ids: &[i64]) -> ImpactSummary {
        if event_ids.is_empty() {
            debug!("No event ids given, returning empty impact summary");
            return ImpactSummary::default();
        }

        let wanted: HashSet<i64> = event_ids.iter().copied().collect();
        let joined: Vec<(&Incident, Option<&Asset>)> = dataset
            .incidents()
            .iter()
            .filter(|i| wanted.contains(&i.event_id))
            .map(|i| (i, dataset.asset(&i.asset_code)))
            .collect();

        if joined.is_empty() {
            debug!(events = wanted.len(), "No incidents recorded for matched events");
            return ImpactSummary::default();
        }

        let unresolved = joined.iter().filter(|(_, a)| a.is_none()).count();
        if unresolved > 0 {
            warn!(
                unresolved,
                total = joined.len(),
                "Incidents reference asset codes missing from the registry"
            );
        }

        let mut summary = ImpactSummary {
            total_incidents: joined.len(),
            ..ImpactSummary::default()
        };
        let mut per_asset: HashMap<&str, (usize, &Asset)> = HashMap::new();

        for &(incident, asset) in &joined {
            *summary
                .by_damage_severity
                .entry(incident.damage_severity.clone())
                .or_default() += 1;
            summary.total_estimated_cost += incident.repair_cost_usd;
            summary.total_downtime_hours += incident.downtime_hours;

            let Some(asset) = asset else { continue };
            *summary.by_asset_type.entry(asset.asset_type.clone()).or_default() += 1;
            *summary
                .by_criticality
                .entry(asset.criticality.to_string())
                .or_default() += 1;
            per_asset.entry(asset.code.as_str()).or_insert((0, asset)).0 += 1;
        }

        summary.unique_assets = per_asset.len();
        summary.high_risk_assets = rank_assets(per_asset, self.top_assets_limit);

        debug!(
            incidents = summary.total_incidents,
            unique_assets = summary.unique_assets,
            cost = summary.total_estimated_cost,
            "Impact aggregation complete"
        );
        summary
    }
}

/// Most-affected assets: incident count desc, then code asc, capped at `limit`.
fn rank_assets(per_asset: HashMap<&str, (usize, &Asset)>, limit: usize) -> Vec<HighRiskAsset> {
    let mut ranked: Vec<HighRiskAsset> = per_asset
        .into_values()
        .map(|(count, asset)| HighRiskAsset {
            code: asset.code.clone(),
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
            incident_count: count,
            criticality: asset.criticality.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.incident_count
            .cmp(&a.incident_count)
            .then_with(|| a.code.cmp(&b.code))
    });
    ranked.truncate(limit);
    ranked
}

/// Convenience for reports: asset types in the summary, most incidents first.
pub fn affected_asset_types(summary: &ImpactSummary) -> Vec<String> {
    let mut types: Vec<(&String, &usize)> = summary.by_asset_type.iter().collect();
    types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    types.into_iter().map(|(t, _)| t.clone()).collect()
}
