//! Risk Predictor
//!
//! Deterministic weighted linear score over four factors:
//! - historical incidents of the asset's type in the matched events
//! - condition (0-10, lower is worse)
//! - age relative to a fixed horizon
//! - criticality multiplier
//!
//! ```text
//! risk = incidents       * incident_weight
//!      + condition_risk  * condition_scale   * condition_weight
//!      + age_risk        * age_scale         * age_weight
//!      + criticality_w   * criticality_scale * criticality_weight
//! ```
//!
//! With default weights this reproduces the reference scoring model exactly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::defaults;
use crate::types::{Asset, RiskResult};

/// Tunable coefficients of the risk score (`[risk]` config section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    #[serde(default = "default_incident_weight")]
    pub incident_weight: f64,
    #[serde(default = "default_condition_weight")]
    pub condition_weight: f64,
    #[serde(default = "default_age_weight")]
    pub age_weight: f64,
    #[serde(default = "default_criticality_weight")]
    pub criticality_weight: f64,
    #[serde(default = "default_condition_scale")]
    pub condition_scale: f64,
    #[serde(default = "default_age_scale")]
    pub age_scale: f64,
    #[serde(default = "default_criticality_scale")]
    pub criticality_scale: f64,
    /// Age at which age risk saturates at 1.0
    #[serde(default = "default_age_horizon_years")]
    pub age_horizon_years: f64,
}

fn default_incident_weight() -> f64 {
    defaults::INCIDENT_WEIGHT
}
fn default_condition_weight() -> f64 {
    defaults::CONDITION_WEIGHT
}
fn default_age_weight() -> f64 {
    defaults::AGE_WEIGHT
}
fn default_criticality_weight() -> f64 {
    defaults::CRITICALITY_WEIGHT
}
fn default_condition_scale() -> f64 {
    defaults::CONDITION_SCALE
}
fn default_age_scale() -> f64 {
    defaults::AGE_SCALE
}
fn default_criticality_scale() -> f64 {
    defaults::CRITICALITY_SCALE
}
fn default_age_horizon_years() -> f64 {
    defaults::AGE_HORIZON_YEARS
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            incident_weight: default_incident_weight(),
            condition_weight: default_condition_weight(),
            age_weight: default_age_weight(),
            criticality_weight: default_criticality_weight(),
            condition_scale: default_condition_scale(),
            age_scale: default_age_scale(),
            criticality_scale: default_criticality_scale(),
            age_horizon_years: default_age_horizon_years(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskPredictor {
    weights: RiskWeights,
}

impl RiskPredictor {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Score every asset whose type appears in `by_asset_type`, as of `today`.
    ///
    /// Types absent from the breakdown are excluded, not scored as zero.
    /// Sorted by score desc, then code asc.
    pub fn predict(
        &self,
        assets: &[Asset],
        by_asset_type: &BTreeMap<String, usize>,
        today: NaiveDate,
    ) -> Vec<RiskResult> {
        let mut results: Vec<RiskResult> = assets
            .iter()
            .filter_map(|asset| {
                let count = *by_asset_type.get(&asset.asset_type)?;
                Some(self.score_asset(asset, count, today))
            })
            .collect();

        results.sort_by(|a, b| {
            b.risk_score
                .total_cmp(&a.risk_score)
                .then_with(|| a.code.cmp(&b.code))
        });

        tracing::debug!(
            scored = results.len(),
            asset_types = by_asset_type.len(),
            top = results.first().map(|r| r.code.as_str()),
            "Risk prediction complete"
        );
        results
    }

    /// Score a single asset given its type's incident count.
    pub fn score_asset(&self, asset: &Asset, incident_count: usize, today: NaiveDate) -> RiskResult {
        let w = &self.weights;
        let age_years = asset.age_years(today);
        let age_risk = (age_years / w.age_horizon_years).min(1.0);
        let condition_risk = (10.0 - asset.condition_score) / 10.0;

        let score = incident_count as f64 * w.incident_weight
            + condition_risk * w.condition_scale * w.condition_weight
            + age_risk * w.age_scale * w.age_weight
            + asset.criticality.weight() * w.criticality_scale * w.criticality_weight;

        RiskResult {
            code: asset.code.clone(),
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
            category: asset.category.clone(),
            risk_score: round_to(score, 2),
            criticality: asset.criticality.clone(),
            condition_score: asset.condition_score,
            age_years: round_to(age_years, 1),
            installation_date: asset.installation_date,
            historical_incident_count: incident_count,
        }
    }
}

/// Round half away from zero to `decimals` places.
///
/// Ties on the scaled value go away from zero (`2.25` → `2.3`), not to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Criticality;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn asset(code: &str, asset_type: &str, crit: Criticality, condition: f64, installed: NaiveDate) -> Asset {
        Asset {
            code: code.to_string(),
            name: format!("{asset_type} {code}"),
            asset_type: asset_type.to_string(),
            category: "Electrical".to_string(),
            criticality: crit,
            condition_score: condition,
            installation_date: installed,
        }
    }

    fn by_type(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    #[test]
    fn test_pole_twenty_years_old_scores_about_11_9() {
        // 7305 days = exactly 20.0 years at 365.25 days/year
        let installed = today() - chrono::Duration::days(7305);
        let assets = vec![asset("A1", "Pole", Criticality::High, 3.0, installed)];
        let out = RiskPredictor::default().predict(&assets, &by_type(&[("Pole", 1)]), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].code, "A1");
        assert_eq!(out[0].age_years, 20.0);
        assert_eq!(out[0].historical_incident_count, 1);
        assert!((out[0].risk_score - 11.9).abs() < 0.01);
    }

    #[test]
    fn test_absent_types_are_excluded() {
        let installed = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let assets = vec![
            asset("A1", "Pole", Criticality::High, 3.0, installed),
            asset("S1", "Signal", Criticality::Critical, 1.0, installed),
        ];
        let out = RiskPredictor::default().predict(&assets, &by_type(&[("Pole", 2)]), today());
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|r| r.asset_type == "Pole"));

        assert!(RiskPredictor::default()
            .predict(&assets, &BTreeMap::new(), today())
            .is_empty());
    }

    #[test]
    fn test_age_risk_saturates() {
        let old = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
        let older = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        let p = RiskPredictor::default();
        let a = p.score_asset(&asset("A", "Pole", Criticality::Low, 5.0, old), 1, today());
        let b = p.score_asset(&asset("B", "Pole", Criticality::Low, 5.0, older), 1, today());
        assert_eq!(a.risk_score, b.risk_score);
        // 0.4 + 0.5*9 + 1.0*6 + 0.8
        assert!((a.risk_score - 11.7).abs() < 1e-9);
    }

    #[test]
    fn test_unrecognized_criticality_weighs_as_medium() {
        let installed = NaiveDate::from_ymd_opt(2014, 6, 1).unwrap();
        let p = RiskPredictor::default();
        let medium = p.score_asset(&asset("A", "Pole", Criticality::Medium, 6.0, installed), 3, today());
        let odd = p.score_asset(
            &asset("B", "Pole", Criticality::Unrecognized("Vital".into()), 6.0, installed),
            3,
            today(),
        );
        assert_eq!(medium.risk_score, odd.risk_score);
    }

    #[test]
    fn test_sorted_by_score_then_code() {
        let installed = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let assets = vec![
            asset("B2", "Pole", Criticality::Medium, 5.0, installed),
            asset("A9", "Pole", Criticality::Medium, 5.0, installed),
            asset("C1", "Pole", Criticality::Critical, 2.0, installed),
        ];
        let out = RiskPredictor::default().predict(&assets, &by_type(&[("Pole", 1)]), today());
        let codes: Vec<&str> = out.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["C1", "A9", "B2"]);
    }

    #[test]
    fn test_scores_are_reproducible() {
        let installed = NaiveDate::from_ymd_opt(2007, 3, 14).unwrap();
        let assets = vec![asset("A1", "Track", Criticality::High, 4.2, installed)];
        let types = by_type(&[("Track", 5)]);
        let p = RiskPredictor::default();
        let first = p.predict(&assets, &types, today());
        for _ in 0..5 {
            assert_eq!(p.predict(&assets, &types, today()), first);
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(11.904, 2), 11.9);
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(0.1234, 3), 0.123);
    }
}
