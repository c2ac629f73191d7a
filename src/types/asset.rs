//! Infrastructure asset registry and historical incident records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Importance tier attached to an asset, used as a risk multiplier.
///
/// Labels outside the four known tiers are kept verbatim so they can still be
/// grouped and reported; they weigh like `Medium`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
    Unrecognized(String),
}

impl Criticality {
    /// Risk multiplier for this tier.
    pub fn weight(&self) -> f64 {
        match self {
            Criticality::Critical => 1.5,
            Criticality::High => 1.2,
            Criticality::Medium => 1.0,
            Criticality::Low => 0.8,
            Criticality::Unrecognized(_) => 1.0,
        }
    }

    /// Label as it appears in the registry.
    pub fn as_str(&self) -> &str {
        match self {
            Criticality::Low => "Low",
            Criticality::Medium => "Medium",
            Criticality::High => "High",
            Criticality::Critical => "Critical",
            Criticality::Unrecognized(label) => label,
        }
    }
}

impl From<String> for Criticality {
    fn from(label: String) -> Self {
        match label.trim() {
            "Low" => Criticality::Low,
            "Medium" => Criticality::Medium,
            "High" => Criticality::High,
            "Critical" => Criticality::Critical,
            _ => Criticality::Unrecognized(label),
        }
    }
}

impl From<&str> for Criticality {
    fn from(label: &str) -> Self {
        Criticality::from(label.to_string())
    }
}

impl From<Criticality> for String {
    fn from(c: Criticality) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical piece of infrastructure (pole, track section, wagon bogie, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub category: String,
    pub criticality: Criticality,
    /// Health rating 0-10, higher is better
    pub condition_score: f64,
    pub installation_date: NaiveDate,
}

impl Asset {
    /// Age in years at `today` (days / 365.25). Negative for future installs.
    pub fn age_years(&self, today: NaiveDate) -> f64 {
        (today - self.installation_date).num_days() as f64 / 365.25
    }
}

/// Damage to one asset during one historical weather event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub event_id: i64,
    pub asset_code: String,
    pub damage_severity: String,
    pub repair_cost_usd: f64,
    pub downtime_hours: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality_weights() {
        assert_eq!(Criticality::from("Critical").weight(), 1.5);
        assert_eq!(Criticality::from("High").weight(), 1.2);
        assert_eq!(Criticality::from("Medium").weight(), 1.0);
        assert_eq!(Criticality::from("Low").weight(), 0.8);
    }

    #[test]
    fn test_unrecognized_criticality_is_kept_and_weighs_one() {
        let c = Criticality::from("Severe");
        assert_eq!(c, Criticality::Unrecognized("Severe".to_string()));
        assert_eq!(c.weight(), 1.0);
        assert_eq!(c.as_str(), "Severe");
    }

    #[test]
    fn test_criticality_serde_round_trips_label() {
        let json = serde_json::to_string(&Criticality::High).unwrap();
        assert_eq!(json, "\"High\"");
        let back: Criticality = serde_json::from_str("\"Critical\"").unwrap();
        assert_eq!(back, Criticality::Critical);
    }

    #[test]
    fn test_age_years() {
        let asset = Asset {
            code: "A1".to_string(),
            name: "Pole 1".to_string(),
            asset_type: "Pole".to_string(),
            category: "Electrical".to_string(),
            criticality: Criticality::High,
            condition_score: 3.0,
            installation_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        };
        let today = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let age = asset.age_years(today);
        // 3653 days (three leap days in between)
        assert!((age - 3653.0 / 365.25).abs() < 1e-12);
    }
}
