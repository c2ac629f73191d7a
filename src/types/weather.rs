//! Weather types: historical events, query events and the feature vector.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of numeric weather features used for similarity.
pub const NUM_FEATURES: usize = 5;

/// Feature column names, in vector order.
///
/// Every normalized vector (historical or query) is built in this order, so
/// index `i` always refers to the same quantity.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "temperature_c",
    "wind_speed_kmh",
    "precipitation_mm",
    "humidity_percent",
    "duration_hours",
];

/// The five numeric weather features shared by historical and query events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherFeatures {
    /// Air temperature (°C)
    pub temperature_c: f64,
    /// Sustained wind speed (km/h)
    pub wind_speed_kmh: f64,
    /// Total precipitation (mm)
    pub precipitation_mm: f64,
    /// Relative humidity (%)
    pub humidity_percent: f64,
    /// Event duration (hours)
    pub duration_hours: f64,
}

impl WeatherFeatures {
    /// Raw feature vector in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.temperature_c,
            self.wind_speed_kmh,
            self.precipitation_mm,
            self.humidity_percent,
            self.duration_hours,
        ]
    }

    /// True when every feature is a finite number.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// A recorded weather event from the historical table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalWeatherEvent {
    pub event_id: i64,
    #[serde(alias = "timestamp", deserialize_with = "deserialize_timestamp")]
    pub date: NaiveDateTime,
    pub event_type: String,
    pub severity: String,
    #[serde(flatten)]
    pub features: WeatherFeatures,
}

impl HistoricalWeatherEvent {
    /// One-line human summary, e.g.
    /// `Strong Wind (Temperature: 9°C, Wind: 98 km/h, Precipitation: 7mm, Severity: Critical)`.
    pub fn summary_line(&self) -> String {
        format!(
            "{} (Temperature: {}°C, Wind: {} km/h, Precipitation: {}mm, Severity: {})",
            self.event_type,
            self.features.temperature_c,
            self.features.wind_speed_kmh,
            self.features.precipitation_mm,
            self.severity
        )
    }
}

/// Weather happening now or forecast. Carries no identifier.
///
/// The descriptive fields are echoed in reports but never influence the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    #[serde(flatten)]
    pub features: WeatherFeatures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<WeatherFeatures> for QueryEvent {
    fn from(features: WeatherFeatures) -> Self {
        Self {
            features,
            event_type: None,
            severity: None,
            location: None,
        }
    }
}

/// Parse a timestamp column: RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp '{raw}'")))
}
