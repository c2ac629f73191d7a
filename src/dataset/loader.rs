//! CSV loaders for the three input tables.
//!
//! Headers are checked before any row is parsed so a missing column is
//! reported by name. Extra columns are ignored. A malformed row aborts the
//! load: the dataset is either complete or not loaded at all.

use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{
    parse_timestamp, Asset, Criticality, HistoricalWeatherEvent, Incident, WeatherFeatures,
};

/// Locations of the three input tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub events: PathBuf,
    pub assets: PathBuf,
    pub incidents: PathBuf,
}

impl DataPaths {
    pub fn all(&self) -> [&Path; 3] {
        [&self.events, &self.assets, &self.incidents]
    }
}

/// Errors while reading an input table. Fatal at startup.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("{path} row {row}: invalid {column}: {message}")]
    InvalidValue {
        path: String,
        row: usize,
        column: String,
        message: String,
    },

    #[error("{path} contains duplicate event_id {event_id}")]
    DuplicateEventId { path: String, event_id: i64 },

    #[error("{path} contains duplicate asset code '{code}'")]
    DuplicateAssetCode { path: String, code: String },
}

// ============================================================================
// Row shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct EventRow {
    event_id: i64,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    event_type: String,
    severity: String,
    temperature_c: f64,
    wind_speed_kmh: f64,
    precipitation_mm: f64,
    humidity_percent: f64,
    duration_hours: f64,
}

#[derive(Debug, Deserialize)]
struct AssetRow {
    code: String,
    name: String,
    #[serde(rename = "type")]
    asset_type: String,
    category: String,
    criticality: String,
    condition_score: f64,
    installation_date: String,
}

#[derive(Debug, Deserialize)]
struct IncidentRow {
    event_id: i64,
    asset_code: String,
    damage_severity: String,
    repair_cost_usd: f64,
    downtime_hours: f64,
}

/// Required columns per table. Inner slices list accepted aliases.
const EVENT_COLUMNS: &[&[&str]] = &[
    &["event_id"],
    &["date", "timestamp"],
    &["event_type"],
    &["severity"],
    &["temperature_c"],
    &["wind_speed_kmh"],
    &["precipitation_mm"],
    &["humidity_percent"],
    &["duration_hours"],
];

const ASSET_COLUMNS: &[&[&str]] = &[
    &["code"],
    &["name"],
    &["type"],
    &["category"],
    &["criticality"],
    &["condition_score"],
    &["installation_date"],
];

const INCIDENT_COLUMNS: &[&[&str]] = &[
    &["event_id"],
    &["asset_code"],
    &["damage_severity"],
    &["repair_cost_usd"],
    &["downtime_hours"],
];

// ============================================================================
// Public loaders
// ============================================================================

/// Load the historical weather event table.
pub fn load_events(path: &Path) -> Result<Vec<HistoricalWeatherEvent>, DataLoadError> {
    let file = open(path)?;
    read_events(file, &path.display().to_string())
}

/// Load the asset registry.
pub fn load_assets(path: &Path) -> Result<Vec<Asset>, DataLoadError> {
    let file = open(path)?;
    read_assets(file, &path.display().to_string())
}

/// Load the historical incident log.
pub fn load_incidents(path: &Path) -> Result<Vec<Incident>, DataLoadError> {
    let file = open(path)?;
    read_incidents(file, &path.display().to_string())
}

/// Parse historical events from any reader. `source` names it in errors.
pub fn read_events(
    reader: impl Read,
    source: &str,
) -> Result<Vec<HistoricalWeatherEvent>, DataLoadError> {
    let rows: Vec<(usize, EventRow)> = read_rows(reader, source, EVENT_COLUMNS)?;
    rows.into_iter()
        .map(|(row, r)| {
            let finite = |value: f64, column: &str| check_finite(value, source, row, column);
            let raw = r.date.or(r.timestamp).unwrap_or_default();
            let date = parse_timestamp(&raw).ok_or_else(|| DataLoadError::InvalidValue {
                path: source.to_string(),
                row,
                column: "date".to_string(),
                message: format!("unrecognized timestamp '{raw}'"),
            })?;
            Ok(HistoricalWeatherEvent {
                event_id: r.event_id,
                date,
                event_type: r.event_type,
                severity: r.severity,
                features: WeatherFeatures {
                    temperature_c: finite(r.temperature_c, "temperature_c")?,
                    wind_speed_kmh: finite(r.wind_speed_kmh, "wind_speed_kmh")?,
                    precipitation_mm: finite(r.precipitation_mm, "precipitation_mm")?,
                    humidity_percent: finite(r.humidity_percent, "humidity_percent")?,
                    duration_hours: finite(r.duration_hours, "duration_hours")?,
                },
            })
        })
        .collect()
}

/// Parse the asset registry from any reader.
pub fn read_assets(reader: impl Read, source: &str) -> Result<Vec<Asset>, DataLoadError> {
    let rows: Vec<(usize, AssetRow)> = read_rows(reader, source, ASSET_COLUMNS)?;
    rows.into_iter()
        .map(|(row, r)| {
            let installation_date = parse_timestamp(&r.installation_date)
                .map(|dt| dt.date())
                .ok_or_else(|| DataLoadError::InvalidValue {
                    path: source.to_string(),
                    row,
                    column: "installation_date".to_string(),
                    message: format!("unrecognized date '{}'", r.installation_date),
                })?;
            Ok(Asset {
                code: r.code,
                name: r.name,
                asset_type: r.asset_type,
                category: r.category,
                criticality: Criticality::from(r.criticality),
                condition_score: check_finite(r.condition_score, source, row, "condition_score")?,
                installation_date,
            })
        })
        .collect()
}

/// Parse the incident log from any reader.
pub fn read_incidents(reader: impl Read, source: &str) -> Result<Vec<Incident>, DataLoadError> {
    let rows: Vec<(usize, IncidentRow)> = read_rows(reader, source, INCIDENT_COLUMNS)?;
    rows.into_iter()
        .map(|(row, r)| {
            Ok(Incident {
                repair_cost_usd: check_finite(r.repair_cost_usd, source, row, "repair_cost_usd")?,
                downtime_hours: check_finite(r.downtime_hours, source, row, "downtime_hours")?,
                event_id: r.event_id,
                asset_code: r.asset_code,
                damage_severity: r.damage_severity,
            })
        })
        .collect()
}

// ============================================================================
// Helpers
// ============================================================================

fn open(path: &Path) -> Result<std::fs::File, DataLoadError> {
    std::fs::File::open(path).map_err(|e| DataLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// `f64` parsing accepts NaN and infinities; reject them per cell.
fn check_finite(value: f64, source: &str, row: usize, column: &str) -> Result<f64, DataLoadError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DataLoadError::InvalidValue {
            path: source.to_string(),
            row,
            column: column.to_string(),
            message: format!("non-finite value {value}"),
        })
    }
}

/// Check headers, then deserialize every row. Returns 1-based data row numbers.
fn read_rows<T: for<'de> Deserialize<'de>>(
    reader: impl Read,
    source: &str,
    required: &[&[&str]],
) -> Result<Vec<(usize, T)>, DataLoadError> {
    let csv_err = |e: csv::Error| DataLoadError::Csv {
        path: source.to_string(),
        source: e,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_err)?.clone();
    for aliases in required {
        if !aliases.iter().any(|a| headers.iter().any(|h| h == *a)) {
            return Err(DataLoadError::MissingColumn {
                path: source.to_string(),
                column: aliases[0].to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize::<T>().enumerate() {
        rows.push((idx + 1, result.map_err(csv_err)?));
    }

    tracing::debug!(path = %source, rows = rows.len(), "Parsed CSV table");
    Ok(rows)
}
