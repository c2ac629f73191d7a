//! System-wide default constants.
//!
//! Every `[section]` of the analysis config falls back to these values, which
//! reproduce the reference scoring model exactly.

// ============================================================================
// Dataset
// ============================================================================

/// Directory holding the three input tables.
pub const DATA_DIR: &str = "data";

pub const EVENTS_FILE: &str = "historical_weather_events.csv";
pub const ASSETS_FILE: &str = "assets.csv";
pub const INCIDENTS_FILE: &str = "historical_incidents.csv";

// ============================================================================
// Similarity Search
// ============================================================================

/// Number of nearest historical events returned per query.
pub const KNN_K: usize = 5;

// ============================================================================
// Impact Aggregation
// ============================================================================

/// Cap on the most-frequently-affected asset list.
pub const TOP_AFFECTED_ASSETS: usize = 10;

// ============================================================================
// Risk Model
// ============================================================================

pub const INCIDENT_WEIGHT: f64 = 0.4;
pub const CONDITION_WEIGHT: f64 = 0.3;
pub const AGE_WEIGHT: f64 = 0.2;
pub const CRITICALITY_WEIGHT: f64 = 0.1;

/// `condition_risk` (0-1) is scaled onto 0-30 before weighting.
pub const CONDITION_SCALE: f64 = 30.0;

/// `age_risk` (0-1) is scaled onto 0-30 before weighting.
pub const AGE_SCALE: f64 = 30.0;

/// Criticality multiplier (0.8-1.5) is scaled by 10 before weighting.
pub const CRITICALITY_SCALE: f64 = 10.0;

/// Age at which `age_risk` saturates at 1.0 (years).
pub const AGE_HORIZON_YEARS: f64 = 30.0;

// ============================================================================
// Report
// ============================================================================

/// Number of at-risk assets listed in an assessment.
pub const TOP_AT_RISK: usize = 10;

// ============================================================================
// Dataset Watcher
// ============================================================================

/// Interval between mtime checks of the input tables (seconds).
pub const WATCHER_POLL_INTERVAL_SECS: u64 = 2;

/// Debounce after detecting a change (editors and exporters write in stages).
pub const WATCHER_DEBOUNCE_MS: u64 = 500;
