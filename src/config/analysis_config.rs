//! Analysis Configuration - every tunable of the impact engine as TOML values
//!
//! Each struct implements `Default` with values from `defaults.rs`, so an
//! absent config file yields the reference scoring model unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::dataset::DataPaths;
use crate::engine::RiskWeights;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WEATHER_IMPACT_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "weather_impact.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an impact-analysis deployment.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. `$WEATHER_IMPACT_CONFIG` env var
/// 2. `./weather_impact.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Input table locations
    #[serde(default)]
    pub data: DataConfig,

    /// Similarity search
    #[serde(default)]
    pub knn: KnnConfig,

    /// Incident aggregation
    #[serde(default)]
    pub impact: ImpactConfig,

    /// Risk scoring weights
    #[serde(default)]
    pub risk: RiskWeights,

    /// Assessment report shaping
    #[serde(default)]
    pub report: ReportConfig,

    /// Dataset hot-reload polling
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Image detection category → model mapping
    #[serde(default)]
    pub detection: DetectionConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WEATHER_IMPACT_CONFIG` environment variable
    /// 2. `./weather_impact.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analysis config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analysis config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - `knn.k`, `impact.top_assets_limit`, `watcher.poll_interval_secs` must be > 0
    /// - Risk weights and scales must be finite and non-negative
    /// - `risk.age_horizon_years` must be > 0 (used as divisor)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.knn.k == 0 {
            errors.push("knn.k must be > 0".to_string());
        }
        if self.impact.top_assets_limit == 0 {
            errors.push("impact.top_assets_limit must be > 0".to_string());
        }
        if self.watcher.poll_interval_secs == 0 {
            errors.push("watcher.poll_interval_secs must be > 0".to_string());
        }

        let r = &self.risk;
        for (name, value) in [
            ("incident_weight", r.incident_weight),
            ("condition_weight", r.condition_weight),
            ("age_weight", r.age_weight),
            ("criticality_weight", r.criticality_weight),
            ("condition_scale", r.condition_scale),
            ("age_scale", r.age_scale),
            ("criticality_scale", r.criticality_scale),
        ] {
            Self::check_non_negative(value, &format!("risk.{name}"), &mut errors);
        }
        if !r.age_horizon_years.is_finite() || r.age_horizon_years <= 0.0 {
            errors.push(format!(
                "risk.age_horizon_years must be a finite number > 0 (got {})",
                r.age_horizon_years
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_non_negative(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so check finiteness first
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        } else if value < 0.0 {
            errors.push(format!("{name}: value must be >= 0 (got {value:.3})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Where the three input tables live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_events_file")]
    pub events_file: String,
    #[serde(default = "default_assets_file")]
    pub assets_file: String,
    #[serde(default = "default_incidents_file")]
    pub incidents_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(defaults::DATA_DIR)
}
fn default_events_file() -> String {
    defaults::EVENTS_FILE.to_string()
}
fn default_assets_file() -> String {
    defaults::ASSETS_FILE.to_string()
}
fn default_incidents_file() -> String {
    defaults::INCIDENTS_FILE.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            events_file: default_events_file(),
            assets_file: default_assets_file(),
            incidents_file: default_incidents_file(),
        }
    }
}

impl DataConfig {
    /// Resolve the three table paths under `dir`.
    pub fn paths(&self) -> DataPaths {
        DataPaths {
            events: self.dir.join(&self.events_file),
            assets: self.dir.join(&self.assets_file),
            incidents: self.dir.join(&self.incidents_file),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    defaults::KNN_K
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    #[serde(default = "default_top_assets_limit")]
    pub top_assets_limit: usize,
}

fn default_top_assets_limit() -> usize {
    defaults::TOP_AFFECTED_ASSETS
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            top_assets_limit: default_top_assets_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_at_risk")]
    pub top_at_risk: usize,
}

fn default_top_at_risk() -> usize {
    defaults::TOP_AT_RISK
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_at_risk: default_top_at_risk(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_secs() -> u64 {
    defaults::WATCHER_POLL_INTERVAL_SECS
}
fn default_debounce_ms() -> u64 {
    defaults::WATCHER_DEBOUNCE_MS
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Image categories and the detector model serving each one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Category name → detector model id
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config.knn.k, defaults::KNN_K);
        assert_eq!(config.impact.top_assets_limit, defaults::TOP_AFFECTED_ASSETS);
        assert_eq!(config.risk.incident_weight, defaults::INCIDENT_WEIGHT);
        assert_eq!(config.data.paths().events, PathBuf::from("data/historical_weather_events.csv"));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
[knn]
k = 3

[risk]
age_weight = 0.25
"#,
        )
        .unwrap();
        assert_eq!(config.knn.k, 3);
        assert_eq!(config.risk.age_weight, 0.25);
        assert_eq!(config.risk.condition_weight, defaults::CONDITION_WEIGHT);
    }

    #[test]
    fn test_zero_k_rejected() {
        let err = AnalysisConfig::from_toml_str("[knn]\nk = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("knn.k")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_weight_and_zero_horizon_collected_together() {
        let mut config = AnalysisConfig::default();
        config.risk.condition_weight = -0.1;
        config.risk.age_horizon_years = 0.0;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_nan_weight_rejected() {
        let mut config = AnalysisConfig::default();
        config.risk.incident_weight = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_detection_models_table() {
        let config = AnalysisConfig::from_toml_str(
            r#"
[detection.models]
RailwayTrack = "rail-defects/3"
PCB = "pcb-faults/1"
"#,
        )
        .unwrap();
        assert_eq!(config.detection.models.len(), 2);
        assert_eq!(config.detection.models["PCB"], "pcb-faults/1");
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AnalysisConfig::default();
        let text = config.to_toml().unwrap();
        let back = AnalysisConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.knn.k, config.knn.k);
        assert_eq!(back.data.dir, config.data.dir);
    }
}
