//! Config validation: unknown-key detection with "did you mean" suggestions.
//!
//! Runs on the raw `toml::Value` before serde sees the document, so a
//! misspelled key (which serde would silently ignore, falling back to the
//! default) is at least reported. Findings are warnings only.

use std::collections::HashSet;
use std::fmt;

/// Maximum edit distance for a suggestion to be offered.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// An unknown key found in a config document.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Dotted key path, e.g. `risk.age_wieght`
    pub field: String,
    pub message: String,
    /// Closest known key, if one is near enough
    pub suggestion: Option<String>,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suggestion {
            Some(s) => write!(f, "{} (did you mean '{s}'?)", self.message),
            None => f.write_str(&self.message),
        }
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Tables whose keys are user-defined (any child key is accepted).
const OPEN_TABLES: &[&str] = &["detection.models"];

/// Returns the complete set of valid dotted key paths for `AnalysisConfig`.
///
/// Maintained by hand to match the struct hierarchy in `analysis_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [data]
        "data",
        "data.dir",
        "data.events_file",
        "data.assets_file",
        "data.incidents_file",
        // [knn]
        "knn",
        "knn.k",
        // [impact]
        "impact",
        "impact.top_assets_limit",
        // [risk]
        "risk",
        "risk.incident_weight",
        "risk.condition_weight",
        "risk.age_weight",
        "risk.criticality_weight",
        "risk.condition_scale",
        "risk.age_scale",
        "risk.criticality_scale",
        "risk.age_horizon_years",
        // [report]
        "report",
        "report.top_at_risk",
        // [watcher]
        "watcher",
        "watcher.poll_interval_secs",
        "watcher.debounce_ms",
        // [detection]
        "detection",
        "detection.models",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Key Collection
// ============================================================================

/// Collect every dotted key path in a TOML document.
///
/// `[knn]\nk = 3` yields `["knn", "knn.k"]`. Children of open tables are not
/// descended into.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };

    let mut keys = Vec::new();
    for (name, child) in table {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        let descend = child.is_table() && !OPEN_TABLES.contains(&path.as_str());
        if descend {
            let nested = walk_toml_keys(child, &path);
            keys.push(path);
            keys.extend(nested);
        } else {
            keys.push(path);
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

/// Edit distance (insert, delete, substitute) between two keys.
fn levenshtein(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    // row[j] = distance between the processed prefix of `a` and target[..j]
    let mut row: Vec<usize> = (0..=target.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in target.iter().enumerate() {
            let above = row[j + 1];
            let substitute = diagonal + usize::from(ca != cb);
            row[j + 1] = substitute.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }
    row[target.len()]
}

/// Closest known key within `MAX_SUGGESTION_DISTANCE` edits.
///
/// Equal distances resolve to the alphabetically first key.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .filter_map(|&candidate| {
            let distance = levenshtein(unknown, candidate);
            (distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, candidate))
        })
        .min()
        .map(|(_, candidate)| candidate.to_string())
}

// ============================================================================
// Entry Point
// ============================================================================

/// Report every key in `raw_toml` that `AnalysisConfig` does not define.
///
/// A document that fails to parse yields no warnings; the serde pass reports it.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(document) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();
    for key in walk_toml_keys(&document, "") {
        if known.contains(key.as_str()) {
            continue;
        }
        warnings.push(ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        });
    }
    warnings
}
