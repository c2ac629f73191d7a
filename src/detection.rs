//! Image Detection Aggregation
//!
//! Reduces object-detector output for an inspection image to counts and a
//! confidence ranking, and maps classifier labels onto the configured image
//! categories. Works on payloads already on hand; fetching images and calling
//! detector services is left to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::DetectionConfig;

const UNKNOWN_CLASS: &str = "<unknown>";

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Malformed detection payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No detector model configured for category '{0}'")]
    UnknownCategory(String),
}

// ============================================================================
// Detector payload
// ============================================================================

/// Raw detector response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    #[serde(alias = "detections")]
    pub predictions: Vec<Detection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_id: Option<String>,
}

impl DetectionResponse {
    pub fn from_json(payload: &str) -> Result<Self, DetectionError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(alias = "label", default = "unknown_class")]
    pub class: String,
    #[serde(alias = "score", default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_id: Option<String>,
}

fn unknown_class() -> String {
    UNKNOWN_CLASS.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

// ============================================================================
// Summary
// ============================================================================

/// Per-class roll-up used for ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRanking {
    pub class: String,
    pub count: usize,
    pub max_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub num_detections: usize,
    pub class_counts: BTreeMap<String, usize>,
    pub top_confidence: f64,
    pub detections: Vec<Detection>,
}

impl DetectionSummary {
    pub fn from_response(response: &DetectionResponse) -> Self {
        let mut class_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut top_confidence = 0.0_f64;
        for d in &response.predictions {
            *class_counts.entry(d.class.clone()).or_default() += 1;
            if d.confidence > top_confidence {
                top_confidence = d.confidence;
            }
        }

        tracing::debug!(
            detections = response.predictions.len(),
            classes = class_counts.len(),
            top_confidence,
            "Summarized detector output"
        );

        Self {
            num_detections: response.predictions.len(),
            class_counts,
            top_confidence,
            detections: response.predictions.clone(),
        }
    }

    /// Classes by count desc, then best confidence desc, then name.
    pub fn ranked_classes(&self) -> Vec<ClassRanking> {
        let mut ranked: Vec<ClassRanking> = self
            .class_counts
            .iter()
            .map(|(class, &count)| ClassRanking {
                class: class.clone(),
                count,
                max_confidence: self
                    .detections
                    .iter()
                    .filter(|d| &d.class == class)
                    .map(|d| d.confidence)
                    .fold(0.0, f64::max),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.max_confidence.total_cmp(&a.max_confidence))
                .then_with(|| a.class.cmp(&b.class))
        });
        ranked
    }

    /// Text block: `Detections: N` then one ` - class: confidence=0.00` line each.
    pub fn summarize(&self) -> String {
        let mut lines = vec![format!("Detections: {}", self.num_detections)];
        lines.extend(
            self.detections
                .iter()
                .map(|d| format!(" - {}: confidence={:.2}", d.class, d.confidence)),
        );
        lines.join("\n")
    }
}

// ============================================================================
// Category resolution
// ============================================================================

/// Maps free-form classifier labels onto configured image categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
    /// normalized name → (category, model id), in category name order
    categories: BTreeMap<String, (String, String)>,
}

impl CategoryResolver {
    pub fn new(config: &DetectionConfig) -> Self {
        let categories = config
            .models
            .iter()
            .map(|(category, model)| (normalize_name(category), (category.clone(), model.clone())))
            .collect();
        Self { categories }
    }

    /// Configured category names.
    pub fn categories(&self) -> Vec<&str> {
        self.categories.values().map(|(c, _)| c.as_str()).collect()
    }

    /// Resolve a label: exact normalized match, else the first category whose
    /// normalized name contains or is contained in the label, else the label itself.
    pub fn resolve(&self, label: &str) -> String {
        let normalized = normalize_name(label);
        if let Some((category, _)) = self.categories.get(&normalized) {
            return category.clone();
        }
        if !normalized.is_empty() {
            for (norm, (category, _)) in &self.categories {
                if norm.contains(&normalized) || normalized.contains(norm.as_str()) {
                    tracing::debug!(label, category = %category, "Mapped label via partial match");
                    return category.clone();
                }
            }
        }
        tracing::debug!(label, "Label did not match any configured category");
        label.to_string()
    }

    /// Detector model id for an exact category name.
    pub fn model_id_for(&self, category: &str) -> Result<&str, DetectionError> {
        self.categories
            .values()
            .find(|(c, _)| c == category)
            .map(|(_, model)| model.as_str())
            .ok_or_else(|| DetectionError::UnknownCategory(category.to_string()))
    }
}

/// Lowercase and keep only alphanumeric characters.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
