//! Impact Engine - weather similarity and asset risk prediction
//!
//! Data flows strictly forward:
//!
//! ```text
//! FeatureStatistics ─▶ SimilaritySearch ─▶ ImpactAnalyzer ─▶ RiskPredictor
//!   (normalizer)          (knn)              (impact)          (predictor)
//! ```
//!
//! ## Architecture
//!
//! - `normalizer`: z-score statistics, computed once per dataset snapshot
//! - `knn`: Euclidean k-nearest-neighbour search with stable tie-breaking
//! - `impact`: incident/asset join and damage-pattern aggregation
//! - `predictor`: weighted linear risk score per deployed asset
//!
//! `ImpactEngine` wires the four together over a `SharedDataset`. Every
//! method reads exactly one snapshot, so a concurrent reload can never pair
//! one table's rows with another load's statistics.

pub mod impact;
pub mod knn;
pub mod normalizer;
pub mod predictor;

pub use impact::ImpactAnalyzer;
pub use knn::SimilaritySearch;
pub use normalizer::FeatureStatistics;
pub use predictor::{RiskPredictor, RiskWeights};

use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::dataset::{DataLoadError, Dataset, SharedDataset};
use crate::report::RiskAssessment;
use crate::types::{
    HistoricalWeatherEvent, ImpactSummary, QueryEvent, RiskResult, SimilarEvent, WeatherFeatures,
};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Lookup of an event id that is not in the loaded table
    #[error("historical weather event {0} not found")]
    EventNotFound(i64),
}

/// Facade over the four analysis stages.
#[derive(Debug, Clone)]
pub struct ImpactEngine {
    dataset: SharedDataset,
    search: SimilaritySearch,
    impact: ImpactAnalyzer,
    predictor: RiskPredictor,
    top_at_risk: usize,
}

impl ImpactEngine {
    /// Build an engine over an already-loaded snapshot.
    pub fn new(dataset: Dataset, config: &AnalysisConfig) -> Self {
        Self::with_shared(SharedDataset::new(dataset), config)
    }

    /// Build an engine over an existing shared handle (e.g. one a watcher reloads).
    pub fn with_shared(dataset: SharedDataset, config: &AnalysisConfig) -> Self {
        Self {
            dataset,
            search: SimilaritySearch::new(config.knn.k),
            impact: ImpactAnalyzer::new(config.impact.top_assets_limit),
            predictor: RiskPredictor::new(config.risk.clone()),
            top_at_risk: config.report.top_at_risk,
        }
    }

    /// Load the three tables named by `config.data`, normalize, and build the engine.
    pub fn load(config: &AnalysisConfig) -> Result<Self, DataLoadError> {
        let dataset = Dataset::load(&config.data.paths())?;
        info!(
            k = config.knn.k,
            top_assets_limit = config.impact.top_assets_limit,
            "Impact engine ready"
        );
        Ok(Self::new(dataset, config))
    }

    /// Shared handle to the active snapshot.
    pub fn dataset(&self) -> &SharedDataset {
        &self.dataset
    }

    pub fn k(&self) -> usize {
        self.search.k()
    }

    /// The `k` historical events most similar to `query`, closest first.
    pub fn find_similar(&self, query: &WeatherFeatures) -> Vec<SimilarEvent> {
        self.search.find_similar(&self.dataset.snapshot(), query)
    }

    /// Full record of a historical event.
    pub fn event_details(&self, event_id: i64) -> Result<HistoricalWeatherEvent, EngineError> {
        self.dataset
            .snapshot()
            .event(event_id)
            .cloned()
            .ok_or(EngineError::EventNotFound(event_id))
    }

    /// Damage-pattern statistics over the incidents of `event_ids`.
    pub fn analyze_affected_assets(&self, event_ids: &[i64]) -> ImpactSummary {
        self.impact.analyze(&self.dataset.snapshot(), event_ids)
    }

    /// Rank deployed assets by predicted vulnerability, aged as of today.
    pub fn predict_at_risk_assets(&self, by_asset_type: &BTreeMap<String, usize>) -> Vec<RiskResult> {
        self.predict_at_risk_assets_at(by_asset_type, Local::now().date_naive())
    }

    /// Same as `predict_at_risk_assets` with an explicit reference date.
    pub fn predict_at_risk_assets_at(
        &self,
        by_asset_type: &BTreeMap<String, usize>,
        today: NaiveDate,
    ) -> Vec<RiskResult> {
        self.predictor
            .predict(self.dataset.snapshot().assets(), by_asset_type, today)
    }

    /// Run the whole pipeline for one query.
    pub fn assess(&self, query: &QueryEvent) -> RiskAssessment {
        self.assess_at(query, Local::now().date_naive())
    }

    /// Run the whole pipeline against a single snapshot with an explicit reference date.
    pub fn assess_at(&self, query: &QueryEvent, today: NaiveDate) -> RiskAssessment {
        let snapshot = self.dataset.snapshot();

        let similar = self.search.find_similar(&snapshot, &query.features);
        let ids: Vec<i64> = similar.iter().map(|s| s.event_id).collect();
        let impact = self.impact.analyze(&snapshot, &ids);
        let at_risk = self
            .predictor
            .predict(snapshot.assets(), &impact.by_asset_type, today);

        let assessment =
            RiskAssessment::build(query, &snapshot, &similar, impact, at_risk, self.top_at_risk);
        info!(
            similar_events = assessment.events.len(),
            incidents = assessment.impact.total_incidents,
            at_risk = assessment.number_of_at_risk_assets,
            priority = %assessment.recommended_priority,
            "Risk assessment complete"
        );
        assessment
    }
}
