//! Weather Impact: asset risk prediction from historical weather analogues
//!
//! Finds the historical weather events most similar to an incoming one,
//! aggregates the infrastructure damage that followed them, and ranks the
//! currently deployed assets by predicted vulnerability.
//!
//! ## Architecture
//!
//! - **Dataset**: CSV loaders, the immutable snapshot and its hot-reload watcher
//! - **Engine**: normalizer, KNN search, impact aggregator, risk predictor
//! - **Report**: one-call assessment with maintenance priority
//! - **Detection**: image-detector output aggregation and category mapping

pub mod config;
pub mod dataset;
pub mod detection;
pub mod engine;
pub mod report;
pub mod types;

// Re-export configuration
pub use config::{AnalysisConfig, ConfigError};

// Re-export dataset handles
pub use dataset::{DataLoadError, DataPaths, Dataset, DatasetStats, SharedDataset};

// Re-export the engine facade and its stages
pub use engine::{
    EngineError, FeatureStatistics, ImpactAnalyzer, ImpactEngine, RiskPredictor, RiskWeights,
    SimilaritySearch,
};

// Re-export commonly used types
pub use types::{
    Asset, Criticality, HighRiskAsset, HistoricalWeatherEvent, ImpactSummary, Incident,
    QueryEvent, RiskResult, SimilarEvent, WeatherFeatures,
};

pub use report::{EventSummary, IncidentStatistics, MaintenancePriority, RiskAssessment};

pub use detection::{CategoryResolver, DetectionError, DetectionResponse, DetectionSummary};
