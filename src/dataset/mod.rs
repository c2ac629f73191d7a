//! Historical Dataset - immutable snapshot plus atomically swappable handle
//!
//! ## Architecture
//!
//! - `Dataset`: events, feature statistics, normalized matrix, asset registry
//!   and incident log, all built together and never mutated afterwards
//! - `SharedDataset`: `ArcSwap` handle; readers grab one `Arc<Dataset>` per
//!   operation, reloads build a whole new snapshot and swap it in
//! - `watcher`: polls the input tables and triggers reloads
//!
//! Statistics and the matrix they normalized always travel in the same
//! snapshot, so a query can never mix data from two loads.

mod loader;
pub mod watcher;

pub use loader::{
    load_assets, load_events, load_incidents, read_assets, read_events, read_incidents,
    DataLoadError, DataPaths,
};

use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::engine::FeatureStatistics;
use crate::types::{Asset, HistoricalWeatherEvent, Incident, NUM_FEATURES};

/// Row counts of a loaded snapshot, for logs and reload notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub events: usize,
    pub assets: usize,
    pub incidents: usize,
    /// Incidents whose event_id has no historical event
    pub orphan_incidents: usize,
}

/// Immutable historical snapshot.
#[derive(Debug)]
pub struct Dataset {
    events: Vec<HistoricalWeatherEvent>,
    statistics: FeatureStatistics,
    normalized: Vec<[f64; NUM_FEATURES]>,
    event_index: HashMap<i64, usize>,
    assets: Vec<Asset>,
    asset_index: HashMap<String, usize>,
    incidents: Vec<Incident>,
}

impl Dataset {
    /// Build a snapshot from in-memory tables.
    ///
    /// Computes feature statistics and normalizes every historical event.
    pub fn from_records(
        events: Vec<HistoricalWeatherEvent>,
        assets: Vec<Asset>,
        incidents: Vec<Incident>,
    ) -> Result<Self, DataLoadError> {
        let mut event_index = HashMap::with_capacity(events.len());
        for (i, e) in events.iter().enumerate() {
            if event_index.insert(e.event_id, i).is_some() {
                return Err(DataLoadError::DuplicateEventId {
                    path: "historical events".to_string(),
                    event_id: e.event_id,
                });
            }
        }

        let mut asset_index = HashMap::with_capacity(assets.len());
        for (i, a) in assets.iter().enumerate() {
            if asset_index.insert(a.code.clone(), i).is_some() {
                return Err(DataLoadError::DuplicateAssetCode {
                    path: "asset registry".to_string(),
                    code: a.code.clone(),
                });
            }
        }

        let statistics = FeatureStatistics::from_events(&events);
        let normalized = events
            .iter()
            .map(|e| statistics.normalize_features(&e.features))
            .collect();

        let dataset = Self {
            events,
            statistics,
            normalized,
            event_index,
            assets,
            asset_index,
            incidents,
        };

        let stats = dataset.stats();
        if stats.orphan_incidents > 0 {
            warn!(
                orphan_incidents = stats.orphan_incidents,
                "Incident log references unknown weather events"
            );
        }
        Ok(dataset)
    }

    /// Load all three tables from disk.
    pub fn load(paths: &DataPaths) -> Result<Self, DataLoadError> {
        let events = load_events(&paths.events)?;
        let assets = load_assets(&paths.assets)?;
        let incidents = load_incidents(&paths.incidents)?;

        let dataset = Self::from_records(events, assets, incidents).map_err(|e| match e {
            DataLoadError::DuplicateEventId { event_id, .. } => DataLoadError::DuplicateEventId {
                path: paths.events.display().to_string(),
                event_id,
            },
            DataLoadError::DuplicateAssetCode { code, .. } => DataLoadError::DuplicateAssetCode {
                path: paths.assets.display().to_string(),
                code,
            },
            other => other,
        })?;

        let stats = dataset.stats();
        info!(
            events = stats.events,
            assets = stats.assets,
            incidents = stats.incidents,
            "Loaded historical dataset"
        );
        Ok(dataset)
    }

    pub fn events(&self) -> &[HistoricalWeatherEvent] {
        &self.events
    }

    pub fn statistics(&self) -> &FeatureStatistics {
        &self.statistics
    }

    /// Normalized feature vectors, one per event, in event order.
    pub fn normalized(&self) -> &[[f64; NUM_FEATURES]] {
        &self.normalized
    }

    pub fn event(&self, event_id: i64) -> Option<&HistoricalWeatherEvent> {
        self.event_index.get(&event_id).map(|&i| &self.events[i])
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, code: &str) -> Option<&Asset> {
        self.asset_index.get(code).map(|&i| &self.assets[i])
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            events: self.events.len(),
            assets: self.assets.len(),
            incidents: self.incidents.len(),
            orphan_incidents: self
                .incidents
                .iter()
                .filter(|i| !self.event_index.contains_key(&i.event_id))
                .count(),
        }
    }

    /// Snapshot with no rows. Every query against it yields empty results.
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            statistics: FeatureStatistics::from_events(&[]),
            normalized: Vec::new(),
            event_index: HashMap::new(),
            assets: Vec::new(),
            asset_index: HashMap::new(),
            incidents: Vec::new(),
        }
    }
}

/// Shared, hot-swappable handle to the current snapshot.
///
/// Cloning is cheap; all clones observe the same swaps.
#[derive(Debug, Clone)]
pub struct SharedDataset {
    inner: Arc<ArcSwap<Dataset>>,
}

impl SharedDataset {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(dataset)),
        }
    }

    /// Current snapshot. Hold it for the duration of one operation.
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.inner.load_full()
    }

    /// Atomically replace the snapshot.
    pub fn replace(&self, dataset: Dataset) {
        self.inner.store(Arc::new(dataset));
    }

    /// Load a fresh snapshot from disk and swap it in.
    ///
    /// On error the current snapshot stays active.
    pub fn reload(&self, paths: &DataPaths) -> Result<DatasetStats, DataLoadError> {
        let dataset = Dataset::load(paths)?;
        let stats = dataset.stats();
        self.replace(dataset);
        info!(events = stats.events, assets = stats.assets, "Dataset snapshot swapped");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_timestamp, Criticality, WeatherFeatures};
    use chrono::NaiveDate;

    fn event(id: i64, temp: f64) -> HistoricalWeatherEvent {
        HistoricalWeatherEvent {
            event_id: id,
            date: parse_timestamp("2022-07-01").unwrap(),
            event_type: "Heatwave".to_string(),
            severity: "High".to_string(),
            features: WeatherFeatures {
                temperature_c: temp,
                wind_speed_kmh: 10.0,
                precipitation_mm: 0.0,
                humidity_percent: 30.0,
                duration_hours: 12.0,
            },
        }
    }

    fn asset(code: &str) -> Asset {
        Asset {
            code: code.to_string(),
            name: format!("Track {code}"),
            asset_type: "Track".to_string(),
            category: "Rail".to_string(),
            criticality: Criticality::Medium,
            condition_score: 5.0,
            installation_date: NaiveDate::from_ymd_opt(2010, 5, 1).unwrap(),
        }
    }

    fn incident(event_id: i64, code: &str) -> Incident {
        Incident {
            event_id,
            asset_code: code.to_string(),
            damage_severity: "Medium".to_string(),
            repair_cost_usd: 1000.0,
            downtime_hours: 2.0,
        }
    }

    #[test]
    fn test_from_records_builds_indices_and_matrix() {
        let ds = Dataset::from_records(
            vec![event(10, 35.0), event(11, 41.0)],
            vec![asset("T1")],
            vec![incident(10, "T1"), incident(99, "T1")],
        )
        .unwrap();
        assert_eq!(ds.normalized().len(), 2);
        assert_eq!(ds.event(11).unwrap().features.temperature_c, 41.0);
        assert!(ds.event(12).is_none());
        assert!(ds.asset("T1").is_some());
        assert_eq!(ds.stats().orphan_incidents, 1);
    }

    #[test]
    fn test_duplicate_event_id_rejected() {
        let err = Dataset::from_records(vec![event(1, 30.0), event(1, 31.0)], vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateEventId { event_id: 1, .. }));
    }

    #[test]
    fn test_duplicate_asset_code_rejected() {
        let err = Dataset::from_records(vec![], vec![asset("T1"), asset("T1")], vec![])
            .unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateAssetCode { .. }));
    }

    #[test]
    fn test_swap_is_visible_to_clones_but_not_held_snapshots() {
        let shared = SharedDataset::new(Dataset::empty());
        let other = shared.clone();
        let before = shared.snapshot();

        shared.replace(Dataset::from_records(vec![event(1, 30.0)], vec![], vec![]).unwrap());

        assert_eq!(before.events().len(), 0);
        assert_eq!(other.snapshot().events().len(), 1);
    }
}
