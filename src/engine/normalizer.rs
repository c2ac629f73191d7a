//! Z-score feature normalization.
//!
//! Mean and standard deviation of each of the five weather features are
//! computed once over the whole historical table and then used for every
//! vector, historical or query, so distances stay comparable across calls.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::types::{HistoricalWeatherEvent, WeatherFeatures, FEATURE_NAMES, NUM_FEATURES};

/// Per-feature population mean and standard deviation, in `FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    mean: [f64; NUM_FEATURES],
    std: [f64; NUM_FEATURES],
}

impl FeatureStatistics {
    /// Compute statistics across the full event collection.
    ///
    /// An empty collection yields zero mean and zero deviation, so every
    /// normalized value is 0.
    pub fn from_events(events: &[HistoricalWeatherEvent]) -> Self {
        let mut stats = Self {
            mean: [0.0; NUM_FEATURES],
            std: [0.0; NUM_FEATURES],
        };
        if events.is_empty() {
            return stats;
        }

        let columns: Vec<[f64; NUM_FEATURES]> =
            events.iter().map(|e| e.features.to_array()).collect();
        for i in 0..NUM_FEATURES {
            let column: Vec<f64> = columns.iter().map(|row| row[i]).collect();
            stats.mean[i] = column.iter().mean();
            stats.std[i] = column.iter().population_std_dev();
        }

        tracing::debug!(
            mean = ?stats.mean,
            std = ?stats.std,
            features = ?FEATURE_NAMES,
            "Computed feature statistics"
        );
        stats
    }

    /// Normalize a raw feature vector: `(value - mean) / std`, or 0 where std is 0.
    pub fn normalize(&self, raw: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut normalized = [0.0_f64; NUM_FEATURES];
        for i in 0..NUM_FEATURES {
            let std = self.std[i];
            // A constant column carries no discriminating information
            if std > 0.0 && std.is_finite() {
                normalized[i] = (raw[i] - self.mean[i]) / std;
            }
        }
        normalized
    }

    /// Normalize a feature record.
    pub fn normalize_features(&self, features: &WeatherFeatures) -> [f64; NUM_FEATURES] {
        self.normalize(&features.to_array())
    }

    pub fn mean(&self) -> &[f64; NUM_FEATURES] {
        &self.mean
    }

    pub fn std(&self) -> &[f64; NUM_FEATURES] {
        &self.std
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;

    fn event(id: i64, values: [f64; NUM_FEATURES]) -> HistoricalWeatherEvent {
        HistoricalWeatherEvent {
            event_id: id,
            date: parse_timestamp("2023-03-01").unwrap(),
            event_type: "Storm".to_string(),
            severity: "High".to_string(),
            features: WeatherFeatures {
                temperature_c: values[0],
                wind_speed_kmh: values[1],
                precipitation_mm: values[2],
                humidity_percent: values[3],
                duration_hours: values[4],
            },
        }
    }

    #[test]
    fn test_population_statistics() {
        let events = vec![
            event(1, [10.0, 150.0, 5.0, 20.0, 3.0]),
            event(2, [20.0, 50.0, 5.0, 60.0, 1.0]),
        ];
        let stats = FeatureStatistics::from_events(&events);
        assert!((stats.mean()[0] - 15.0).abs() < 1e-12);
        assert!((stats.std()[0] - 5.0).abs() < 1e-12);
        assert!((stats.std()[1] - 50.0).abs() < 1e-12);
        assert_eq!(stats.std()[2], 0.0);
    }

    #[test]
    fn test_zero_std_feature_normalizes_to_zero() {
        let events = vec![
            event(1, [10.0, 150.0, 5.0, 20.0, 3.0]),
            event(2, [20.0, 50.0, 5.0, 60.0, 3.0]),
            event(3, [30.0, 90.0, 5.0, 40.0, 3.0]),
        ];
        let stats = FeatureStatistics::from_events(&events);
        for e in &events {
            let n = stats.normalize_features(&e.features);
            assert_eq!(n[2], 0.0);
            assert_eq!(n[4], 0.0);
            assert!(n.iter().all(|v| v.is_finite()));
        }
        // Query values far from the constant still normalize to 0
        let n = stats.normalize(&[0.0, 0.0, 999.0, 0.0, 42.0]);
        assert_eq!(n[2], 0.0);
        assert_eq!(n[4], 0.0);
    }

    #[test]
    fn test_single_event_normalizes_to_zero() {
        let events = vec![event(1, [10.0, 150.0, 5.0, 20.0, 3.0])];
        let stats = FeatureStatistics::from_events(&events);
        let n = stats.normalize_features(&events[0].features);
        assert_eq!(n, [0.0; NUM_FEATURES]);
    }

    #[test]
    fn test_empty_collection() {
        let stats = FeatureStatistics::from_events(&[]);
        assert_eq!(stats.normalize(&[1.0, 2.0, 3.0, 4.0, 5.0]), [0.0; NUM_FEATURES]);
    }

    #[test]
    fn test_normalize_is_zero_mean() {
        let events = vec![
            event(1, [10.0, 150.0, 5.0, 20.0, 3.0]),
            event(2, [25.0, 20.0, 0.0, 60.0, 1.0]),
            event(3, [-4.0, 80.0, 12.0, 95.0, 8.0]),
        ];
        let stats = FeatureStatistics::from_events(&events);
        let sums = events.iter().fold([0.0; NUM_FEATURES], |mut acc, e| {
            let n = stats.normalize_features(&e.features);
            for i in 0..NUM_FEATURES {
                acc[i] += n[i];
            }
            acc
        });
        assert!(sums.iter().all(|s| s.abs() < 1e-9));
    }
}
