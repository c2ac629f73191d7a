//! Similarity Search
//!
//! Brute-force k-nearest-neighbours over the normalized historical matrix.
//! A linear scan is O(n) per query; historical tables are small enough that
//! an index would cost more than it saves.

use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::types::{SimilarEvent, WeatherFeatures, NUM_FEATURES};

/// KNN search with a fixed neighbour count.
#[derive(Debug, Clone, Copy)]
pub struct SimilaritySearch {
    k: usize,
}

impl SimilaritySearch {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Find the `min(k, n)` historical events closest to `query`.
    ///
    /// Results are ascending by distance. Equal distances keep historical
    /// table order (stable sort). A query with a non-finite feature, an empty
    /// table or `k == 0` yields no matches.
    pub fn find_similar(&self, dataset: &Dataset, query: &WeatherFeatures) -> Vec<SimilarEvent> {
        if self.k == 0 {
            debug!("Similarity search with k = 0, returning no matches");
            return Vec::new();
        }
        if !query.is_finite() {
            warn!(query = ?query, "Query has non-finite weather features, returning no matches");
            return Vec::new();
        }
        if dataset.events().is_empty() {
            debug!("Historical table is empty, returning no matches");
            return Vec::new();
        }

        let q = dataset.statistics().normalize_features(query);

        let mut scored: Vec<SimilarEvent> = dataset
            .events()
            .iter()
            .zip(dataset.normalized())
            .map(|(event, row)| SimilarEvent {
                event_id: event.event_id,
                distance: euclidean_distance(&q, row),
            })
            .collect();

        // sort_by is stable: ties stay in table order
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(self.k);

        debug!(
            k = self.k,
            matches = scored.len(),
            nearest = scored.first().map(|s| s.event_id),
            "Similarity search complete"
        );
        scored
    }
}

/// Euclidean distance between two normalized vectors.
pub fn euclidean_distance(a: &[f64; NUM_FEATURES], b: &[f64; NUM_FEATURES]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_timestamp, HistoricalWeatherEvent};

    fn features(v: [f64; NUM_FEATURES]) -> WeatherFeatures {
        WeatherFeatures {
            temperature_c: v[0],
            wind_speed_kmh: v[1],
            precipitation_mm: v[2],
            humidity_percent: v[3],
            duration_hours: v[4],
        }
    }

    fn event(id: i64, v: [f64; NUM_FEATURES]) -> HistoricalWeatherEvent {
        HistoricalWeatherEvent {
            event_id: id,
            date: parse_timestamp("2023-01-15").unwrap(),
            event_type: "Storm".to_string(),
            severity: "High".to_string(),
            features: features(v),
        }
    }

    fn dataset(events: Vec<HistoricalWeatherEvent>) -> Dataset {
        Dataset::from_records(events, vec![], vec![]).unwrap()
    }

    #[test]
    fn test_two_event_scenario_picks_windy_event() {
        let ds = dataset(vec![
            event(1, [10.0, 150.0, 5.0, 20.0, 3.0]),
            event(2, [25.0, 20.0, 0.0, 60.0, 1.0]),
        ]);
        let query = features([11.0, 145.0, 4.0, 22.0, 3.0]);

        let one = SimilaritySearch::new(1).find_similar(&ds, &query);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].event_id, 1);

        let both = SimilaritySearch::new(2).find_similar(&ds, &query);
        assert!(both[0].distance < both[1].distance);
    }

    #[test]
    fn test_length_is_min_k_n_and_sorted() {
        let ds = dataset(vec![
            event(1, [10.0, 150.0, 5.0, 20.0, 3.0]),
            event(2, [25.0, 20.0, 0.0, 60.0, 1.0]),
            event(3, [-5.0, 40.0, 30.0, 95.0, 12.0]),
            event(4, [32.0, 10.0, 0.0, 15.0, 48.0]),
        ]);
        let query = features([15.0, 60.0, 8.0, 50.0, 5.0]);

        for k in [1, 3, 4, 10] {
            let out = SimilaritySearch::new(k).find_similar(&ds, &query);
            assert_eq!(out.len(), k.min(4));
            assert!(out.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_exact_duplicate_is_zero_distance_and_first() {
        let ds = dataset(vec![
            event(1, [10.0, 150.0, 5.0, 20.0, 3.0]),
            event(2, [25.0, 20.0, 0.0, 60.0, 1.0]),
            event(3, [-5.0, 40.0, 30.0, 95.0, 12.0]),
        ]);
        let out = SimilaritySearch::new(3).find_similar(&ds, &features([25.0, 20.0, 0.0, 60.0, 1.0]));
        assert_eq!(out[0].event_id, 2);
        assert_eq!(out[0].distance, 0.0);
    }

    #[test]
    fn test_ties_keep_table_order() {
        let ds = dataset(vec![
            event(7, [10.0, 50.0, 5.0, 20.0, 3.0]),
            event(3, [20.0, 50.0, 5.0, 20.0, 3.0]),
            event(5, [10.0, 50.0, 5.0, 20.0, 3.0]),
        ]);
        let out = SimilaritySearch::new(3).find_similar(&ds, &features([10.0, 50.0, 5.0, 20.0, 3.0]));
        let ids: Vec<i64> = out.iter().map(|s| s.event_id).collect();
        assert_eq!(ids, vec![7, 5, 3]);
    }

    #[test]
    fn test_degenerate_inputs_return_empty() {
        let ds = dataset(vec![event(1, [10.0, 150.0, 5.0, 20.0, 3.0])]);
        let q = features([10.0, 150.0, 5.0, 20.0, 3.0]);

        assert!(SimilaritySearch::new(0).find_similar(&ds, &q).is_empty());
        assert!(SimilaritySearch::new(5).find_similar(&Dataset::empty(), &q).is_empty());

        let nan = features([f64::NAN, 150.0, 5.0, 20.0, 3.0]);
        assert!(SimilaritySearch::new(5).find_similar(&ds, &nan).is_empty());
    }

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0, 0.0, 0.0, 0.0, 0.0];
        let b = [3.0, 4.0, 0.0, 0.0, 0.0];
        assert_eq!(euclidean_distance(&a, &b), 5.0);
    }
}
