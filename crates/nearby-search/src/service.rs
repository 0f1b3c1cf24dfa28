//! Cached nearby search
//!
//! Answers a query from the cache when a recent query close enough to it was
//! already answered, and otherwise scans the restaurant collection.

use crate::selector::{Selection, TopKSelector};
use nearby_cache::{CacheStats, QueryCache};
use nearby_core::{Coordinate, CuisineFilter, RankedResult, Result};
use nearby_storage::RestaurantSource;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Where the results of a query came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ResultSource {
    Cache,
    Live,
    /// The restaurant collection could not be read.
    Unavailable { reason: String },
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Cache => write!(f, "CACHE"),
            ResultSource::Live => write!(f, "LIVE"),
            ResultSource::Unavailable { .. } => write!(f, "UNAVAILABLE"),
        }
    }
}

/// Answer to one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub results: Vec<RankedResult>,
    /// Matches seen by a live scan. For cached answers this is only the
    /// number of stored results.
    pub match_count: usize,
    pub source: ResultSource,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl QueryOutcome {
    pub fn is_cached(&self) -> bool {
        self.source == ResultSource::Cache
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.source, ResultSource::Unavailable { .. })
    }
}

/// Nearest-restaurant search with a read-through query cache
pub struct NearbySearch {
    source: Arc<dyn RestaurantSource>,
    cache: Arc<QueryCache>,
    selector: TopKSelector,
}

impl NearbySearch {
    pub fn new(source: Arc<dyn RestaurantSource>, cache: Arc<QueryCache>) -> Self {
        Self {
            source,
            cache,
            selector: TopKSelector::default(),
        }
    }

    pub fn with_selector(mut self, selector: TopKSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Answer a query, preferring the cache.
    ///
    /// Cached answers are returned verbatim even if the collection changed
    /// since they were stored. A live answer is cached only when it is not
    /// empty. A collection failure yields an empty `Unavailable` outcome.
    pub fn run_query(&self, coordinate: Coordinate, filter: &CuisineFilter) -> QueryOutcome {
        let start = Instant::now();

        if let Some(results) = self.cache.lookup(coordinate, filter) {
            info!("Served {} ({}) from cache", coordinate, filter);
            return QueryOutcome {
                match_count: results.len(),
                results,
                source: ResultSource::Cache,
                elapsed: start.elapsed(),
            };
        }

        match self.scan(coordinate, filter) {
            Ok(selection) => {
                if !selection.top.is_empty() {
                    self.cache.store(coordinate, filter, &selection.top);
                }
                info!(
                    "Live search for {} ({}): {} matches",
                    coordinate, filter, selection.match_count
                );
                QueryOutcome {
                    results: selection.top,
                    match_count: selection.match_count,
                    source: ResultSource::Live,
                    elapsed: start.elapsed(),
                }
            }
            Err(e) => {
                error!("Live search for {} failed: {}", coordinate, e);
                QueryOutcome {
                    results: Vec::new(),
                    match_count: 0,
                    source: ResultSource::Unavailable {
                        reason: e.to_string(),
                    },
                    elapsed: start.elapsed(),
                }
            }
        }
    }

    fn scan(&self, coordinate: Coordinate, filter: &CuisineFilter) -> Result<Selection> {
        let candidates = self.source.scan()?;
        self.selector.select(coordinate, filter, candidates)
    }

    /// Distinct cuisines present in the collection
    pub fn known_cuisines(&self) -> Result<Vec<String>> {
        self.source.distinct_cuisines()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> Arc<CacheStats> {
        self.cache.stats()
    }
}

impl fmt::Debug for NearbySearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearbySearch")
            .field("source", &self.source)
            .field("cache", &self.cache)
            .field("k", &self.selector.k())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearby_cache::{CacheConfig, MemoryCacheTable};
    use nearby_core::RestaurantRecord;
    use nearby_storage::MemoryRestaurantSource;

    const TIMES_SQUARE: Coordinate = Coordinate {
        latitude: 40.7589,
        longitude: -73.9851,
    };

    fn restaurants() -> Vec<RestaurantRecord> {
        vec![
            RestaurantRecord::at("Carmine's", Some("Italian"), Coordinate::new(40.7573, -73.9860)),
            RestaurantRecord::at("Joe Allen", Some("American"), Coordinate::new(40.7594, -73.9884)),
            RestaurantRecord::at("Becco", Some("Italian"), Coordinate::new(40.7608, -73.9880)),
            RestaurantRecord::at("Lattanzi", Some("Italian"), Coordinate::new(40.7604, -73.9897)),
            RestaurantRecord::at("Patsy's", Some("Italian"), Coordinate::new(40.7650, -73.9829)),
            RestaurantRecord::at("Katz's", Some("Delicatessen"), Coordinate::new(40.7223, -73.9874)),
        ]
    }

    struct Fixture {
        source: Arc<MemoryRestaurantSource>,
        table: Arc<MemoryCacheTable>,
        search: NearbySearch,
    }

    fn fixture() -> Fixture {
        let source = Arc::new(MemoryRestaurantSource::new(restaurants()));
        let table = Arc::new(MemoryCacheTable::new());
        let cache = Arc::new(QueryCache::new(table.clone(), CacheConfig::default()));
        let search = NearbySearch::new(source.clone(), cache);
        Fixture {
            source,
            table,
            search,
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let fx = fixture();
        let italian = CuisineFilter::new("Italian");

        let live = fx.search.run_query(TIMES_SQUARE, &italian);
        assert_eq!(live.source, ResultSource::Live);
        assert_eq!(live.match_count, 4);
        assert_eq!(live.results.len(), 3);
        assert_eq!(live.results[0].name, "Carmine's");
        assert!(live
            .results
            .windows(2)
            .all(|w| w[0].distance_km <= w[1].distance_km));

        let cached = fx.search.run_query(Coordinate::new(40.7595, -73.9855), &italian);
        assert!(cached.is_cached());
        assert_eq!(cached.results, live.results);
        assert_eq!(cached.match_count, 3);
        assert_eq!(fx.search.cache_stats().hits(), 1);
    }

    #[test]
    fn test_filter_separates_cache_entries() {
        let fx = fixture();
        fx.search.run_query(TIMES_SQUARE, &CuisineFilter::new("italian"));

        let any = fx.search.run_query(TIMES_SQUARE, &CuisineFilter::any());
        assert_eq!(any.source, ResultSource::Live);
        assert_eq!(any.match_count, 6);
        assert_eq!(fx.table.rows().len(), 2);
    }

    #[test]
    fn test_cached_answers_can_be_stale() {
        let fx = fixture();
        let filter = CuisineFilter::any();
        let first = fx.search.run_query(TIMES_SQUARE, &filter);

        fx.source
            .push(RestaurantRecord::at("Right Here", None, TIMES_SQUARE));

        let second = fx.search.run_query(TIMES_SQUARE, &filter);
        assert!(second.is_cached());
        assert_eq!(second.results, first.results);
    }

    #[test]
    fn test_collection_smaller_than_k() {
        let source = Arc::new(MemoryRestaurantSource::new(restaurants()[..2].to_vec()));
        let table = Arc::new(MemoryCacheTable::new());
        let search = NearbySearch::new(source, Arc::new(QueryCache::with_defaults(table.clone())));

        let outcome = search.run_query(TIMES_SQUARE, &CuisineFilter::new(""));
        assert_eq!(outcome.source, ResultSource::Live);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.match_count, 2);
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].cuisine, None);
    }

    #[test]
    fn test_empty_answer_is_not_cached() {
        let fx = fixture();
        let filter = CuisineFilter::new("ethiopian");

        let outcome = fx.search.run_query(TIMES_SQUARE, &filter);
        assert_eq!(outcome.source, ResultSource::Live);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.match_count, 0);
        assert!(fx.table.rows().is_empty());

        assert_eq!(fx.search.run_query(TIMES_SQUARE, &filter).source, ResultSource::Live);
    }

    #[test]
    fn test_unreachable_collection() {
        let source = Arc::new(MemoryRestaurantSource::unavailable());
        let table = Arc::new(MemoryCacheTable::new());
        let search = NearbySearch::new(source, Arc::new(QueryCache::with_defaults(table.clone())));

        let outcome = search.run_query(TIMES_SQUARE, &CuisineFilter::any());
        assert!(!outcome.is_available());
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.match_count, 0);
        assert!(table.rows().is_empty());
        assert!(search.known_cuisines().is_err());
    }

    #[test]
    fn test_fault_mid_scan_gives_no_partial_results() {
        let source = Arc::new(MemoryRestaurantSource::new(restaurants()).with_failure_after(2));
        let cache = Arc::new(QueryCache::with_defaults(Arc::new(MemoryCacheTable::new())));
        let search = NearbySearch::new(source, cache);

        let outcome = search.run_query(TIMES_SQUARE, &CuisineFilter::any());
        match outcome.source {
            ResultSource::Unavailable { reason } => assert!(reason.contains("connection reset")),
            other => panic!("expected unavailable, got {:?}", other),
        }
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_cache_outage_falls_back_to_live() {
        let fx = fixture();
        fx.table.set_available(false);

        let filter = CuisineFilter::any();
        for _ in 0..2 {
            let outcome = fx.search.run_query(TIMES_SQUARE, &filter);
            assert_eq!(outcome.source, ResultSource::Live);
            assert_eq!(outcome.results.len(), 3);
        }
        assert_eq!(fx.search.cache_stats().store_failures(), 2);
    }

    #[test]
    fn test_known_cuisines() {
        let fx = fixture();
        fx.source
            .push(RestaurantRecord::at("Sushi", Some(" ITALIAN"), TIMES_SQUARE));
        assert_eq!(
            fx.search.known_cuisines().unwrap(),
            vec!["american", "delicatessen", "italian"]
        );
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ResultSource::Cache.to_string(), "CACHE");
        assert_eq!(ResultSource::Live.to_string(), "LIVE");
        assert_eq!(
            ResultSource::Unavailable {
                reason: "down".into()
            }
            .to_string(),
            "UNAVAILABLE"
        );
    }
}
