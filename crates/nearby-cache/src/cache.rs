//! Coordinate-tolerant query cache with full-flush eviction

use crate::config::CacheConfig;
use crate::payload::CachePayload;
use crate::stats::CacheStats;
use crate::table::{CacheTable, LookupWindow, NewCacheRow};
use nearby_core::{Coordinate, CuisineFilter, RankedResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Best-effort cache of query answers.
///
/// Neither [`lookup`](QueryCache::lookup) nor [`store`](QueryCache::store)
/// reports errors: a table that cannot be reached, or a row that cannot be
/// decoded, looks like a miss to the caller.
pub struct QueryCache {
    table: Arc<dyn CacheTable>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl QueryCache {
    pub fn new(table: Arc<dyn CacheTable>, config: CacheConfig) -> Self {
        Self {
            table,
            config,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Create a cache over `table` with default configuration
    pub fn with_defaults(table: Arc<dyn CacheTable>) -> Self {
        Self::new(table, CacheConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Return the answer stored for the most recent query within tolerance of
    /// `coordinate` with the same cuisine filter. The stored list is returned
    /// as-is; distances are not recomputed for the new coordinate.
    pub fn lookup(&self, coordinate: Coordinate, filter: &CuisineFilter) -> Option<Vec<RankedResult>> {
        if !self.config.enabled {
            return None;
        }

        let window = LookupWindow::around(coordinate, self.config.tolerance_degrees, filter.as_option());
        let row = match self.table.latest_match(&window) {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.stats.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {}", e);
                self.stats.record_lookup_failure();
                self.stats.record_miss();
                return None;
            }
        };

        match row.results.decode() {
            Ok(results) if !results.is_empty() => {
                debug!("Cache hit on row {} for {} ({})", row.id, coordinate, filter);
                self.stats.record_hit();
                Some(results)
            }
            Ok(_) => {
                self.stats.record_miss();
                None
            }
            Err(e) => {
                warn!("Cache row {} has an unreadable payload: {}", row.id, e);
                self.stats.record_decode_failure();
                self.stats.record_miss();
                None
            }
        }
    }

    /// Record the answer for a query. When the table already holds
    /// `capacity` rows it is emptied first, inside the same transaction.
    pub fn store(&self, coordinate: Coordinate, filter: &CuisineFilter, results: &[RankedResult]) {
        if !self.config.enabled {
            return;
        }

        let kept = &results[..results.len().min(self.config.max_results)];
        let payload = match CachePayload::encode(kept) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot encode results for the cache: {}", e);
                self.stats.record_store_failure();
                return;
            }
        };

        let row = NewCacheRow::new(coordinate, filter.as_option(), payload);
        let capacity = self.config.capacity;
        let mut flushed = 0;

        let outcome = self.table.transaction(&mut |tx| {
            flushed = 0;
            if tx.count() >= capacity {
                flushed = tx.delete_all();
            }
            tx.insert(row.clone())?;
            Ok(())
        });

        match outcome {
            Ok(()) => {
                self.stats.record_store();
                if flushed > 0 {
                    info!("Cache flushed ({} entries reached)", flushed);
                    self.stats.record_flush(flushed as u64);
                }
            }
            Err(e) => {
                warn!("Cache update failed, result not cached: {}", e);
                self.stats.record_store_failure();
            }
        }
    }

    /// Delete every cached row, returning how many were removed
    pub fn clear(&self) -> usize {
        match self.table.clear() {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Cache clear failed: {}", e);
                0
            }
        }
    }

    /// Number of rows in the table, or zero when it cannot be reached
    pub fn len(&self) -> usize {
        self.table.row_count().unwrap_or_else(|e| {
            warn!("Cannot count cache rows: {}", e);
            0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("table", &self.table)
            .field("enabled", &self.config.enabled)
            .field("capacity", &self.config.capacity)
            .field("tolerance_degrees", &self.config.tolerance_degrees)
            .finish()
    }
}
