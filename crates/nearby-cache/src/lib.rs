//! Query result cache for the nearby search
//!
//! Answers are memoized in a small table keyed by an approximate query
//! signature: the query coordinate, matched within a fixed tolerance window,
//! plus the cuisine filter.
//!
//! # Features
//!
//! - **Tolerant lookup**: any stored row within ±0.001° on both axes matches
//! - **Full-flush eviction**: once the table holds `capacity` rows, the next
//!   store clears it before inserting
//! - **Best effort**: lookups and stores never fail; collaborator errors are
//!   logged and counted, and the caller sees a miss
//! - **Transactional stores**: count, flush, and insert run in one table
//!   transaction
//! - **Statistics**: hits, misses, flushes, and failures
//!
//! # Example
//!
//! ```ignore
//! use nearby_cache::{CacheConfig, MemoryCacheTable, QueryCache};
//! use std::sync::Arc;
//!
//! let cache = QueryCache::new(Arc::new(MemoryCacheTable::new()), CacheConfig::default());
//!
//! if let Some(results) = cache.lookup(coordinate, &filter) {
//!     return results;
//! }
//!
//! let results = search(coordinate, &filter)?;
//! cache.store(coordinate, &filter, &results);
//! ```

pub mod cache;
pub mod config;
pub mod file;
pub mod memory;
pub mod payload;
pub mod stats;
pub mod table;

pub use cache::QueryCache;
pub use config::CacheConfig;
pub use file::JsonFileCacheTable;
pub use memory::MemoryCacheTable;
pub use payload::CachePayload;
pub use stats::CacheStats;
pub use table::{CacheRow, CacheTable, CacheTransaction, LookupWindow, NewCacheRow, TableState};
