//! Cache table abstraction
//!
//! The cache is backed by a table with scalar columns (latitude, longitude,
//! cuisine, creation time) and one opaque payload column. Coordinates are kept
//! at six fractional digits and compared as integer micro-degrees, so window
//! boundaries are exact.

use crate::payload::CachePayload;
use chrono::{DateTime, Utc};
use nearby_core::{Coordinate, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::RangeInclusive;

/// Fractional digits kept for stored coordinates
pub const COORDINATE_PRECISION: u32 = 6;

const MICRO_DEGREES: f64 = 1_000_000.0;

/// Float noise allowed when scaling a query coordinate, in micro-degrees
const SCALE_SLACK: f64 = 1e-6;

fn to_micro_degrees(degrees: f64) -> i64 {
    (degrees * MICRO_DEGREES).round() as i64
}

/// Stored micro-degree values within `tolerance` of the unrounded `center`.
fn micro_degree_bounds(center: f64, tolerance: i64) -> RangeInclusive<i64> {
    let center = center * MICRO_DEGREES;
    let tolerance = tolerance as f64;
    let low = (center - tolerance - SCALE_SLACK).ceil() as i64;
    let high = (center + tolerance + SCALE_SLACK).floor() as i64;
    low..=high
}

/// A persisted cache row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRow {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub cuisine: Option<String>,
    pub results: CachePayload,
    pub created_at: DateTime<Utc>,
}

/// A row about to be inserted; the table assigns the id.
#[derive(Debug, Clone)]
pub struct NewCacheRow {
    pub coordinate: Coordinate,
    pub cuisine: Option<String>,
    pub results: CachePayload,
    pub created_at: DateTime<Utc>,
}

impl NewCacheRow {
    pub fn new(coordinate: Coordinate, cuisine: Option<&str>, results: CachePayload) -> Self {
        Self {
            coordinate,
            cuisine: cuisine.map(str::to_string),
            results,
            created_at: Utc::now(),
        }
    }
}

/// Range-plus-equality predicate used to find cached answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupWindow {
    latitude: RangeInclusive<i64>,
    longitude: RangeInclusive<i64>,
    cuisine: Option<String>,
}

impl LookupWindow {
    /// Rows within `tolerance_degrees` of `center` on both axes whose cuisine
    /// equals `cuisine`, where `None` only matches rows stored without one.
    /// The center is not rounded: stored values are compared against the
    /// exact center plus or minus the tolerance.
    pub fn around(center: Coordinate, tolerance_degrees: f64, cuisine: Option<&str>) -> Self {
        let tolerance = to_micro_degrees(tolerance_degrees.abs());
        Self {
            latitude: micro_degree_bounds(center.latitude, tolerance),
            longitude: micro_degree_bounds(center.longitude, tolerance),
            cuisine: cuisine.map(str::to_string),
        }
    }

    pub fn contains(&self, row: &CacheRow) -> bool {
        self.latitude.contains(&to_micro_degrees(row.latitude))
            && self.longitude.contains(&to_micro_degrees(row.longitude))
            && self.cuisine == row.cuisine
    }
}

/// Writes available inside a table transaction.
pub trait CacheTransaction {
    /// Number of rows currently in the table
    fn count(&self) -> usize;

    /// Delete every row, returning how many were removed
    fn delete_all(&mut self) -> usize;

    /// Insert a row, returning its id
    fn insert(&mut self, row: NewCacheRow) -> Result<u64>;
}

/// Storage behind the query cache.
pub trait CacheTable: Debug + Send + Sync {
    /// Run `work` atomically: either all of its writes become visible or none do.
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn CacheTransaction) -> Result<()>,
    ) -> Result<()>;

    /// The most recently created row inside `window`, if any.
    fn latest_match(&self, window: &LookupWindow) -> Result<Option<CacheRow>>;

    /// Number of rows in the table
    fn row_count(&self) -> Result<usize>;

    /// Delete every row, returning how many were removed
    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        self.transaction(&mut |tx| {
            removed = tx.delete_all();
            Ok(())
        })?;
        Ok(removed)
    }
}

/// Row storage shared by the table implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableState {
    rows: Vec<CacheRow>,
    next_id: u64,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[CacheRow] {
        &self.rows
    }

    /// Latest `created_at` wins; on equal timestamps the later insert wins.
    pub fn latest_match(&self, window: &LookupWindow) -> Option<CacheRow> {
        self.rows
            .iter()
            .filter(|row| window.contains(row))
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned()
    }
}

impl CacheTransaction for TableState {
    fn count(&self) -> usize {
        self.rows.len()
    }

    fn delete_all(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }

    fn insert(&mut self, row: NewCacheRow) -> Result<u64> {
        self.next_id += 1;
        let coordinate = row.coordinate.rounded(COORDINATE_PRECISION);
        self.rows.push(CacheRow {
            id: self.next_id,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            cuisine: row.cuisine,
            results: row.results,
            created_at: row.created_at,
        });
        Ok(self.next_id)
    }
}
