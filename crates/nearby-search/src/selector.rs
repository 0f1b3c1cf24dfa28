//! Streaming top-K selection by geodesic distance

use nearby_core::{distance_km, Coordinate, CuisineFilter, RankedResult, RestaurantRecord, Result, TOP_K};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Outcome of one selection pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    /// Closest matching restaurants, nearest first
    pub top: Vec<RankedResult>,
    /// Number of candidates that had a usable location and passed the filter
    pub match_count: usize,
}

/// Heap entry ordered by distance, then by the order the candidate was seen.
#[derive(Debug)]
struct HeapEntry {
    distance: f64,
    seq: usize,
    name: String,
    cuisine: Option<String>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Keeps the `k` nearest matching candidates of a single pass over a
/// collection, holding at most `k` entries at any time.
///
/// The heap top is the worst kept entry. A new candidate replaces it only when
/// strictly closer, so among equidistant candidates the first seen are kept.
#[derive(Debug, Clone, Copy)]
pub struct TopKSelector {
    k: usize,
}

impl Default for TopKSelector {
    fn default() -> Self {
        Self::new(TOP_K)
    }
}

impl TopKSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Scan `candidates` once and return the closest matches to `origin`.
    ///
    /// Candidates without a usable location are skipped and not counted, as
    /// are items failing with `MalformedRecord`. Any other error aborts the
    /// scan and is returned without partial results.
    pub fn select<I>(&self, origin: Coordinate, filter: &CuisineFilter, candidates: I) -> Result<Selection>
    where
        I: IntoIterator<Item = Result<RestaurantRecord>>,
    {
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(self.k + 1);
        let mut match_count = 0;

        for (seq, candidate) in candidates.into_iter().enumerate() {
            let record = match candidate {
                Ok(record) => record,
                Err(e) if e.is_recoverable_record() => {
                    debug!("Skipping candidate {}: {}", seq, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(location) = record.coordinate() else {
                continue;
            };
            if !filter.matches(record.cuisine.as_deref()) {
                continue;
            }

            match_count += 1;
            let distance = distance_km(origin, location);

            if heap.len() < self.k {
                heap.push(HeapEntry::from_record(distance, seq, record));
            } else if heap.peek().is_some_and(|worst| distance < worst.distance) {
                heap.pop();
                heap.push(HeapEntry::from_record(distance, seq, record));
            }
        }

        let top = heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| RankedResult::new(entry.name, entry.distance, entry.cuisine))
            .collect();

        Ok(Selection { top, match_count })
    }
}

impl HeapEntry {
    fn from_record(distance: f64, seq: usize, record: RestaurantRecord) -> Self {
        let name = record.display_name().to_string();
        Self {
            distance,
            seq,
            name,
            cuisine: record.cuisine,
        }
    }
}
