//! In-memory restaurant collection

use crate::source::{RecordStream, RestaurantSource};
use nearby_core::{NearbyError, RestaurantRecord, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// A stored item: either a document or a document that could not be decoded.
#[derive(Debug, Clone)]
enum Slot {
    Record(RestaurantRecord),
    Malformed(String),
}

/// In-memory collection that can also simulate an unreachable store.
#[derive(Debug)]
pub struct MemoryRestaurantSource {
    slots: RwLock<Vec<Slot>>,
    available: AtomicBool,
    /// Fail the scan after this many items have been yielded
    fail_after: Option<usize>,
}

impl MemoryRestaurantSource {
    pub fn new(records: Vec<RestaurantRecord>) -> Self {
        Self {
            slots: RwLock::new(records.into_iter().map(Slot::Record).collect()),
            available: AtomicBool::new(true),
            fail_after: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A collection whose scans always fail, as if the server were down.
    pub fn unavailable() -> Self {
        let source = Self::empty();
        source.set_available(false);
        source
    }

    /// Make scans fail with an I/O fault after `count` items.
    pub fn with_failure_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn push(&self, record: RestaurantRecord) {
        self.slots.write().push(Slot::Record(record));
    }

    /// Append an undecodable document.
    pub fn push_malformed(&self, reason: impl Into<String>) {
        self.slots.write().push(Slot::Malformed(reason.into()));
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl RestaurantSource for MemoryRestaurantSource {
    fn scan(&self) -> Result<RecordStream<'_>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(NearbyError::document_store("connection refused"));
        }

        let slots = self.slots.read().clone();
        let fail_after = self.fail_after;

        let items = slots.into_iter().map(|slot| match slot {
            Slot::Record(record) => Ok(record),
            Slot::Malformed(reason) => Err(NearbyError::MalformedRecord(reason)),
        });

        match fail_after {
            Some(count) => {
                let fault = std::iter::once(Err(NearbyError::document_store(
                    "connection reset during scan",
                )));
                Ok(Box::new(items.take(count).chain(fault)))
            }
            None => Ok(Box::new(items)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearby_core::Coordinate;

    fn record(name: &str, cuisine: Option<&str>) -> RestaurantRecord {
        RestaurantRecord::at(name, cuisine, Coordinate::new(40.75, -73.98))
    }

    #[test]
    fn test_scan_yields_all_records() {
        let source = MemoryRestaurantSource::new(vec![record("a", None), record("b", None)]);
        let names: Vec<String> = source
            .scan()
            .unwrap()
            .map(|r| r.unwrap().display_name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_unavailable_source() {
        let source = MemoryRestaurantSource::unavailable();
        assert!(matches!(
            source.scan(),
            Err(NearbyError::CollaboratorUnavailable { .. })
        ));

        source.set_available(true);
        assert!(source.scan().is_ok());
    }

    #[test]
    fn test_failure_mid_scan() {
        let source =
            MemoryRestaurantSource::new(vec![record("a", None), record("b", None)]).with_failure_after(1);
        let items: Vec<_> = source.scan().unwrap().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            items[1],
            Err(NearbyError::CollaboratorUnavailable { .. })
        ));
    }

    #[test]
    fn test_distinct_cuisines() {
        let source = MemoryRestaurantSource::new(vec![
            record("a", Some("Italian")),
            record("b", Some("italian ")),
            record("c", Some("Thai")),
            record("d", None),
            record("e", Some("")),
        ]);
        source.push_malformed("bad line");
        assert_eq!(source.distinct_cuisines().unwrap(), vec!["italian", "thai"]);
    }
}
