use ahash::AHashSet;
use nearby_core::{normalize_cuisine, RestaurantRecord, Result};
use std::fmt::Debug;
use tracing::debug;

/// A lazy stream of restaurant documents. Items that fail with
/// `MalformedRecord` can be skipped; any other error ends the scan.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<RestaurantRecord>> + 'a>;

pub trait RestaurantSource: Debug + Send + Sync {
    /// Start a full scan of the collection.
    fn scan(&self) -> Result<RecordStream<'_>>;

    /// Distinct, lowercased, non-empty cuisine values, sorted.
    fn distinct_cuisines(&self) -> Result<Vec<String>> {
        let mut seen = AHashSet::new();
        for record in self.scan()? {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_recoverable_record() => {
                    debug!("Skipping document while listing cuisines: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let cuisine = normalize_cuisine(record.cuisine.as_deref());
            if !cuisine.is_empty() {
                seen.insert(cuisine);
            }
        }

        let mut cuisines: Vec<String> = seen.into_iter().collect();
        cuisines.sort();
        Ok(cuisines)
    }
}
