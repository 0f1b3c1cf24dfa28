//! In-process cache table

use crate::table::{CacheRow, CacheTable, CacheTransaction, LookupWindow, TableState};
use nearby_core::{NearbyError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cache table held in memory. Transactions run on a copy of the rows under
/// the table lock and are committed by swapping the copy in.
#[derive(Debug)]
pub struct MemoryCacheTable {
    state: Mutex<TableState>,
    available: AtomicBool,
}

impl MemoryCacheTable {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TableState::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing the connection to the table.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Snapshot of all rows, oldest first.
    pub fn rows(&self) -> Vec<CacheRow> {
        self.state.lock().rows().to_vec()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(NearbyError::cache_store("connection refused"))
        }
    }
}

impl Default for MemoryCacheTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheTable for MemoryCacheTable {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn CacheTransaction) -> Result<()>,
    ) -> Result<()> {
        self.check_available()?;

        let mut state = self.state.lock();
        let mut working = state.clone();
        work(&mut working)?;
        *state = working;
        Ok(())
    }

    fn latest_match(&self, window: &LookupWindow) -> Result<Option<CacheRow>> {
        self.check_available()?;
        Ok(self.state.lock().latest_match(window))
    }

    fn row_count(&self) -> Result<usize> {
        self.check_available()?;
        Ok(self.state.lock().count())
    }
}
