//! Cache table persisted as a JSON file
//!
//! Every operation reloads the file, so separate processes pointed at the same
//! path share one cache. A transaction holds an exclusive advisory lock on a
//! sidecar `<file>.lock` from load to save, which serializes writers across
//! processes and handles. Writes go to a uniquely named temp file in the same
//! directory that is renamed over the original once complete.

use crate::table::{CacheRow, CacheTable, CacheTransaction, LookupWindow, TableState};
use fd_lock::RwLock;
use nearby_core::{NearbyError, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct JsonFileCacheTable {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileCacheTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = OsString::from(path.as_os_str());
        lock_name.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// A fresh handle on the lock file. Locks taken through separate handles
    /// exclude each other, within one process as well as across processes.
    fn lock_file(&self) -> Result<RwLock<File>> {
        fs::create_dir_all(self.directory()).map_err(|e| self.write_error(e))?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| self.lock_error(e))?;
        Ok(RwLock::new(file))
    }

    fn load(&self) -> Result<TableState> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(TableState::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                NearbyError::cache_store(format!(
                    "cannot parse {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(TableState::new()),
            Err(e) => Err(NearbyError::cache_store(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, state: &TableState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)?;

        let mut tmp = NamedTempFile::new_in(self.directory()).map_err(|e| self.write_error(e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, err: std::io::Error) -> NearbyError {
        NearbyError::cache_store(format!("cannot write {}: {}", self.path.display(), err))
    }

    fn lock_error(&self, err: std::io::Error) -> NearbyError {
        NearbyError::cache_store(format!("cannot lock {}: {}", self.lock_path.display(), err))
    }
}

impl CacheTable for JsonFileCacheTable {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn CacheTransaction) -> Result<()>,
    ) -> Result<()> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write().map_err(|e| self.lock_error(e))?;
        let mut state = self.load()?;
        work(&mut state)?;
        self.save(&state)
    }

    fn latest_match(&self, window: &LookupWindow) -> Result<Option<CacheRow>> {
        let lock = self.lock_file()?;
        let _guard = lock.read().map_err(|e| self.lock_error(e))?;
        Ok(self.load()?.latest_match(window))
    }

    fn row_count(&self) -> Result<usize> {
        let lock = self.lock_file()?;
        let _guard = lock.read().map_err(|e| self.lock_error(e))?;
        Ok(self.load()?.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::CachePayload;
    use crate::table::NewCacheRow;
    use nearby_core::Coordinate;
    use tempfile::TempDir;

    fn insert(table: &JsonFileCacheTable, lat: f64) {
        table
            .transaction(&mut |tx| {
                tx.insert(NewCacheRow::new(
                    Coordinate::new(lat, -73.9851),
                    Some("pizza"),
                    CachePayload::from_raw("[]"),
                ))?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let dir = TempDir::new().unwrap();
        let table = JsonFileCacheTable::new(dir.path().join("cache.json"));
        assert_eq!(table.row_count().unwrap(), 0);
    }

    #[test]
    fn test_rows_persist_across_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        insert(&JsonFileCacheTable::new(&path), 40.7589);
        insert(&JsonFileCacheTable::new(&path), 40.8000);

        let reopened = JsonFileCacheTable::new(&path);
        assert_eq!(reopened.row_count().unwrap(), 2);

        let window = LookupWindow::around(Coordinate::new(40.8005, -73.9851), 0.001, Some("pizza"));
        let row = reopened.latest_match(&window).unwrap().unwrap();
        assert_eq!(row.id, 2);
        assert_eq!(row.latitude, 40.8);
    }

    #[test]
    fn test_failed_transaction_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let table = JsonFileCacheTable::new(dir.path().join("cache.json"));
        insert(&table, 40.7589);

        let result = table.transaction(&mut |tx| {
            tx.delete_all();
            Err(NearbyError::cache_store("aborted"))
        });
        assert!(result.is_err());
        assert_eq!(table.row_count().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ definitely not a table").unwrap();

        let table = JsonFileCacheTable::new(&path);
        assert!(matches!(
            table.row_count(),
            Err(NearbyError::CollaboratorUnavailable { .. })
        ));
    }

    #[test]
    fn test_concurrent_handles_keep_every_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let path = path.clone();
                scope.spawn(move || {
                    let table = JsonFileCacheTable::new(path);
                    for i in 0..5 {
                        insert(&table, 40.6 + 0.01 * (worker * 5 + i) as f64);
                    }
                });
            }
        });

        let table = JsonFileCacheTable::new(&path);
        assert_eq!(table.row_count().unwrap(), 20);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "cache.json" && name != "cache.json.lock")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {:?}", leftovers);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let table = JsonFileCacheTable::new(dir.path().join("cache.json"));
        insert(&table, 40.7589);
        insert(&table, 40.7600);
        assert_eq!(table.clear().unwrap(), 2);
        assert_eq!(table.row_count().unwrap(), 0);
    }
}
