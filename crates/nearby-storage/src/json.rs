use crate::source::{RecordStream, RestaurantSource};
use nearby_core::{NearbyError, RestaurantRecord, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Restaurant collection stored as newline-delimited JSON, one document per
/// line, as produced by `mongoexport` or the relational import job.
#[derive(Debug)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RestaurantSource for JsonLinesSource {
    fn scan(&self) -> Result<RecordStream<'_>> {
        let file = File::open(&self.path).map_err(|e| {
            NearbyError::document_store(format!("cannot open {}: {}", self.path.display(), e))
        })?;
        debug!("Scanning restaurants from {}", self.path.display());
        let reader = BufReader::new(file);

        let records = reader
            .split(b'\n')
            .enumerate()
            .filter_map(|(idx, line)| {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        return Some(Err(NearbyError::document_store(format!(
                            "read failed at line {}: {}",
                            idx + 1,
                            e
                        ))))
                    }
                };
                let line = match String::from_utf8(line) {
                    Ok(line) => line,
                    Err(e) => {
                        return Some(Err(NearbyError::MalformedRecord(format!(
                            "line {}: {}",
                            idx + 1,
                            e
                        ))))
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Some(
                    serde_json::from_str::<RestaurantRecord>(trimmed).map_err(|e| {
                        NearbyError::MalformedRecord(format!("line {}: {}", idx + 1, e))
                    }),
                )
            });

        Ok(Box::new(records))
    }
}
