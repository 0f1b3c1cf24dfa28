//! Serialized result payload stored in a cache row

use nearby_core::{NearbyError, RankedResult, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which the JSON-encoded result list is stored.
pub const RESULTS_KEY: &str = "results_json";

/// Opaque key/value blob holding the cached result list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CachePayload(BTreeMap<String, String>);

impl CachePayload {
    pub fn encode(results: &[RankedResult]) -> Result<Self> {
        let json = serde_json::to_string(results)?;
        Ok(Self::from_raw(json))
    }

    /// Wrap an already-encoded value without checking it.
    pub fn from_raw(results_json: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(RESULTS_KEY.to_string(), results_json.into());
        Self(map)
    }

    pub fn decode(&self) -> Result<Vec<RankedResult>> {
        let json = self.0.get(RESULTS_KEY).ok_or_else(|| {
            NearbyError::Serialization(format!("payload has no '{}' entry", RESULTS_KEY))
        })?;
        Ok(serde_json::from_str(json)?)
    }
}
