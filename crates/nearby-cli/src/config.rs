use anyhow::{Context, Result};
use clap::ValueEnum;
use nearby_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Newline-delimited JSON export of the restaurant collection
    pub data_path: PathBuf,
    /// JSON file holding the query cache table
    pub cache_path: PathBuf,
    pub cache_capacity: usize,
    pub cache_tolerance: f64,
    pub cache_enabled: bool,
    pub show_timing: bool,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            data_path: PathBuf::from("data/restaurants.json"),
            cache_path: PathBuf::from("data/query_cache.json"),
            cache_capacity: cache.capacity,
            cache_tolerance: cache.tolerance_degrees,
            cache_enabled: cache.enabled,
            show_timing: true,
            output_format: OutputFormat::Table,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache_capacity, self.cache_tolerance).with_enabled(self.cache_enabled)
    }
}
