//! Cache configuration options

use nearby_core::TOP_K;

/// Configuration for the query cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Row count at which the next store flushes the whole table
    pub capacity: usize,
    /// Half-width of the lookup window on each axis, in degrees
    pub tolerance_degrees: f64,
    /// Results kept per row
    pub max_results: usize,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            tolerance_degrees: 0.001,
            max_results: TOP_K,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom capacity and tolerance
    pub fn new(capacity: usize, tolerance_degrees: f64) -> Self {
        Self::default()
            .with_capacity(capacity)
            .with_tolerance(tolerance_degrees)
    }

    /// Create a disabled cache configuration
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the flush threshold. A capacity of zero is raised to one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the lookup tolerance in degrees
    pub fn with_tolerance(mut self, tolerance_degrees: f64) -> Self {
        self.tolerance_degrees = tolerance_degrees.abs();
        self
    }

    /// Set how many results a row keeps
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Enable or disable the cache
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
