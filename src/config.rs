//! Sizing knobs for `ChainedHashMap`.

use crate::error::ConfigError;

/// Bucket count used by `ChainedHashMap::new`.
pub const DEFAULT_CAPACITY: usize = 10;

/// Growth triggers once `len / capacity` reaches this ratio.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.8;

/// Smallest accepted max load factor. Each insert grows at most
/// `log2(1 / MIN_LOAD_FACTOR)` times past the entry count.
pub const MIN_LOAD_FACTOR: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapConfig {
    /// Number of buckets allocated up front. Must be non-zero.
    pub initial_capacity: usize,
    /// Load factor at which capacity doubles. Must be finite and at least
    /// `MIN_LOAD_FACTOR`.
    pub max_load_factor: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.max_load_factor.is_finite() && self.max_load_factor >= MIN_LOAD_FACTOR) {
            return Err(ConfigError::InvalidLoadFactor(self.max_load_factor));
        }
        Ok(())
    }
}
