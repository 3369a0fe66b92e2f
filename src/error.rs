use thiserror::Error;

/// Returned by `get`/`get_mut` when no entry has an equal key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("key not found")]
    NotFound,
}

/// Rejected `MapConfig` values.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("initial capacity must be at least one bucket")]
    ZeroCapacity,
    #[error("max load factor must be finite and at least 0.1, got {0}")]
    InvalidLoadFactor(f64),
}
