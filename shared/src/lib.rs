// shared/src/lib.rs

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("cache store: {0}")]
    Cache(String),
}

/// Failures reported by a persistent store adapter.
///
/// These are handed back to the caller untouched; nothing in the cache layer
/// retries or caches them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Time-to-live applied to a cache entry at insertion.
///
/// Expiry is absolute: reads never extend it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ttl {
    #[default]
    Never,
    After(Duration),
}

impl Ttl {
    /// Zero means the entry never expires.
    pub fn from_millis(ms: u64) -> Self {
        Self::from_duration(Duration::from_millis(ms))
    }

    pub fn from_duration(d: Duration) -> Self {
        if d.is_zero() {
            Ttl::Never
        } else {
            Ttl::After(d)
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::Never => None,
            Ttl::After(d) => Some(*d),
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.as_duration()
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

pub mod config;
