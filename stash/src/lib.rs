//! Cache-aside repositories over a pluggable cache store and persistent store.

pub mod codec;
pub mod domain;
pub mod keys;
pub mod persistence;
pub mod ports;
pub mod registry;
pub mod repository;

pub use codec::{CacheEntry, Lookup};
pub use domain::{CacheConfig, CacheInfo};
pub use keys::{ALL_KEY, KeyBuilder, KeyExtractor};
pub use ports::{CacheRepository, CacheStore, EntryCache, PersistentStore, StorageFactory};
pub use registry::CacheRegistry;
pub use repository::{CacheAsideRepository, RepositoryBuilder};
