#![deny(clippy::all)]

use crate::codec::CacheEntry;
use crate::domain::CacheConfig;
use crate::domain::response::DeleteResponse;
use shared::{Result, StoreResult, Ttl};
use std::collections::HashMap;
use std::sync::Arc;

// Ports are the pluggable extension points for cache and store implementations

/// Port for creating cache storage from configuration
/// This allows different storage backends to be plugged in
pub trait StorageFactory<K, V>: Send + Sync + 'static {
    /// Create a new cache store from configuration
    fn create_from_config(&self, config: &CacheConfig) -> Arc<dyn CacheStore<K, V>>;
}

/// Port for a process-local, TTL-aware key/value cache (e.g., Moka)
///
/// Every call is individually atomic and safe from any thread. `get` returns
/// `Ok(None)` for missing and expired keys alike.
pub trait CacheStore<K, V>: Send + Sync + 'static {
    fn get(&self, key: &K) -> Result<Option<V>>;
    fn put(&self, key: K, val: V, ttl: Ttl) -> Result<()>;
    fn delete(&self, key: &K) -> Result<DeleteResponse>;
    fn flush(&self) -> Result<()>;
    fn entry_count(&self) -> u64;
}

/// Cache table used by a repository for entity type `T`.
pub type EntryCache<T> = Arc<dyn CacheStore<String, CacheEntry<T>>>;

/// Port for the authoritative store behind a repository
pub trait PersistentStore<T, ID>: Send + Sync {
    /// Find an entity by ID, `None` when it does not exist
    fn find_by_id(&self, id: &ID) -> StoreResult<Option<T>>;

    /// Full scan of the entity collection
    fn find_all(&self) -> StoreResult<Vec<T>>;

    /// Entities for unknown IDs are simply left out. Each returned entity's key
    /// should equal the ID it was requested by
    fn find_by_ids(&self, ids: &[ID]) -> StoreResult<Vec<T>>;

    /// Insert or replace by primary key
    fn upsert(&self, entity: &T) -> StoreResult<()>;

    /// Delete an entity by ID
    fn delete_by_id(&self, id: &ID) -> StoreResult<()>;
}

/// Cached data access for one entity type.
pub trait CacheRepository<T, ID>: Send + Sync {
    /// Get an entity by ID, `Error::NotFound` when it does not exist
    fn get_by_id(&self, id: &ID) -> Result<Arc<T>>;

    /// Get every entity
    fn get_all(&self) -> Result<Vec<Arc<T>>>;

    /// Persist an entity, then refresh its cache entry
    fn save(&self, entity: T) -> Result<()>;

    /// Delete an entity, then drop its cache entry
    fn delete(&self, id: &ID) -> Result<()>;

    /// Drop one cached entity
    fn clear_cache(&self, id: &ID) -> Result<()>;

    /// Drop everything cached in this repository's namespace
    fn clear_all_cache(&self) -> Result<()>;

    /// Resolve many IDs at once; unresolvable IDs are omitted
    fn batch_get(&self, ids: &[ID]) -> Result<HashMap<ID, Arc<T>>>;
}
