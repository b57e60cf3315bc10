pub mod moka_cache;

pub use moka_cache::MokaCache;

use stash::domain::CacheConfig;
use stash::ports::{CacheStore, StorageFactory};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`MokaCache`] per namespace, sized by `max_entries`
#[derive(Clone, Copy, Debug, Default)]
pub struct MokaStorageFactory;

impl<K, V> StorageFactory<K, V> for MokaStorageFactory
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn create_from_config(&self, config: &CacheConfig) -> Arc<dyn CacheStore<K, V>> {
        debug!(
            namespace = %config.namespace,
            max_entries = ?config.max_entries,
            ttl_ms = config.ttl.as_millis(),
            "Building moka cache table"
        );
        Arc::new(MokaCache::new(&config.namespace, config.max_entries))
    }
}
