use crate::codec::CacheEntry;
use crate::domain::CacheConfig;
use crate::ports::{EntryCache, StorageFactory};
use parking_lot::RwLock;
use shared::{Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};

type ErasedTable = Arc<dyn Any + Send + Sync>;

/// Maps a namespace to its cache table.
///
/// Repositories built against the same namespace share one table, so a flush
/// through one of them is seen by all. A namespace is bound to the entity type
/// that created it.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    tables: Arc<RwLock<HashMap<String, ErasedTable>>>,
}

impl Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("namespaces", &self.namespaces())
            .finish()
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the table for `config.namespace`, creating it through `factory` on
    /// first use
    pub fn table<T, F>(&self, config: &CacheConfig, factory: &F) -> Result<EntryCache<T>>
    where
        T: Send + Sync + 'static,
        F: StorageFactory<String, CacheEntry<T>> + ?Sized,
    {
        config.validate()?;

        if let Some(existing) = self.tables.read().get(&config.namespace) {
            return Self::downcast(&config.namespace, existing);
        }

        let mut tables = self.tables.write();
        // Another caller may have created it between the two locks
        if let Some(existing) = tables.get(&config.namespace) {
            return Self::downcast(&config.namespace, existing);
        }

        let store = factory.create_from_config(config);
        tables.insert(config.namespace.clone(), Arc::new(store.clone()));
        info!(namespace = %config.namespace, "Created cache table");
        Ok(store)
    }

    /// Forget a namespace; repositories already holding the table keep it
    pub fn drop_table(&self, namespace: &str) -> bool {
        let dropped = self.tables.write().remove(namespace).is_some();
        if dropped {
            debug!(namespace, "Dropped cache table");
        }
        dropped
    }

    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn downcast<T>(namespace: &str, table: &ErasedTable) -> Result<EntryCache<T>>
    where
        T: Send + Sync + 'static,
    {
        table.downcast_ref::<EntryCache<T>>().cloned().ok_or_else(|| {
            Error::Config(format!(
                "namespace '{}' is already bound to a different entity type",
                namespace
            ))
        })
    }
}
