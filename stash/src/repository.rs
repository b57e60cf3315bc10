use crate::codec::{CacheEntry, Lookup};
use crate::domain::{CacheConfig, CacheInfo};
use crate::keys::{ALL_KEY, KeyBuilder, KeyExtractor};
use crate::ports::{CacheRepository, EntryCache, PersistentStore};
use shared::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Cache-aside repository for one entity type.
///
/// Reads are served from the cache when possible and fall back to the
/// persistent store on miss. Writes go to the store first; the cache is only
/// touched once the store has accepted the change.
///
/// The cache is an optimization: a failing cache store degrades to a miss and
/// is never reported to the caller.
pub struct CacheAsideRepository<T, ID> {
    config: CacheConfig,
    keys: KeyBuilder<T, ID>,
    store: Arc<dyn PersistentStore<T, ID>>,
    cache: EntryCache<T>,
}

impl<T, ID> CacheAsideRepository<T, ID>
where
    T: Send + Sync + 'static,
    ID: Display + Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn builder(config: CacheConfig) -> RepositoryBuilder<T, ID> {
        RepositoryBuilder::new(config)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyBuilder<T, ID> {
        &self.keys
    }

    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo::new(self.config.clone(), self.cache.entry_count())
    }

    fn lookup(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.cache.get(&key.to_owned()) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    namespace = %self.config.namespace,
                    key = %key,
                    error = %err,
                    "Cache lookup failed, treating as miss"
                );
                None
            }
        }
    }

    fn populate(&self, key: String, entry: CacheEntry<T>) {
        let tag = entry.tag();
        if let Err(err) = self.cache.put(key.clone(), entry, self.config.ttl) {
            warn!(
                namespace = %self.config.namespace,
                key = %key,
                error = %err,
                "Failed to populate cache"
            );
        } else {
            debug!(namespace = %self.config.namespace, key = %key, tag, "Cached entry");
        }
    }

    fn evict(&self, key: String) {
        match self.cache.delete(&key) {
            Ok(resp) => {
                debug!(
                    namespace = %self.config.namespace,
                    key = %key,
                    deleted = resp.deleted,
                    "Evicted cache entry"
                );
            }
            Err(err) => {
                warn!(
                    namespace = %self.config.namespace,
                    key = %key,
                    error = %err,
                    "Failed to evict cache entry"
                );
            }
        }
    }

    /// Cached state of one id; a mis-tagged slot counts as a miss.
    fn cached(&self, key: &str) -> Lookup<T> {
        let Some(entry) = self.lookup(key) else {
            return Lookup::Miss;
        };
        let tag = entry.tag();
        let lookup = entry.decode();
        if matches!(lookup, Lookup::Miss) {
            warn!(
                namespace = %self.config.namespace,
                key = %key,
                tag,
                "Unexpected entry under id key, treating as miss"
            );
        }
        lookup
    }
}

impl<T, ID> CacheRepository<T, ID> for CacheAsideRepository<T, ID>
where
    T: Send + Sync + 'static,
    ID: Display + Eq + Hash + Clone + Send + Sync + 'static,
{
    fn get_by_id(&self, id: &ID) -> Result<Arc<T>> {
        let key = self.keys.key_for(id);

        match self.cached(&key) {
            Lookup::Hit(entity) => {
                trace!(namespace = %self.config.namespace, key = %key, "Cache hit");
                return Ok(entity);
            }
            Lookup::KnownAbsent => {
                trace!(namespace = %self.config.namespace, key = %key, "Negative cache hit");
                return Err(Error::NotFound);
            }
            Lookup::Miss => {}
        }

        trace!(namespace = %self.config.namespace, key = %key, "Cache miss");
        match self.store.find_by_id(id)? {
            Some(entity) => {
                let entity = Arc::new(entity);
                self.populate(key, CacheEntry::Present(Arc::clone(&entity)));
                Ok(entity)
            }
            None => {
                if self.config.negative_caching {
                    self.populate(key, CacheEntry::Absent);
                }
                Err(Error::NotFound)
            }
        }
    }

    fn get_all(&self) -> Result<Vec<Arc<T>>> {
        let key = ALL_KEY.to_string();

        if let Some(entry) = self.lookup(&key) {
            match entry.into_collection() {
                Some(entities) => {
                    trace!(namespace = %self.config.namespace, "Collection cache hit");
                    return Ok(Vec::clone(&entities));
                }
                None => warn!(
                    namespace = %self.config.namespace,
                    "Non-collection entry under the collection key, treating as miss"
                ),
            }
        }

        trace!(namespace = %self.config.namespace, "Collection cache miss");
        let entities: Vec<Arc<T>> = self
            .store
            .find_all()?
            .into_iter()
            .map(Arc::new)
            .collect();
        self.populate(key, CacheEntry::collection(entities.clone()));
        Ok(entities)
    }

    fn save(&self, entity: T) -> Result<()> {
        self.store.upsert(&entity)?;

        let key = self.keys.key_for_entity(&entity);
        self.populate(key, CacheEntry::present(entity));
        // The snapshot is rebuilt lazily on the next get_all
        self.evict(ALL_KEY.to_string());
        Ok(())
    }

    fn delete(&self, id: &ID) -> Result<()> {
        self.store.delete_by_id(id)?;

        self.evict(self.keys.key_for(id));
        self.evict(ALL_KEY.to_string());
        Ok(())
    }

    fn clear_cache(&self, id: &ID) -> Result<()> {
        self.evict(self.keys.key_for(id));
        Ok(())
    }

    fn clear_all_cache(&self) -> Result<()> {
        match self.cache.flush() {
            Ok(()) => debug!(namespace = %self.config.namespace, "Flushed cache"),
            Err(err) => warn!(
                namespace = %self.config.namespace,
                error = %err,
                "Failed to flush cache"
            ),
        }
        Ok(())
    }

    fn batch_get(&self, ids: &[ID]) -> Result<HashMap<ID, Arc<T>>> {
        let mut result = HashMap::with_capacity(ids.len());
        let mut pending = Vec::new();
        let mut seen = HashSet::with_capacity(ids.len());

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            match self.cached(&self.keys.key_for(id)) {
                Lookup::Hit(entity) => {
                    result.insert(id.clone(), entity);
                }
                Lookup::KnownAbsent => {}
                Lookup::Miss => pending.push(id.clone()),
            }
        }

        trace!(
            namespace = %self.config.namespace,
            hits = result.len(),
            pending = pending.len(),
            "Batch cache lookup"
        );
        if pending.is_empty() {
            return Ok(result);
        }

        let requested: HashSet<&ID> = pending.iter().collect();
        let mut foreign = 0usize;
        for entity in self.store.find_by_ids(&pending)? {
            let id = self.keys.id_of(&entity);
            if !requested.contains(&id) {
                foreign += 1;
            }
            let entity = Arc::new(entity);
            self.populate(self.keys.key_for(&id), CacheEntry::Present(Arc::clone(&entity)));
            result.insert(id, entity);
        }

        // A row keyed differently from every requested id may still answer one
        // of them, so no unresolved id can be proven absent
        if foreign > 0 {
            debug!(
                namespace = %self.config.namespace,
                foreign,
                "Store returned ids outside the request, skipping negative caching"
            );
        } else if self.config.negative_caching {
            for id in pending.iter().filter(|id| !result.contains_key(*id)) {
                self.populate(self.keys.key_for(id), CacheEntry::Absent);
            }
        }

        Ok(result)
    }
}

impl<T, ID> Debug for CacheAsideRepository<T, ID>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheAsideRepository")
            .field("config", &self.config)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

/// Assembles a [`CacheAsideRepository`], failing fast on incomplete wiring.
pub struct RepositoryBuilder<T, ID> {
    config: CacheConfig,
    key_extractor: Option<KeyExtractor<T, ID>>,
    store: Option<Arc<dyn PersistentStore<T, ID>>>,
    cache: Option<EntryCache<T>>,
}

impl<T, ID> RepositoryBuilder<T, ID>
where
    T: Send + Sync + 'static,
    ID: Display + Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            key_extractor: None,
            store: None,
            cache: None,
        }
    }

    pub fn key_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&T) -> ID + Send + Sync + 'static,
    {
        self.key_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn shared_key_extractor(mut self, extractor: KeyExtractor<T, ID>) -> Self {
        self.key_extractor = Some(extractor);
        self
    }

    pub fn store(mut self, store: Arc<dyn PersistentStore<T, ID>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(mut self, cache: EntryCache<T>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<CacheAsideRepository<T, ID>> {
        self.config.validate()?;

        let extractor = self.key_extractor.ok_or_else(|| {
            Error::Config(format!(
                "repository '{}' has no primary key extractor",
                self.config.namespace
            ))
        })?;
        let store = self.store.ok_or_else(|| {
            Error::Config(format!(
                "repository '{}' has no persistent store",
                self.config.namespace
            ))
        })?;
        let cache = self.cache.ok_or_else(|| {
            Error::Config(format!(
                "repository '{}' has no cache store",
                self.config.namespace
            ))
        })?;

        Ok(CacheAsideRepository {
            config: self.config,
            keys: KeyBuilder::new(extractor),
            store,
            cache,
        })
    }
}
