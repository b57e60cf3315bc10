use moka::Expiry;
use moka::sync::Cache;
use shared::{Result, Ttl};
use stash::domain::response::DeleteResponse;
use stash::ports::CacheStore;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Value wrapper carrying the TTL it was inserted with
#[derive(Clone, Debug)]
struct Stamped<V> {
    value: V,
    ttl: Ttl,
}

/// Expires each entry a fixed time after its last write, reads do not extend it
struct PerEntryTtl;

impl<K, V> Expiry<K, Stamped<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        value: &Stamped<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl.as_duration()
    }

    fn expire_after_update(
        &self,
        _key: &K,
        value: &Stamped<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite restarts the clock with the new entry's TTL
        value.ttl.as_duration()
    }
}

/// Moka-based cache implementation with per-entry TTL
/// Provides a lock-free, concurrent cache with optional size bound
pub struct MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    cache: Cache<K, Stamped<V>>,
}

impl<K, V> MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    /// Create a new unbounded Moka cache
    pub fn new_unbounded() -> Self {
        Self {
            cache: Cache::builder().expire_after(PerEntryTtl).build(),
        }
    }

    /// Create a new bounded Moka cache with max entries
    pub fn new_bounded(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Create a Moka cache from name and optional capacity
    /// Used for compatibility with factory pattern
    pub fn new(name: &str, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(name).expire_after(PerEntryTtl);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }
}

impl<K, V> CacheStore<K, V> for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn get(&self, key: &K) -> Result<Option<V>> {
        // Moka hides expired entries even before they are purged
        Ok(self.cache.get(key).map(|stamped| stamped.value))
    }

    fn put(&self, key: K, val: V, ttl: Ttl) -> Result<()> {
        self.cache.insert(key, Stamped { value: val, ttl });
        Ok(())
    }

    fn delete(&self, key: &K) -> Result<DeleteResponse> {
        let existed = self.cache.remove(key).is_some();
        Ok(DeleteResponse::new(existed))
    }

    fn flush(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<K, V> Debug for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("name", &self.cache.name())
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_moka_cache_put_and_get() {
        let cache = MokaCache::new("test", None);

        cache.put("hello", "world", Ttl::Never).unwrap();

        assert_eq!(cache.get(&"hello").unwrap(), Some("world"));
    }

    #[test]
    fn test_moka_cache_delete() {
        let cache = MokaCache::new("test", None);

        cache.put("test_key", "test_value", Ttl::Never).unwrap();

        let delete_response = cache.delete(&"test_key").unwrap();
        assert!(delete_response.deleted);
        assert_eq!(cache.get(&"test_key").unwrap(), None);

        // Deleting again is a no-op
        assert!(!cache.delete(&"test_key").unwrap().deleted);
    }

    #[test]
    fn test_moka_cache_get_nonexistent() {
        let cache: MokaCache<&str, &str> = MokaCache::new("test", None);

        assert_eq!(cache.get(&"nonexistent").unwrap(), None);
    }

    #[test]
    fn test_moka_cache_overwrite() {
        let cache = MokaCache::new("test", None);

        cache.put("key", "value1", Ttl::Never).unwrap();
        cache.put("key", "value2", Ttl::Never).unwrap();

        assert_eq!(cache.get(&"key").unwrap(), Some("value2"));
    }

    #[test]
    fn test_moka_cache_per_entry_ttl() {
        let cache = MokaCache::new("test", None);

        cache.put("short", "gone", Ttl::from_millis(100)).unwrap();
        cache.put("forever", "kept", Ttl::Never).unwrap();

        assert_eq!(cache.get(&"short").unwrap(), Some("gone"));

        sleep(Duration::from_millis(150));

        assert_eq!(cache.get(&"short").unwrap(), None);
        assert_eq!(cache.get(&"forever").unwrap(), Some("kept"));
    }

    #[test]
    fn test_moka_cache_ttl_is_not_sliding() {
        let cache = MokaCache::new("test", None);

        cache.put("key", "value", Ttl::from_millis(200)).unwrap();

        // Keep reading well inside the window
        for _ in 0..5 {
            sleep(Duration::from_millis(30));
            assert_eq!(cache.get(&"key").unwrap(), Some("value"));
        }

        sleep(Duration::from_millis(120));
        assert_eq!(cache.get(&"key").unwrap(), None);
    }

    #[test]
    fn test_moka_cache_overwrite_takes_new_ttl() {
        let cache = MokaCache::new("test", None);

        cache.put("key", "short", Ttl::from_millis(50)).unwrap();
        cache.put("key", "long", Ttl::Never).unwrap();

        sleep(Duration::from_millis(100));
        assert_eq!(cache.get(&"key").unwrap(), Some("long"));
    }

    #[test]
    fn test_moka_cache_flush() {
        let cache = MokaCache::new("test", None);

        cache.put("a", 1, Ttl::Never).unwrap();
        cache.put("b", 2, Ttl::from_millis(10_000)).unwrap();
        cache.flush().unwrap();

        assert_eq!(cache.get(&"a").unwrap(), None);
        assert_eq!(cache.get(&"b").unwrap(), None);

        // Flushing an empty cache is fine
        cache.flush().unwrap();
    }

    #[test]
    fn test_moka_cache_bounded() {
        let cache = MokaCache::new_bounded(2); // Max 2 entries

        cache.put("key1", "value1", Ttl::Never).unwrap();
        cache.put("key2", "value2", Ttl::Never).unwrap();
        cache.put("key3", "value3", Ttl::Never).unwrap();

        // entry_count runs pending maintenance before reporting
        assert!(cache.entry_count() <= 2, "Cache should have at most 2 entries");
    }

    #[test]
    fn test_moka_cache_unbounded_counts_entries() {
        let cache = MokaCache::new_unbounded();

        for i in 0..10u32 {
            cache.put(i, i * 2, Ttl::Never).unwrap();
        }

        assert_eq!(cache.entry_count(), 10);
    }
}
