use std::fmt;
use std::sync::Arc;

/// What a repository keeps in a single cache slot.
///
/// Exactly one tag is live per key; writing one variant replaces whatever was
/// stored before.
pub enum CacheEntry<T> {
    Present(Arc<T>),
    /// The store reported the id as missing.
    Absent,
    /// Full-collection snapshot, only ever stored under the reserved key.
    Collection(Arc<Vec<Arc<T>>>),
}

/// Result of decoding a per-id slot.
#[derive(Debug)]
pub enum Lookup<T> {
    Hit(Arc<T>),
    KnownAbsent,
    Miss,
}

impl<T> CacheEntry<T> {
    pub fn present(entity: T) -> Self {
        CacheEntry::Present(Arc::new(entity))
    }

    pub fn collection(entities: Vec<Arc<T>>) -> Self {
        CacheEntry::Collection(Arc::new(entities))
    }

    /// A collection found under a per-id key decodes as a miss.
    pub fn decode(self) -> Lookup<T> {
        match self {
            CacheEntry::Present(entity) => Lookup::Hit(entity),
            CacheEntry::Absent => Lookup::KnownAbsent,
            CacheEntry::Collection(_) => Lookup::Miss,
        }
    }

    pub fn into_collection(self) -> Option<Arc<Vec<Arc<T>>>> {
        match self {
            CacheEntry::Collection(entities) => Some(entities),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            CacheEntry::Present(_) => "present",
            CacheEntry::Absent => "absent",
            CacheEntry::Collection(_) => "collection",
        }
    }
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        match self {
            CacheEntry::Present(entity) => CacheEntry::Present(Arc::clone(entity)),
            CacheEntry::Absent => CacheEntry::Absent,
            CacheEntry::Collection(entities) => CacheEntry::Collection(Arc::clone(entities)),
        }
    }
}

impl<T> fmt::Debug for CacheEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEntry::Collection(entities) => f
                .debug_struct("Collection")
                .field("len", &entities.len())
                .finish(),
            other => f.write_str(other.tag()),
        }
    }
}
