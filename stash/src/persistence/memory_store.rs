use crate::keys::KeyExtractor;
use crate::ports::PersistentStore;
use dashmap::DashMap;
use shared::StoreResult;
use std::hash::Hash;

/// DashMap-backed persistent store for tests and demos
pub struct MemoryStore<T, ID>
where
    ID: Eq + Hash,
{
    rows: DashMap<ID, T>,
    key_fn: KeyExtractor<T, ID>,
}

impl<T, ID> MemoryStore<T, ID>
where
    ID: Eq + Hash,
{
    pub fn new(key_fn: KeyExtractor<T, ID>) -> Self {
        Self {
            rows: DashMap::new(),
            key_fn,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T, ID> PersistentStore<T, ID> for MemoryStore<T, ID>
where
    T: Clone + Send + Sync,
    ID: Eq + Hash + Send + Sync,
{
    fn find_by_id(&self, id: &ID) -> StoreResult<Option<T>> {
        Ok(self.rows.get(id).map(|row| row.value().clone()))
    }

    fn find_all(&self) -> StoreResult<Vec<T>> {
        Ok(self.rows.iter().map(|row| row.value().clone()).collect())
    }

    fn find_by_ids(&self, ids: &[ID]) -> StoreResult<Vec<T>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| row.value().clone()))
            .collect())
    }

    fn upsert(&self, entity: &T) -> StoreResult<()> {
        self.rows.insert((self.key_fn)(entity), entity.clone());
        Ok(())
    }

    fn delete_by_id(&self, id: &ID) -> StoreResult<()> {
        self.rows.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        sku: String,
        qty: u32,
    }

    fn store() -> MemoryStore<Item, String> {
        MemoryStore::new(Arc::new(|i: &Item| i.sku.clone()))
    }

    #[test]
    fn test_upsert_replaces_by_key() {
        let store = store();
        store.upsert(&Item { sku: "a".into(), qty: 1 }).unwrap();
        store.upsert(&Item { sku: "a".into(), qty: 5 }).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(&"a".to_string()).unwrap().unwrap().qty, 5);
    }

    #[test]
    fn test_find_by_ids_skips_unknown() {
        let store = store();
        store.upsert(&Item { sku: "a".into(), qty: 1 }).unwrap();
        store.upsert(&Item { sku: "b".into(), qty: 2 }).unwrap();

        let found = store
            .find_by_ids(&["b".to_string(), "zzz".to_string()])
            .unwrap();
        assert_eq!(found, vec![Item { sku: "b".into(), qty: 2 }]);
        assert_eq!(store.find_all().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_of_unknown_id_is_a_no_op() {
        let store = store();
        store.delete_by_id(&"ghost".to_string()).unwrap();
        assert!(store.is_empty());
        assert!(store.find_by_id(&"ghost".to_string()).unwrap().is_none());
    }
}
