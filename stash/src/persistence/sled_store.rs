use crate::keys::KeyExtractor;
use crate::ports::PersistentStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{StoreError, StoreResult};
use std::fmt::Display;
use std::path::Path;

/// Sled-based persistent store, one tree per entity type
///
/// Rows are keyed by the display form of their ID and stored as JSON.
pub struct SledStore<T, ID> {
    tree: sled::Tree,
    key_fn: KeyExtractor<T, ID>,
}

impl<T, ID> SledStore<T, ID> {
    /// Open (or create) a database at `path` and use the named tree
    /// Creates the parent directory if it doesn't exist
    pub fn open(
        path: impl AsRef<Path>,
        tree_name: &str,
        key_fn: KeyExtractor<T, ID>,
    ) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| StoreError::Unavailable(format!("Failed to open Sled database: {}", e)))?;

        Self::with_db(&db, tree_name, key_fn)
    }

    /// Use a tree of an already opened database
    pub fn with_db(db: &sled::Db, tree_name: &str, key_fn: KeyExtractor<T, ID>) -> StoreResult<Self> {
        let tree = db
            .open_tree(tree_name)
            .map_err(|e| StoreError::Storage(format!("Failed to open tree '{}': {}", tree_name, e)))?;

        Ok(Self { tree, key_fn })
    }

    fn flush(&self) -> StoreResult<()> {
        self.tree
            .flush()
            .map_err(|e| StoreError::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Serialization(format!("Failed to deserialize row: {}", e)))
}

impl<T, ID> PersistentStore<T, ID> for SledStore<T, ID>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    ID: Display + Send + Sync,
{
    fn find_by_id(&self, id: &ID) -> StoreResult<Option<T>> {
        let value = self
            .tree
            .get(id.to_string().as_bytes())
            .map_err(|e| StoreError::Storage(format!("Failed to get row: {}", e)))?;

        match value {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_all(&self) -> StoreResult<Vec<T>> {
        let mut rows = Vec::new();

        for result in self.tree.iter() {
            let (_, value) = result
                .map_err(|e| StoreError::Storage(format!("Failed to iterate database: {}", e)))?;
            rows.push(decode(&value)?);
        }

        Ok(rows)
    }

    fn find_by_ids(&self, ids: &[ID]) -> StoreResult<Vec<T>> {
        let mut rows = Vec::with_capacity(ids.len());

        for id in ids {
            if let Some(row) = self.find_by_id(id)? {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    fn upsert(&self, entity: &T) -> StoreResult<()> {
        let key = (self.key_fn)(entity).to_string();
        let value = serde_json::to_vec(entity)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize row: {}", e)))?;

        self.tree
            .insert(key.as_bytes(), value)
            .map_err(|e| StoreError::Storage(format!("Failed to save row: {}", e)))?;

        self.flush()
    }

    fn delete_by_id(&self, id: &ID) -> StoreResult<()> {
        self.tree
            .remove(id.to_string().as_bytes())
            .map_err(|e| StoreError::Storage(format!("Failed to delete row: {}", e)))?;

        self.flush()
    }
}
