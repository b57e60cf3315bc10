use serde::{Deserialize, Serialize};
use shared::config::Settings;
use shared::{Error, Result};
use stash::persistence::SledStore;
use stash::{CacheAsideRepository, CacheConfig, CacheRegistry, KeyExtractor};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use storage_engine::MokaStorageFactory;

pub const USERS_TREE: &str = "users";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub age: u32,
    pub active: bool,
}

impl User {
    pub fn new(id: u64, username: &str, email: &str, age: u32) -> Self {
        Self {
            id,
            username: username.to_string(),
            email: email.to_string(),
            age,
            active: true,
        }
    }
}

fn user_id() -> KeyExtractor<User, u64> {
    Arc::new(|user: &User| user.id)
}

/// User repository: sled underneath, moka in front
pub struct UserCacheRepository {
    inner: CacheAsideRepository<User, u64>,
}

impl UserCacheRepository {
    pub fn open(settings: &Settings, registry: &CacheRegistry) -> Result<Self> {
        let db_path = Path::new(&settings.data_dir).join("users.sled");
        let store = SledStore::open(db_path, USERS_TREE, user_id())?;

        let config = CacheConfig::from_settings(settings);
        let cache = registry.table::<User, _>(&config, &MokaStorageFactory)?;

        let inner = CacheAsideRepository::builder(config)
            .shared_key_extractor(user_id())
            .store(Arc::new(store))
            .cache(cache)
            .build()?;

        Ok(Self { inner })
    }
}

impl Deref for UserCacheRepository {
    type Target = CacheAsideRepository<User, u64>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// `NotFound` becomes `None`, every other error is kept
pub fn ensure_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Ttl;
    use stash::CacheRepository;

    fn settings(dir: &Path) -> Settings {
        Settings {
            namespace: "users_cache".into(),
            ttl: Ttl::from_millis(600_000),
            negative_caching: true,
            max_entries: Some(1_000),
            data_dir: dir.to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn test_user_repository_round_trips_through_sled() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = CacheRegistry::new();
        let repo = UserCacheRepository::open(&settings(temp_dir.path()), &registry).unwrap();

        repo.save(User::new(1, "john_doe", "john@example.com", 30))
            .unwrap();
        assert_eq!(repo.get_by_id(&1).unwrap().email, "john@example.com");
        assert_eq!(ensure_found(repo.get_by_id(&99999)).unwrap(), None);
        assert_eq!(registry.namespaces(), vec!["users_cache"]);
    }

    #[test]
    fn test_reopened_repository_sees_persisted_users() {
        let temp_dir = tempfile::tempdir().unwrap();

        {
            let repo =
                UserCacheRepository::open(&settings(temp_dir.path()), &CacheRegistry::new())
                    .unwrap();
            repo.save(User::new(5, "jane", "jane@example.com", 41))
                .unwrap();
        }

        let repo =
            UserCacheRepository::open(&settings(temp_dir.path()), &CacheRegistry::new()).unwrap();
        assert_eq!(repo.get_by_id(&5).unwrap().username, "jane");
        assert_eq!(repo.get_all().unwrap().len(), 1);
    }
}
