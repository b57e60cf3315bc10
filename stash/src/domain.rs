use shared::config::Settings;
use shared::{Error, Result, Ttl};

pub mod response {

    #[derive(Clone, Debug)]
    pub struct DeleteResponse {
        pub deleted: bool,
    }

    impl DeleteResponse {
        pub fn new(deleted: bool) -> Self {
            Self { deleted }
        }
    }
}

#[derive(Clone, Debug)]
pub struct CacheInfo {
    pub config: CacheConfig,
    pub entries_estimate: u64,
}

impl CacheInfo {
    pub fn new(config: CacheConfig, entries_estimate: u64) -> Self {
        Self {
            config,
            entries_estimate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub namespace: String,         // logical cache table, one per entity type
    pub ttl: Ttl,                  // Never = retained until deleted or flushed
    pub negative_caching: bool,    // remember ids the store reported missing
    pub max_entries: Option<u64>,  // None = unbounded
}

impl CacheConfig {
    pub fn new(namespace: impl Into<String>, ttl: Ttl, negative_caching: bool) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
            negative_caching,
            max_entries: None,
        }
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            namespace: settings.namespace.clone(),
            ttl: settings.ttl,
            negative_caching: settings.negative_caching,
            max_entries: settings.max_entries,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("cache namespace must not be empty".into()));
        }
        if self.max_entries == Some(0) {
            return Err(Error::Config(format!(
                "cache '{}' has max_entries = 0",
                self.namespace
            )));
        }
        Ok(())
    }
}
