use crate::Ttl;
use std::str::FromStr;
use tracing::warn;

/// Process-level settings for a cached repository, read from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub namespace: String,
    pub ttl: Ttl,
    pub negative_caching: bool,
    pub max_entries: Option<u64>,
    pub data_dir: String,
}

impl Settings {
    const DEFAULT_NAMESPACE: &str = "users_cache";
    const DEFAULT_TTL_MS: u64 = 10 * 60 * 1000;
    const DEFAULT_DATA_DIR: &str = "./data";

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_ms = parse_or(&lookup, "STASH_TTL_MS", Self::DEFAULT_TTL_MS);
        let negative_caching = parse_or(&lookup, "STASH_NEGATIVE_CACHING", true);
        let max_entries = lookup("STASH_MAX_ENTRIES").and_then(|raw| match raw.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("STASH_MAX_ENTRIES='{}' is not a number, cache will be unbounded", raw);
                None
            }
        });

        Self {
            namespace: lookup("STASH_NAMESPACE")
                .filter(|ns| !ns.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_NAMESPACE.to_string()),
            ttl: Ttl::from_millis(ttl_ms),
            negative_caching,
            max_entries,
            data_dir: lookup("STASH_DATA_DIR")
                .unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}='{}' could not be parsed, using {:?}", name, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = Settings::default();
        assert_eq!(settings.namespace, "users_cache");
        assert_eq!(settings.ttl, Ttl::After(Duration::from_secs(600)));
        assert!(settings.negative_caching);
        assert_eq!(settings.max_entries, None);
        assert_eq!(settings.data_dir, "./data");
    }

    #[test]
    fn test_reads_every_variable() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("STASH_NAMESPACE", "orders"),
            ("STASH_TTL_MS", "0"),
            ("STASH_NEGATIVE_CACHING", "false"),
            ("STASH_MAX_ENTRIES", "5000"),
            ("STASH_DATA_DIR", "/tmp/stash"),
        ]));
        assert_eq!(settings.namespace, "orders");
        assert_eq!(settings.ttl, Ttl::Never);
        assert!(!settings.negative_caching);
        assert_eq!(settings.max_entries, Some(5000));
        assert_eq!(settings.data_dir, "/tmp/stash");
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("STASH_NAMESPACE", "  "),
            ("STASH_TTL_MS", "ten minutes"),
            ("STASH_NEGATIVE_CACHING", "maybe"),
            ("STASH_MAX_ENTRIES", "lots"),
        ]));
        assert_eq!(settings.namespace, "users_cache");
        assert_eq!(settings.ttl, Ttl::from_millis(600_000));
        assert!(settings.negative_caching);
        assert_eq!(settings.max_entries, None);
    }
}
