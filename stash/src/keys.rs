use std::fmt::Display;
use std::sync::Arc;

/// Reserved key holding the full-collection snapshot.
pub const ALL_KEY: &str = "all";

const ID_PREFIX: &str = "id:";

/// Caller-supplied primary key accessor.
pub type KeyExtractor<T, ID> = Arc<dyn Fn(&T) -> ID + Send + Sync>;

/// Maps identifiers, and entities through their identifier, to cache keys.
///
/// Per-id keys carry an `id:` prefix so no identifier can collide with
/// [`ALL_KEY`].
pub struct KeyBuilder<T, ID> {
    extractor: KeyExtractor<T, ID>,
}

impl<T, ID> KeyBuilder<T, ID>
where
    ID: Display,
{
    pub fn new(extractor: KeyExtractor<T, ID>) -> Self {
        Self { extractor }
    }

    pub fn key_for(&self, id: &ID) -> String {
        format!("{ID_PREFIX}{id}")
    }

    pub fn key_for_entity(&self, entity: &T) -> String {
        self.key_for(&self.id_of(entity))
    }

    pub fn id_of(&self, entity: &T) -> ID {
        (self.extractor)(entity)
    }

    pub fn all_key(&self) -> &'static str {
        ALL_KEY
    }
}

impl<T, ID> Clone for KeyBuilder<T, ID> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        id: u64,
        name: &'static str,
    }

    fn builder() -> KeyBuilder<Account, u64> {
        KeyBuilder::new(Arc::new(|a: &Account| a.id))
    }

    #[test]
    fn test_equal_ids_give_equal_keys() {
        let keys = builder();
        assert_eq!(keys.key_for(&42), keys.key_for(&42));
        assert_ne!(keys.key_for(&42), keys.key_for(&43));
        assert_eq!(keys.key_for(&42), "id:42");
    }

    #[test]
    fn test_entity_key_goes_through_the_extractor() {
        let keys = builder();
        let account = Account { id: 9, name: "ops" };
        assert_eq!(keys.key_for_entity(&account), keys.key_for(&9));
        assert_eq!(keys.id_of(&account), 9);
        assert_eq!(account.name, "ops");
    }

    #[test]
    fn test_string_id_named_all_does_not_shadow_the_collection() {
        let keys: KeyBuilder<String, String> = KeyBuilder::new(Arc::new(|s: &String| s.clone()));
        assert_ne!(keys.key_for(&"all".to_string()), keys.all_key());
        assert_eq!(keys.all_key(), "all");
    }
}
