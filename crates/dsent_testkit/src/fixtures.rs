//! Record types and session helpers.
//!
//! The records cover the shapes a session has to handle:
//!
//! - [`ExampleRecord`] - numeric identity assigned by the store, with a
//!   key-resolution hook and a property renamed on save
//! - [`NamedChild`] - named identity under a named parent
//! - [`FailingResolver`] - a key-resolution hook that always fails

use dsent_core::{Entity, EntityError, EntityResult, EntitySession, KeyLoader};
use dsent_store::{Key, MemoryStore, Properties, PropertyLoadSaver, StoreConfig, StoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Namespace used by the session helpers.
pub const TEST_NAMESPACE: &str = "testkit";

/// Kind of [`ExampleRecord`].
pub const EXAMPLE_KIND: &str = "Example";

/// Kind of [`NamedChild`].
pub const CHILD_KIND: &str = "Child";

/// Kind of the parent of a [`NamedChild`].
pub const PARENT_KIND: &str = "Parent";

/// Kind of [`FailingResolver`].
pub const FAILING_KIND: &str = "Failing";

/// A record whose id is assigned by the store when left at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleRecord {
    /// Numeric identity; zero means "let the store pick".
    pub id: i64,
    /// Stored as-is.
    pub data: String,
    /// Stored under the property name `real_data`.
    pub delegated_data: String,
    /// Last key handed to the key-resolution hook.
    pub loaded_key: Option<Key>,
}

#[derive(Serialize, Deserialize)]
struct StoredExample {
    data: String,
    #[serde(default)]
    real_data: String,
}

impl ExampleRecord {
    /// Creates a record.
    pub fn new(id: i64, data: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
            ..Self::default()
        }
    }

    /// Creates a record carrying only its identity, ready to be loaded.
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl PropertyLoadSaver for ExampleRecord {
    fn load(&mut self, properties: Properties) -> StoreResult<()> {
        let stored: StoredExample = properties.to_struct()?;
        self.data = stored.data;
        self.delegated_data = stored.real_data;
        Ok(())
    }

    fn save(&self) -> StoreResult<Properties> {
        Properties::from_struct(&StoredExample {
            data: self.data.clone(),
            real_data: self.delegated_data.clone(),
        })
    }
}

impl KeyLoader for ExampleRecord {
    fn load_key(&mut self, key: &Key) -> EntityResult<()> {
        self.id = key.id();
        self.loaded_key = Some(key.clone());
        Ok(())
    }
}

impl Entity for ExampleRecord {
    fn build_key(&self, _namespace: &str) -> EntityResult<Key> {
        if self.id < 0 {
            return Err(EntityError::key_derivation("negative id"));
        }
        Ok(Key::id_key(EXAMPLE_KIND, self.id, None))
    }

    fn key_loader(&mut self) -> Option<&mut dyn KeyLoader> {
        Some(self)
    }
}

/// A named record stored under a named parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedChild {
    /// Parent name.
    #[serde(skip)]
    pub parent: String,
    /// Own name.
    #[serde(skip)]
    pub name: String,
    /// Payload.
    pub value: i64,
}

impl NamedChild {
    /// Creates a child record.
    pub fn new(parent: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
            value,
        }
    }
}

impl PropertyLoadSaver for NamedChild {
    fn load(&mut self, properties: Properties) -> StoreResult<()> {
        let loaded: NamedChild = properties.to_struct()?;
        self.value = loaded.value;
        Ok(())
    }

    fn save(&self) -> StoreResult<Properties> {
        Properties::from_struct(self)
    }
}

impl Entity for NamedChild {
    fn build_key(&self, _namespace: &str) -> EntityResult<Key> {
        if self.name.is_empty() {
            return Err(EntityError::key_derivation("child name is required"));
        }
        let parent = Key::name_key(PARENT_KIND, &self.parent, None);
        Ok(Key::name_key(CHILD_KIND, &self.name, Some(parent)))
    }
}

/// A record whose key-resolution hook always fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailingResolver {
    /// Numeric identity.
    #[serde(skip)]
    pub id: i64,
    /// Payload.
    pub value: i64,
}

impl FailingResolver {
    /// Creates a record.
    pub fn new(id: i64, value: i64) -> Self {
        Self { id, value }
    }
}

impl PropertyLoadSaver for FailingResolver {
    fn load(&mut self, properties: Properties) -> StoreResult<()> {
        let loaded: FailingResolver = properties.to_struct()?;
        self.value = loaded.value;
        Ok(())
    }

    fn save(&self) -> StoreResult<Properties> {
        Properties::from_struct(self)
    }
}

impl KeyLoader for FailingResolver {
    fn load_key(&mut self, key: &Key) -> EntityResult<()> {
        Err(EntityError::callback(format!("cannot resolve {key}")))
    }
}

impl Entity for FailingResolver {
    fn build_key(&self, _namespace: &str) -> EntityResult<Key> {
        Ok(Key::id_key(FAILING_KIND, self.id, None))
    }

    fn key_loader(&mut self) -> Option<&mut dyn KeyLoader> {
        Some(self)
    }
}

/// Creates a session over a fresh in-memory store.
pub fn memory_session<T: Entity>(kind: &str) -> EntitySession<T, MemoryStore> {
    session_over(&MemoryStore::new(), kind)
}

/// Creates a session sharing `store`'s data.
pub fn session_over<T: Entity>(store: &MemoryStore, kind: &str) -> EntitySession<T, MemoryStore> {
    EntitySession::new(Arc::new(store.clone()), TEST_NAMESPACE, kind)
}

/// Creates a store whose allocated ids start at `first_id`.
pub fn store_allocating_from(first_id: i64) -> MemoryStore {
    MemoryStore::with_config(StoreConfig::new().first_allocated_id(first_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_record_renames_delegated_property() {
        let mut record = ExampleRecord::new(1, "payload");
        record.delegated_data = "hidden".to_string();
        let properties = record.save().unwrap();
        assert!(properties.get("real_data").is_some());
        assert!(properties.get("delegated_data").is_none());

        let mut loaded = ExampleRecord::with_id(1);
        loaded.load(properties).unwrap();
        assert_eq!(loaded.data, "payload");
        assert_eq!(loaded.delegated_data, "hidden");
    }

    #[test]
    fn zero_id_builds_incomplete_key() {
        let key = ExampleRecord::with_id(0).build_key(TEST_NAMESPACE).unwrap();
        assert!(!key.is_complete());
    }

    #[test]
    fn child_key_has_parent() {
        let key = NamedChild::new("p", "c", 0).build_key(TEST_NAMESPACE).unwrap();
        assert_eq!(key.depth(), 2);
        assert_eq!(key.parent().map(Key::name), Some("p"));
    }
}
