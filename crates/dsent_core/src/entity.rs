//! Record-type contract.

use crate::error::EntityResult;
use dsent_store::{Key, PropertyLoadSaver};

/// A record type managed by an [`EntitySession`](crate::EntitySession).
///
/// Implementors must provide:
/// - `build_key()`: derives the key from the record's logical identity
/// - `load()` / `save()` (via [`PropertyLoadSaver`]): marshaling
///
/// and may opt into:
/// - `key_loader()`: a hook that receives store-assigned keys
///
/// # Example
///
/// ```rust
/// use dsent_core::{Entity, EntityResult, KeyLoader};
/// use dsent_store::{Key, PropertyLoadSaver, Properties, StoreResult};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Task {
///     #[serde(skip)]
///     id: i64,
///     title: String,
/// }
///
/// impl PropertyLoadSaver for Task {
///     fn load(&mut self, properties: Properties) -> StoreResult<()> {
///         let id = self.id;
///         *self = properties.to_struct()?;
///         self.id = id;
///         Ok(())
///     }
///
///     fn save(&self) -> StoreResult<Properties> {
///         Properties::from_struct(self)
///     }
/// }
///
/// impl KeyLoader for Task {
///     fn load_key(&mut self, key: &Key) -> EntityResult<()> {
///         self.id = key.id();
///         Ok(())
///     }
/// }
///
/// impl Entity for Task {
///     fn build_key(&self, namespace: &str) -> EntityResult<Key> {
///         Ok(Key::id_key("Task", self.id, None).with_namespace(namespace))
///     }
///
///     fn key_loader(&mut self) -> Option<&mut dyn KeyLoader> {
///         Some(self)
///     }
/// }
/// ```
pub trait Entity: PropertyLoadSaver {
    /// Derives the record's key within `namespace`.
    ///
    /// The result must depend only on the record's logical identity, so
    /// that two records with the same identity produce equivalent keys.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::KeyDerivation`](crate::EntityError::KeyDerivation)
    /// if the identity is incomplete or invalid.
    fn build_key(&self, namespace: &str) -> EntityResult<Key>;

    /// Returns the key-resolution hook, if the record type has one.
    ///
    /// Record types whose identifiers are assigned by the store return
    /// `Some(self)` so the session can write the assigned key back.
    fn key_loader(&mut self) -> Option<&mut dyn KeyLoader> {
        None
    }
}

/// Receives the key the store assigned to a record.
pub trait KeyLoader {
    /// Stores the identifying parts of `key` in the record.
    fn load_key(&mut self, key: &Key) -> EntityResult<()>;
}
