//! Key derivation and key equivalence.

use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use dsent_store::Key;

/// Sets `namespace` on `key` and on every one of its ancestors.
pub fn set_namespace(mut key: Key, namespace: &str) -> Key {
    let mut level = Some(&mut key);
    while let Some(current) = level {
        current.namespace = namespace.to_string();
        level = current.parent.as_deref_mut();
    }
    key
}

/// Derives an entity's key within `namespace`.
///
/// The entity's own rule produces the key; the namespace is then stamped
/// uniformly across the whole ancestor chain and the key is checked for
/// structural validity.
///
/// # Errors
///
/// Returns [`EntityError::KeyDerivation`] if the entity cannot build a key
/// or the key it builds is malformed.
pub fn derive_key<T: Entity + ?Sized>(entity: &T, namespace: &str) -> EntityResult<Key> {
    let key = set_namespace(entity.build_key(namespace)?, namespace);
    key.validate()
        .map_err(|e| EntityError::key_derivation(e.to_string()))?;
    Ok(key)
}

/// Derives the keys of several entities, failing on the first error.
pub fn derive_keys<T: Entity>(entities: &[T], namespace: &str) -> EntityResult<Vec<Key>> {
    entities.iter().map(|e| derive_key(e, namespace)).collect()
}

/// Returns true if `a` and `b` denote the same entity.
///
/// Walks both chains from the leaf toward the root, comparing namespace,
/// kind and identifier at every level. Both chains must end at the same
/// depth.
pub fn keys_equivalent(a: &Key, b: &Key) -> bool {
    let (mut left, mut right) = (a, b);
    loop {
        if left.namespace != right.namespace
            || left.kind != right.kind
            || left.identifier != right.identifier
        {
            return false;
        }
        match (left.parent(), right.parent()) {
            (None, None) => return true,
            (Some(l), Some(r)) => (left, right) = (l, r),
            _ => return false,
        }
    }
}
