//! Process-wide kind registry.
//!
//! Guards against two record types claiming the same kind name.

use crate::error::{EntityError, EntityResult};
use parking_lot::{const_mutex, Mutex};
use std::collections::BTreeSet;

static REGISTERED_KINDS: Mutex<BTreeSet<String>> = const_mutex(BTreeSet::new());

/// Registers a kind name.
///
/// # Errors
///
/// Returns [`EntityError::KindAlreadyRegistered`] if the name is taken.
pub fn register_kind(name: &str) -> EntityResult<()> {
    let mut kinds = REGISTERED_KINDS.lock();
    if !kinds.insert(name.to_string()) {
        return Err(EntityError::KindAlreadyRegistered {
            kind: name.to_string(),
        });
    }
    Ok(())
}

/// Releases a kind name. Returns false if it was not registered.
pub fn unregister_kind(name: &str) -> bool {
    REGISTERED_KINDS.lock().remove(name)
}

/// Returns true if the kind name is registered.
pub fn is_registered(name: &str) -> bool {
    REGISTERED_KINDS.lock().contains(name)
}
