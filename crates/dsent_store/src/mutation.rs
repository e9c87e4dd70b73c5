//! Write operations.

use crate::key::Key;
use crate::properties::Properties;

/// The kind of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    /// Write a new entity; fails if the key already holds one.
    Insert,
    /// Overwrite an existing entity; fails if the key holds none.
    Update,
    /// Write an entity whether or not one exists.
    Upsert,
    /// Remove an entity; succeeds if the key holds none.
    Delete,
}

/// A single write against one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// What to do.
    pub op: MutationOp,
    /// Target key. Only inserts and upserts may use an incomplete key.
    pub key: Key,
    /// Properties to write; `None` for deletes.
    pub properties: Option<Properties>,
}

impl Mutation {
    /// Creates an insert mutation.
    pub fn insert(key: Key, properties: Properties) -> Self {
        Self {
            op: MutationOp::Insert,
            key,
            properties: Some(properties),
        }
    }

    /// Creates an update mutation.
    pub fn update(key: Key, properties: Properties) -> Self {
        Self {
            op: MutationOp::Update,
            key,
            properties: Some(properties),
        }
    }

    /// Creates an upsert mutation.
    pub fn upsert(key: Key, properties: Properties) -> Self {
        Self {
            op: MutationOp::Upsert,
            key,
            properties: Some(properties),
        }
    }

    /// Creates a delete mutation.
    pub fn delete(key: Key) -> Self {
        Self {
            op: MutationOp::Delete,
            key,
            properties: None,
        }
    }

    /// Returns true if the store may allocate the leaf identifier.
    #[must_use]
    pub fn allows_incomplete_key(&self) -> bool {
        matches!(self.op, MutationOp::Insert | MutationOp::Upsert)
    }
}
