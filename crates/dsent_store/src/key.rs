//! Hierarchical entity keys.

use crate::error::{StoreError, StoreResult};
use std::fmt;

/// Identifier of one key level.
///
/// A zero id and an empty name are not valid identifiers; the constructors
/// normalise both to [`Identifier::Incomplete`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Identifier {
    /// Not yet assigned; the store allocates an id on insert.
    #[default]
    Incomplete,
    /// Numeric surrogate identifier.
    Id(i64),
    /// Caller-chosen name.
    Name(String),
}

impl Identifier {
    /// Returns the numeric id, if any.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        match self {
            Identifier::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Identifier::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// A key addressing one entity.
///
/// Keys form a chain from the leaf to the root ancestor through `parent`.
/// Every level carries its own namespace tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    /// Kind of the entity at this level.
    pub kind: String,
    /// Identifier at this level.
    pub identifier: Identifier,
    /// Namespace tag of this level.
    pub namespace: String,
    /// Parent key, `None` at the root.
    pub parent: Option<Box<Key>>,
}

impl Key {
    /// Creates a key with a numeric identifier.
    pub fn id_key(kind: impl Into<String>, id: i64, parent: Option<Key>) -> Self {
        let identifier = if id == 0 {
            Identifier::Incomplete
        } else {
            Identifier::Id(id)
        };
        Self::with_identifier(kind, identifier, parent)
    }

    /// Creates a key with a name identifier.
    pub fn name_key(kind: impl Into<String>, name: impl Into<String>, parent: Option<Key>) -> Self {
        let name = name.into();
        let identifier = if name.is_empty() {
            Identifier::Incomplete
        } else {
            Identifier::Name(name)
        };
        Self::with_identifier(kind, identifier, parent)
    }

    /// Creates a key whose identifier is assigned by the store.
    pub fn incomplete_key(kind: impl Into<String>, parent: Option<Key>) -> Self {
        Self::with_identifier(kind, Identifier::Incomplete, parent)
    }

    fn with_identifier(
        kind: impl Into<String>,
        identifier: Identifier,
        parent: Option<Key>,
    ) -> Self {
        let namespace = parent
            .as_ref()
            .map(|p| p.namespace.clone())
            .unwrap_or_default();
        Self {
            kind: kind.into(),
            identifier,
            namespace,
            parent: parent.map(Box::new),
        }
    }

    /// Sets the namespace on this key only, leaving ancestors untouched.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns the numeric id, or 0 if the key has none.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.identifier.id().unwrap_or(0)
    }

    /// Returns the name, or "" if the key has none.
    #[must_use]
    pub fn name(&self) -> &str {
        self.identifier.name().unwrap_or("")
    }

    /// Returns the parent key.
    #[must_use]
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Returns true if the leaf identifier is assigned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.identifier != Identifier::Incomplete
    }

    /// Returns the number of levels in the chain, the leaf included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Iterates from this key up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &Key> {
        std::iter::successors(Some(self), |k| k.parent())
    }

    /// Returns true if `ancestor` is this key or one of its parents.
    #[must_use]
    pub fn has_ancestor(&self, ancestor: &Key) -> bool {
        self.ancestors().any(|k| k == ancestor)
    }

    /// Checks the structural rules every stored key must satisfy.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any level has an empty kind
    /// - Any ancestor is incomplete
    /// - A level's namespace differs from its parent's
    pub fn validate(&self) -> StoreResult<()> {
        for level in self.ancestors() {
            if level.kind.is_empty() {
                return Err(StoreError::invalid_key(format!("empty kind in {self}")));
            }
            if let Some(parent) = level.parent() {
                if !parent.is_complete() {
                    return Err(StoreError::invalid_key(format!(
                        "incomplete ancestor in {self}"
                    )));
                }
                if parent.namespace != level.namespace {
                    return Err(StoreError::invalid_key(format!(
                        "mixed namespaces in {self}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns a copy of this key with the leaf identifier replaced.
    #[must_use]
    pub fn with_id(&self, id: i64) -> Self {
        let mut key = self.clone();
        key.identifier = Identifier::Id(id);
        key
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}:", self.namespace)?;
        }
        let mut levels: Vec<&Key> = self.ancestors().collect();
        levels.reverse();
        for level in levels {
            match &level.identifier {
                Identifier::Incomplete => write!(f, "/{},incomplete", level.kind)?,
                Identifier::Id(id) => write!(f, "/{},{id}", level.kind)?,
                Identifier::Name(name) => write!(f, "/{},{name:?}", level.kind)?,
            }
        }
        Ok(())
    }
}
