//! Keys-only queries.

use crate::key::Key;

/// A filter over stored keys.
///
/// Only what existence checks and kind scans need is supported: kind,
/// namespace, exact key, ancestor and a result limit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Kind to match; empty matches every kind.
    pub kind: String,
    /// Namespace to match.
    pub namespace: String,
    /// Exact key to match.
    pub key: Option<Key>,
    /// Ancestor every result must descend from.
    pub ancestor: Option<Key>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a query over one kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Restricts the query to a namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Restricts the query to a single key.
    #[must_use]
    pub fn filter_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Restricts the query to descendants of `ancestor`.
    #[must_use]
    pub fn ancestor(mut self, ancestor: Key) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `key` satisfies every filter of the query.
    #[must_use]
    pub fn matches(&self, key: &Key) -> bool {
        (self.kind.is_empty() || key.kind == self.kind)
            && key.namespace == self.namespace
            && self.key.as_ref().map_or(true, |k| k == key)
            && self.ancestor.as_ref().map_or(true, |a| key.has_ancestor(a))
    }
}
