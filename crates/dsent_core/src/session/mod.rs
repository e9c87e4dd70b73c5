//! Namespace- and kind-scoped entity sessions.
//!
//! An [`EntitySession`] binds a store client, a namespace and a record type.
//! Every operation derives keys through the key codec, issues store
//! primitives, and reconciles the result:
//!
//! - `create` / `put` / `get` / `delete` / `exists` and their batch forms
//! - `update` - the read-modify-write protocol with key-change detection
//!
//! Each operation has a `*_tx` form taking an open transaction, so callers
//! can compose several operations atomically with
//! [`run_in_transaction`](EntitySession::run_in_transaction).

mod crud;
mod update;

pub use update::UpdateOutcome;

use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use dsent_store::{
    Commit, Context, Key, PendingKey, Query, StoreClient, StoreResult, TransactionOptions,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Keys written by a non-transactional single-entity operation.
///
/// The write itself succeeded. `resolve_error` reports a failure of the
/// entity's key-resolution hook, which does not undo the write.
#[derive(Debug)]
pub struct ResolvedKey {
    /// Key the entity was stored under.
    pub key: Key,
    /// Error returned by the key-resolution hook, if any.
    pub resolve_error: Option<EntityError>,
}

impl ResolvedKey {
    /// Returns the key, or the resolution error if there was one.
    pub fn into_result(self) -> EntityResult<Key> {
        match self.resolve_error {
            Some(err) => Err(err),
            None => Ok(self.key),
        }
    }
}

/// Keys written by a non-transactional batch operation.
///
/// The batch committed. `resolve_error` holds the last failure of the
/// entities' key-resolution hooks; every other entity was resolved.
#[derive(Debug)]
pub struct ResolvedKeys {
    /// Keys in the same order as the input entities.
    pub keys: Vec<Key>,
    /// Last error returned by a key-resolution hook, if any.
    pub resolve_error: Option<EntityError>,
}

impl ResolvedKeys {
    /// Returns the keys, or the last resolution error if there was one.
    pub fn into_result(self) -> EntityResult<Vec<Key>> {
        match self.resolve_error {
            Some(err) => Err(err),
            None => Ok(self.keys),
        }
    }
}

/// Entity operations for record type `T` over store client `S`.
///
/// A session holds no mutable state; it is cheap to clone and safe to share
/// between threads. All serialization of conflicting writes is left to the
/// store's transactions.
///
/// # Example
///
/// ```rust,ignore
/// let tasks = EntitySession::<Task, _>::new(Arc::new(MemoryStore::new()), "tenant", "Task");
/// let ctx = Context::background();
///
/// let mut task = Task::new(7, "write docs");
/// tasks.create(&ctx, &mut task)?;
///
/// tasks.update(&ctx, &mut Task::with_id(7), |t| {
///     t.done = true;
///     Ok(())
/// })?;
/// ```
pub struct EntitySession<T, S> {
    /// Shared store connection.
    client: Arc<S>,
    /// Namespace stamped on every derived key.
    namespace: String,
    /// Default kind of the record type.
    kind: String,
    /// Type marker.
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Clone for EntitySession<T, S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            namespace: self.namespace.clone(),
            kind: self.kind.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, S> fmt::Debug for EntitySession<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySession")
            .field("namespace", &self.namespace)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T: Entity, S: StoreClient> EntitySession<T, S> {
    /// Creates a session.
    pub fn new(client: Arc<S>, namespace: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            kind: kind.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the store client.
    pub fn client(&self) -> &Arc<S> {
        &self.client
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the default kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns a query over the session's kind and namespace.
    pub fn new_query(&self) -> Query {
        Query::new(self.kind.clone()).namespace(self.namespace.clone())
    }

    /// Passes a store-assigned key to the entity's key-resolution hook.
    ///
    /// Does nothing for record types without a hook.
    pub fn resolve_key(&self, key: &Key, entity: &mut T) -> EntityResult<()> {
        match entity.key_loader() {
            Some(loader) => loader.load_key(key),
            None => Ok(()),
        }
    }

    /// Runs `f` in a transaction and commits it.
    ///
    /// A commit conflict is reported as
    /// [`EntityError::ConcurrentTransaction`].
    pub fn run_in_transaction<F>(&self, ctx: &Context, f: F) -> EntityResult<Commit>
    where
        F: FnMut(&mut S::Transaction) -> EntityResult<()>,
    {
        self.run_in_transaction_with(ctx, &self.client.default_transaction_options(), f)
    }

    /// Runs `f` in a transaction with explicit options and commits it.
    pub fn run_in_transaction_with<F>(
        &self,
        ctx: &Context,
        options: &TransactionOptions,
        f: F,
    ) -> EntityResult<Commit>
    where
        F: FnMut(&mut S::Transaction) -> EntityResult<()>,
    {
        self.client.run_in_transaction(ctx, options, f)
    }

    /// Resolves every pending key of a commit and hands it to its entity.
    fn resolve_pending(
        &self,
        commit: &Commit,
        pending: &[PendingKey],
        entities: &mut [T],
    ) -> EntityResult<ResolvedKeys> {
        let keys = pending
            .iter()
            .map(|pk| commit.key(pk))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(self.resolve_keys(keys, entities))
    }

    /// Best-effort key resolution; keeps the last hook error.
    fn resolve_keys(&self, keys: Vec<Key>, entities: &mut [T]) -> ResolvedKeys {
        let mut resolve_error = None;
        for (key, entity) in keys.iter().zip(entities.iter_mut()) {
            if let Err(err) = self.resolve_key(key, entity) {
                warn!(%key, error = %err, "key resolution failed");
                resolve_error = Some(err);
            }
        }
        ResolvedKeys {
            keys,
            resolve_error,
        }
    }
}
