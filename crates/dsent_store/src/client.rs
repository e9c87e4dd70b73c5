//! Store client traits.

use crate::config::TransactionOptions;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::mutation::Mutation;
use crate::properties::Properties;
use crate::query::Query;
use std::fmt;
use tracing::debug;

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing and never reused within
/// one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Placeholder for the key of a mutation queued in an open transaction.
///
/// It becomes a concrete key through [`Commit::key`] once the
/// transaction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey {
    txid: TransactionId,
    index: usize,
}

impl PendingKey {
    /// Creates a pending key for the `index`-th mutation of `txid`.
    #[must_use]
    pub const fn new(txid: TransactionId, index: usize) -> Self {
        Self { txid, index }
    }

    /// Returns the transaction that issued this key.
    #[must_use]
    pub const fn txid(&self) -> TransactionId {
        self.txid
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    txid: TransactionId,
    keys: Vec<Key>,
}

impl Commit {
    /// Creates a commit result. `keys[i]` is the final key of the
    /// transaction's `i`-th mutation.
    #[must_use]
    pub fn new(txid: TransactionId, keys: Vec<Key>) -> Self {
        Self { txid, keys }
    }

    /// Returns the committed transaction's ID.
    #[must_use]
    pub fn txid(&self) -> TransactionId {
        self.txid
    }

    /// Resolves a pending key into the key assigned at commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPendingKey`] if the pending key was
    /// issued by another transaction.
    pub fn key(&self, pending: &PendingKey) -> StoreResult<Key> {
        if pending.txid != self.txid {
            return Err(StoreError::UnknownPendingKey);
        }
        self.keys
            .get(pending.index)
            .cloned()
            .ok_or(StoreError::UnknownPendingKey)
    }
}

/// An open transaction.
///
/// Reads see the transaction's own queued mutations. Mutations are applied
/// atomically on [`commit`](Self::commit); nothing is visible to other
/// readers before that.
pub trait StoreTransaction: Send {
    /// Returns the transaction ID.
    fn id(&self) -> TransactionId;

    /// Looks up several keys. Missing entities yield `None` in their slot.
    fn get_multi(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<Properties>>>;

    /// Queues mutations, returning one pending key per mutation.
    fn mutate(&mut self, mutations: Vec<Mutation>) -> StoreResult<Vec<PendingKey>>;

    /// Runs a keys-only query inside the transaction.
    fn keys_only(&mut self, query: &Query) -> StoreResult<Vec<Key>>;

    /// Applies every queued mutation atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if a concurrently committed
    /// transaction touched a key this transaction read or wrote.
    fn commit(self) -> StoreResult<Commit>
    where
        Self: Sized;

    /// Discards every queued mutation.
    fn rollback(self) -> StoreResult<()>
    where
        Self: Sized;
}

/// A connection to a transactional key-value document store.
///
/// Outside a transaction each call is committed on its own. Implementations
/// must honour the [`Context`] passed to every call.
pub trait StoreClient: Send + Sync {
    /// Transaction handle type.
    type Transaction: StoreTransaction;

    /// Looks up several keys. Missing entities yield `None` in their slot.
    fn get_multi(&self, ctx: &Context, keys: &[Key]) -> StoreResult<Vec<Option<Properties>>>;

    /// Applies mutations atomically, returning the final key of each.
    fn mutate(&self, ctx: &Context, mutations: Vec<Mutation>) -> StoreResult<Vec<Key>>;

    /// Runs a keys-only query.
    fn keys_only(&self, ctx: &Context, query: &Query) -> StoreResult<Vec<Key>>;

    /// Opens a transaction bound to `ctx`.
    fn begin(&self, ctx: &Context, options: &TransactionOptions) -> StoreResult<Self::Transaction>;

    /// Options used when the caller does not supply any.
    fn default_transaction_options(&self) -> TransactionOptions {
        TransactionOptions::default()
    }

    /// Runs `f` inside a transaction and commits it.
    ///
    /// If `f` fails the transaction is rolled back and the error returned.
    /// A commit conflict re-runs `f` in a fresh transaction until
    /// `options.max_attempts` is reached, then surfaces as
    /// [`StoreError::Conflict`].
    fn run_in_transaction<F, E>(
        &self,
        ctx: &Context,
        options: &TransactionOptions,
        mut f: F,
    ) -> Result<Commit, E>
    where
        Self: Sized,
        F: FnMut(&mut Self::Transaction) -> Result<(), E>,
        E: From<StoreError>,
    {
        let attempts = options.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = self.begin(ctx, options)?;
            let txid = tx.id();
            if let Err(e) = f(&mut tx) {
                // Don't mask the original error
                let _ = tx.rollback();
                return Err(e);
            }
            match tx.commit() {
                Ok(commit) => return Ok(commit),
                Err(StoreError::Conflict) if attempt < attempts => {
                    debug!(%txid, attempt, "commit conflict, retrying transaction");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
