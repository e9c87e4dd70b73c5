//! In-memory transactional store.

use crate::client::{Commit, PendingKey, StoreClient, StoreTransaction, TransactionId};
use crate::config::{StoreConfig, TransactionOptions};
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::mutation::{Mutation, MutationOp};
use crate::properties::Properties;
use crate::query::Query;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Latest committed state of one key.
#[derive(Debug, Clone)]
struct Version {
    /// `None` once the entity has been deleted.
    properties: Option<Properties>,
    /// Commit sequence that last wrote the key.
    seq: u64,
}

#[derive(Debug)]
struct State {
    entities: BTreeMap<Key, Version>,
    committed_seq: u64,
    next_id: i64,
}

impl State {
    fn lookup(&self, key: &Key) -> StoreResult<Option<Properties>> {
        check_lookup_key(key)?;
        Ok(self
            .entities
            .get(key)
            .and_then(|v| v.properties.clone()))
    }

    fn exists(&self, key: &Key) -> bool {
        self.entities
            .get(key)
            .is_some_and(|v| v.properties.is_some())
    }

    fn last_write(&self, key: &Key) -> Option<u64> {
        self.entities.get(key).map(|v| v.seq)
    }

    fn live_keys<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = &'a Key> + 'a {
        self.entities
            .iter()
            .filter(|(key, v)| v.properties.is_some() && query.matches(key))
            .map(|(key, _)| key)
    }

    fn allocate(
        &mut self,
        key: &Key,
        staged: &BTreeMap<Key, Option<Properties>>,
    ) -> StoreResult<Key> {
        loop {
            let id = self.next_id;
            let candidate = key.with_id(id);
            let free = !self.entities.contains_key(&candidate) && !staged.contains_key(&candidate);
            if free {
                self.next_id = id.saturating_add(1);
                return Ok(candidate);
            }
            if id == i64::MAX {
                return Err(StoreError::invalid_operation("id space exhausted"));
            }
            self.next_id = id + 1;
        }
    }

    /// Applies mutations atomically under one new commit sequence.
    ///
    /// Preconditions are checked against the committed state overlaid with
    /// earlier mutations of the same batch. Nothing is applied unless every
    /// mutation passes.
    fn apply(&mut self, mutations: &[Mutation]) -> StoreResult<Vec<Key>> {
        if mutations.is_empty() {
            return Ok(Vec::new());
        }
        let mut staged: BTreeMap<Key, Option<Properties>> = BTreeMap::new();
        let mut keys = Vec::with_capacity(mutations.len());

        for mutation in mutations {
            check_mutation_key(mutation)?;
            let key = if mutation.key.is_complete() {
                mutation.key.clone()
            } else {
                self.allocate(&mutation.key, &staged)?
            };

            let exists = match staged.get(&key) {
                Some(staged) => staged.is_some(),
                None => self.exists(&key),
            };
            match mutation.op {
                MutationOp::Insert if exists => return Err(StoreError::AlreadyExists { key }),
                MutationOp::Update if !exists => return Err(StoreError::NotFound { key }),
                _ => {}
            }

            staged.insert(key.clone(), mutation.properties.clone());
            keys.push(key);
        }

        let seq = self.committed_seq + 1;
        for (key, properties) in staged {
            // Deleting a key that was never stored leaves no tombstone
            if properties.is_none() && !self.entities.contains_key(&key) {
                continue;
            }
            self.entities.insert(key, Version { properties, seq });
        }
        self.committed_seq = seq;
        Ok(keys)
    }
}

fn check_lookup_key(key: &Key) -> StoreResult<()> {
    key.validate()?;
    if !key.is_complete() {
        return Err(StoreError::IncompleteKey { key: key.clone() });
    }
    Ok(())
}

fn check_mutation_key(mutation: &Mutation) -> StoreResult<()> {
    mutation.key.validate()?;
    if !mutation.key.is_complete() && !mutation.allows_incomplete_key() {
        return Err(StoreError::IncompleteKey {
            key: mutation.key.clone(),
        });
    }
    Ok(())
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    next_txid: AtomicU64,
    applied_mutations: AtomicU64,
}

/// An in-process transactional document store.
///
/// This store is suitable for:
/// - Unit and integration tests
/// - Embedding where no remote store is available
///
/// # Concurrency
///
/// Transactions are optimistic. A transaction records every key it reads
/// or writes; commit fails with [`StoreError::Conflict`] if any of those
/// keys was written by a transaction that committed after this one began.
/// Of two overlapping transactions on the same key, the first to commit
/// wins.
///
/// Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    config: StoreConfig,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let state = State {
            entities: BTreeMap::new(),
            committed_seq: 0,
            next_id: config.first_allocated_id,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                next_txid: AtomicU64::new(1),
                applied_mutations: AtomicU64::new(0),
            }),
            config,
        }
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared
            .state
            .lock()
            .entities
            .values()
            .filter(|v| v.properties.is_some())
            .count()
    }

    /// Returns true if no entity is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sequence of the latest commit.
    #[must_use]
    pub fn committed_seq(&self) -> u64 {
        self.shared.state.lock().committed_seq
    }

    /// Returns how many mutations have been applied since creation.
    #[must_use]
    pub fn applied_mutations(&self) -> u64 {
        self.shared.applied_mutations.load(Ordering::SeqCst)
    }

    /// Simulates one network round-trip, honouring the context.
    fn round_trip(&self, ctx: &Context) -> StoreResult<()> {
        ctx.check()?;
        if !self.config.round_trip_latency.is_zero() {
            ctx.sleep(self.config.round_trip_latency)?;
            ctx.check()?;
        }
        Ok(())
    }

    fn apply(&self, mutations: &[Mutation]) -> StoreResult<(Vec<Key>, u64)> {
        let mut state = self.shared.state.lock();
        let keys = state.apply(mutations)?;
        self.shared
            .applied_mutations
            .fetch_add(keys.len() as u64, Ordering::SeqCst);
        Ok((keys, state.committed_seq))
    }
}

impl StoreClient for MemoryStore {
    type Transaction = MemoryTransaction;

    fn get_multi(&self, ctx: &Context, keys: &[Key]) -> StoreResult<Vec<Option<Properties>>> {
        self.round_trip(ctx)?;
        let state = self.shared.state.lock();
        keys.iter().map(|key| state.lookup(key)).collect()
    }

    fn mutate(&self, ctx: &Context, mutations: Vec<Mutation>) -> StoreResult<Vec<Key>> {
        self.round_trip(ctx)?;
        let (keys, seq) = self.apply(&mutations)?;
        debug!(seq, mutations = keys.len(), "applied mutations");
        Ok(keys)
    }

    fn keys_only(&self, ctx: &Context, query: &Query) -> StoreResult<Vec<Key>> {
        self.round_trip(ctx)?;
        let state = self.shared.state.lock();
        Ok(state
            .live_keys(query)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn begin(&self, ctx: &Context, options: &TransactionOptions) -> StoreResult<MemoryTransaction> {
        self.round_trip(ctx)?;
        let id = TransactionId::new(self.shared.next_txid.fetch_add(1, Ordering::SeqCst));
        let snapshot_seq = self.shared.state.lock().committed_seq;
        Ok(MemoryTransaction {
            id,
            ctx: ctx.clone(),
            store: self.clone(),
            snapshot_seq,
            read_only: options.read_only,
            reads: BTreeSet::new(),
            mutations: Vec::new(),
        })
    }

    fn default_transaction_options(&self) -> TransactionOptions {
        TransactionOptions::default().max_attempts(self.config.default_max_attempts)
    }
}

/// A transaction on a [`MemoryStore`].
///
/// Mutations are buffered until commit. Lookups see the buffered mutations
/// first, then the latest committed state.
#[derive(Debug)]
pub struct MemoryTransaction {
    id: TransactionId,
    ctx: Context,
    store: MemoryStore,
    /// Commit sequence observed when the transaction began.
    snapshot_seq: u64,
    read_only: bool,
    /// Keys whose committed state this transaction observed.
    reads: BTreeSet<Key>,
    mutations: Vec<Mutation>,
}

impl MemoryTransaction {
    /// Returns the commit sequence observed at begin.
    #[must_use]
    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot_seq
    }

    /// Returns the number of buffered mutations.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations.len()
    }

    /// Returns the most recent buffered write to `key`.
    fn pending(&self, key: &Key) -> Option<&Mutation> {
        self.mutations.iter().rev().find(|m| &m.key == key)
    }

    /// Fails if any key this transaction touched was committed after it began.
    fn validate(&self, state: &State) -> StoreResult<()> {
        let written = self
            .mutations
            .iter()
            .map(|m| &m.key)
            .filter(|k| k.is_complete());
        for key in self.reads.iter().chain(written) {
            if state.last_write(key).is_some_and(|seq| seq > self.snapshot_seq) {
                debug!(txid = %self.id, %key, "conflicting commit detected");
                return Err(StoreError::Conflict);
            }
        }
        Ok(())
    }
}

impl StoreTransaction for MemoryTransaction {
    fn id(&self) -> TransactionId {
        self.id
    }

    fn get_multi(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<Properties>>> {
        self.store.round_trip(&self.ctx)?;
        let state = self.store.shared.state.lock();
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            check_lookup_key(key)?;
            match self.pending(key) {
                Some(mutation) => found.push(mutation.properties.clone()),
                None => {
                    self.reads.insert(key.clone());
                    found.push(state.lookup(key)?);
                }
            }
        }
        Ok(found)
    }

    fn mutate(&mut self, mutations: Vec<Mutation>) -> StoreResult<Vec<PendingKey>> {
        self.ctx.check()?;
        if self.read_only {
            return Err(StoreError::invalid_operation(
                "mutation in read-only transaction",
            ));
        }
        for mutation in &mutations {
            check_mutation_key(mutation)?;
        }
        let start = self.mutations.len();
        self.mutations.extend(mutations);
        Ok((start..self.mutations.len())
            .map(|index| PendingKey::new(self.id, index))
            .collect())
    }

    fn keys_only(&mut self, query: &Query) -> StoreResult<Vec<Key>> {
        self.store.round_trip(&self.ctx)?;
        let state = self.store.shared.state.lock();

        let mut keys: BTreeSet<Key> = state.live_keys(query).cloned().collect();
        self.reads.extend(keys.iter().cloned());
        if let Some(key) = &query.key {
            self.reads.insert(key.clone());
        }
        for mutation in &self.mutations {
            if !mutation.key.is_complete() || !query.matches(&mutation.key) {
                continue;
            }
            if mutation.op == MutationOp::Delete {
                keys.remove(&mutation.key);
            } else {
                keys.insert(mutation.key.clone());
            }
        }

        Ok(keys
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn commit(self) -> StoreResult<Commit> {
        self.store.round_trip(&self.ctx)?;
        let mut state = self.store.shared.state.lock();
        // A transaction without writes is serializable at its snapshot
        if !self.mutations.is_empty() {
            self.validate(&state)?;
        }
        let keys = state.apply(&self.mutations)?;
        self.store
            .shared
            .applied_mutations
            .fetch_add(keys.len() as u64, Ordering::SeqCst);
        debug!(
            txid = %self.id,
            seq = state.committed_seq,
            mutations = keys.len(),
            "transaction committed"
        );
        Ok(Commit::new(self.id, keys))
    }

    fn rollback(self) -> StoreResult<()> {
        debug!(txid = %self.id, discarded = self.mutations.len(), "transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value;
    use std::time::Duration;

    fn props(n: i64) -> Properties {
        let mut p = Properties::new();
        p.insert("n", Value::Integer(n.into()));
        p
    }

    fn task(id: i64) -> Key {
        Key::id_key("Task", id, None)
    }

    #[test]
    fn insert_then_insert_again_fails() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        store.mutate(&ctx, vec![Mutation::insert(task(1), props(1))]).unwrap();
        let err = store
            .mutate(&ctx, vec![Mutation::insert(task(1), props(2))])
            .unwrap_err();

        assert_eq!(err, StoreError::AlreadyExists { key: task(1) });
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![Some(props(1))]);
    }

    #[test]
    fn update_requires_existing_entity() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        let err = store
            .mutate(&ctx, vec![Mutation::update(task(1), props(1))])
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound { key: task(1) });
    }

    #[test]
    fn delete_missing_is_ok() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        store.mutate(&ctx, vec![Mutation::delete(task(1))]).unwrap();
        store.mutate(&ctx, vec![Mutation::delete(task(1))]).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        store.mutate(&ctx, vec![Mutation::insert(task(2), props(2))]).unwrap();

        let result = store.mutate(
            &ctx,
            vec![
                Mutation::insert(task(1), props(1)),
                Mutation::insert(task(2), props(2)),
            ],
        );
        assert!(result.is_err());
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![None]);
    }

    #[test]
    fn incomplete_keys_are_allocated() {
        let store = MemoryStore::with_config(StoreConfig::new().first_allocated_id(500));
        let ctx = Context::background();

        let keys = store
            .mutate(
                &ctx,
                vec![
                    Mutation::insert(Key::incomplete_key("Task", None), props(1)),
                    Mutation::upsert(Key::incomplete_key("Task", None), props(2)),
                ],
            )
            .unwrap();
        assert_eq!(keys[0].id(), 500);
        assert_eq!(keys[1].id(), 501);
    }

    #[test]
    fn incomplete_key_rejected_for_update_and_lookup() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        let key = Key::incomplete_key("Task", None);

        let err = store
            .mutate(&ctx, vec![Mutation::update(key.clone(), props(1))])
            .unwrap_err();
        assert!(matches!(err, StoreError::IncompleteKey { .. }));

        let err = store.get_multi(&ctx, &[key]).unwrap_err();
        assert!(matches!(err, StoreError::IncompleteKey { .. }));
    }

    #[test]
    fn transaction_reads_its_own_writes() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        let mut tx = store.begin(&ctx, &TransactionOptions::default()).unwrap();
        tx.mutate(vec![Mutation::upsert(task(1), props(7))]).unwrap();
        assert_eq!(tx.get_multi(&[task(1)]).unwrap(), vec![Some(props(7))]);
        assert_eq!(tx.keys_only(&Query::new("Task")).unwrap(), vec![task(1)]);

        // Not visible outside before commit
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![None]);

        tx.commit().unwrap();
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![Some(props(7))]);
    }

    #[test]
    fn rollback_discards_writes() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        let mut tx = store.begin(&ctx, &TransactionOptions::default()).unwrap();
        tx.mutate(vec![Mutation::upsert(task(1), props(7))]).unwrap();
        tx.rollback().unwrap();

        assert!(store.is_empty());
        assert_eq!(store.applied_mutations(), 0);
    }

    #[test]
    fn commit_resolves_pending_keys() {
        let store = MemoryStore::with_config(StoreConfig::new().first_allocated_id(90));
        let ctx = Context::background();

        let mut tx = store.begin(&ctx, &TransactionOptions::default()).unwrap();
        let pending = tx
            .mutate(vec![
                Mutation::insert(task(3), props(3)),
                Mutation::insert(Key::incomplete_key("Task", None), props(4)),
            ])
            .unwrap();
        let commit = tx.commit().unwrap();

        assert_eq!(commit.key(&pending[0]).unwrap(), task(3));
        assert_eq!(commit.key(&pending[1]).unwrap(), task(90));
    }

    #[test]
    fn overlapping_transactions_first_committer_wins() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        store.mutate(&ctx, vec![Mutation::insert(task(1), props(0))]).unwrap();

        let opts = TransactionOptions::default();
        let mut a = store.begin(&ctx, &opts).unwrap();
        let mut b = store.begin(&ctx, &opts).unwrap();
        a.get_multi(&[task(1)]).unwrap();
        b.get_multi(&[task(1)]).unwrap();
        a.mutate(vec![Mutation::update(task(1), props(1))]).unwrap();
        b.mutate(vec![Mutation::update(task(1), props(2))]).unwrap();

        a.commit().unwrap();
        assert_eq!(b.commit().unwrap_err(), StoreError::Conflict);
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![Some(props(1))]);
    }

    #[test]
    fn disjoint_transactions_both_commit() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        let opts = TransactionOptions::default();

        let mut a = store.begin(&ctx, &opts).unwrap();
        let mut b = store.begin(&ctx, &opts).unwrap();
        a.mutate(vec![Mutation::upsert(task(1), props(1))]).unwrap();
        b.mutate(vec![Mutation::upsert(task(2), props(2))]).unwrap();

        a.commit().unwrap();
        b.commit().unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn read_only_transaction_rejects_mutations() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        let mut tx = store
            .begin(&ctx, &TransactionOptions::new().read_only(true))
            .unwrap();
        let err = tx.mutate(vec![Mutation::delete(task(1))]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation { .. }));
    }

    #[test]
    fn run_in_transaction_retries_conflicts() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        store.mutate(&ctx, vec![Mutation::insert(task(1), props(0))]).unwrap();

        let mut attempts = 0;
        let opts = TransactionOptions::new().max_attempts(2);
        store
            .run_in_transaction(&ctx, &opts, |tx| -> StoreResult<()> {
                attempts += 1;
                tx.get_multi(&[task(1)])?;
                if attempts == 1 {
                    // A competing writer commits between read and commit
                    store.mutate(&ctx, vec![Mutation::upsert(task(1), props(9))])?;
                }
                tx.mutate(vec![Mutation::update(task(1), props(1))])?;
                Ok(())
            })
            .unwrap();

        assert_eq!(attempts, 2);
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![Some(props(1))]);
    }

    #[test]
    fn run_in_transaction_surfaces_conflict_without_retry() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        store.mutate(&ctx, vec![Mutation::insert(task(1), props(0))]).unwrap();

        let result = store.run_in_transaction(&ctx, &TransactionOptions::default(), |tx| {
            tx.get_multi(&[task(1)])?;
            store.mutate(&ctx, vec![Mutation::upsert(task(1), props(9))])?;
            tx.mutate(vec![Mutation::update(task(1), props(1))])?;
            Ok::<(), StoreError>(())
        });

        assert_eq!(result.unwrap_err(), StoreError::Conflict);
    }

    #[test]
    fn keys_only_respects_limit_and_namespace() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        store
            .mutate(
                &ctx,
                vec![
                    Mutation::insert(task(1).with_namespace("a"), props(1)),
                    Mutation::insert(task(2).with_namespace("a"), props(2)),
                    Mutation::insert(task(3).with_namespace("b"), props(3)),
                ],
            )
            .unwrap();

        let keys = store
            .keys_only(&ctx, &Query::new("Task").namespace("a").limit(1))
            .unwrap();
        assert_eq!(keys, vec![task(1).with_namespace("a")]);

        let keys = store.keys_only(&ctx, &Query::new("Task").namespace("b")).unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn expired_context_applies_nothing() {
        let config = StoreConfig::new().round_trip_latency(Duration::from_millis(50));
        let store = MemoryStore::with_config(config);
        let ctx = Context::background().with_timeout(Duration::from_millis(5));

        let err = store
            .mutate(&ctx, vec![Mutation::insert(task(1), props(1))])
            .unwrap_err();
        assert_eq!(err, StoreError::DeadlineExceeded);
        assert!(store.is_empty());
    }

    #[test]
    fn cancelled_transaction_does_not_commit() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        let mut tx = store.begin(&ctx, &TransactionOptions::default()).unwrap();
        tx.mutate(vec![Mutation::insert(task(1), props(1))]).unwrap();
        ctx.cancel();

        assert_eq!(tx.commit().unwrap_err(), StoreError::Cancelled);
        assert!(store.is_empty());
    }

    #[test]
    fn transaction_without_writes_commits_despite_concurrent_write() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        store.mutate(&ctx, vec![Mutation::insert(task(1), props(1))]).unwrap();

        let mut tx = store.begin(&ctx, &TransactionOptions::default()).unwrap();
        tx.get_multi(&[task(1)]).unwrap();
        store.mutate(&ctx, vec![Mutation::upsert(task(1), props(2))]).unwrap();

        tx.commit().unwrap();
        assert_eq!(store.committed_seq(), 2);
        assert_eq!(store.get_multi(&ctx, &[task(1)]).unwrap(), vec![Some(props(2))]);
    }

    #[test]
    fn deleting_unknown_keys_leaves_no_tombstone() {
        let store = MemoryStore::new();
        let ctx = Context::background();

        store
            .mutate(&ctx, vec![Mutation::delete(task(1)), Mutation::delete(task(2))])
            .unwrap();
        assert!(store.shared.state.lock().entities.is_empty());

        store.mutate(&ctx, vec![Mutation::insert(task(3), props(3))]).unwrap();
        store.mutate(&ctx, vec![Mutation::delete(task(3))]).unwrap();
        store.mutate(&ctx, vec![Mutation::delete(task(3))]).unwrap();
        assert_eq!(store.shared.state.lock().entities.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let store = MemoryStore::with_config(StoreConfig::new().first_allocated_id(i64::MAX));
        let ctx = Context::background();

        let allocate = || vec![Mutation::insert(Key::incomplete_key("Task", None), props(1))];

        let keys = store.mutate(&ctx, allocate()).unwrap();
        assert_eq!(keys[0].id(), i64::MAX);

        let err = store.mutate(&ctx, allocate()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation { .. }));
        assert_eq!(store.len(), 1);
    }
}
