//! Read-modify-write update protocol.
//!
//! An update runs as a small state machine inside one transaction:
//!
//! ```text
//! Read ──found──▶ Apply ──▶ Verify ──▶ Write(update)
//!   │
//!   └─missing──▶ Create ──▶ Apply ──▶ Verify ──▶ Write(insert)
//! ```
//!
//! `Create` is only reachable when a create fallback was supplied; otherwise
//! a missing entity fails with [`EntityError::NotFound`]. Both `Create` and
//! `Verify` re-derive the key and reject any change with
//! [`EntityError::KeyChanged`]. An update callback returning
//! [`EntityError::UpdateAborted`] ends the protocol before `Write`.

use super::EntitySession;
use crate::codec::{derive_key, keys_equivalent};
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use dsent_store::{Context, Key, Mutation, StoreClient, StoreTransaction};
use std::slice;
use tracing::{debug, trace};

/// Result of a successful update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An existing entity was rewritten.
    Updated,
    /// The entity was missing and the create fallback inserted it.
    Created,
    /// The update callback aborted; nothing was written.
    Aborted,
}

impl UpdateOutcome {
    /// Returns true if a mutation was issued.
    pub fn is_written(self) -> bool {
        !matches!(self, UpdateOutcome::Aborted)
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Read,
    Create,
    Apply { insert: bool },
    Verify { insert: bool },
    Write { insert: bool },
}

type NoCreate<T> = fn(&mut T) -> EntityResult<()>;

impl<T: Entity, S: StoreClient> EntitySession<T, S> {
    /// Loads an entity, applies `update_fn` to it and writes it back, in a
    /// single transaction.
    ///
    /// `entity` only needs its identity set; on return it holds the value
    /// that was written. A missing entity fails with
    /// [`EntityError::NotFound`]. A commit conflict with a concurrent
    /// transaction fails with [`EntityError::ConcurrentTransaction`].
    pub fn update<U>(
        &self,
        ctx: &Context,
        entity: &mut T,
        update_fn: U,
    ) -> EntityResult<UpdateOutcome>
    where
        U: FnMut(&mut T) -> EntityResult<()>,
    {
        self.run_update(ctx, entity, update_fn, None::<NoCreate<T>>)
    }

    /// Like [`update`](Self::update), but initializes a missing entity with
    /// `create_fn` and inserts it.
    pub fn update_or_create<U, C>(
        &self,
        ctx: &Context,
        entity: &mut T,
        update_fn: U,
        create_fn: C,
    ) -> EntityResult<UpdateOutcome>
    where
        U: FnMut(&mut T) -> EntityResult<()>,
        C: FnMut(&mut T) -> EntityResult<()>,
    {
        self.run_update(ctx, entity, update_fn, Some(create_fn))
    }

    /// Runs the update protocol in an open transaction.
    ///
    /// The caller commits; a conflict surfaces from its commit.
    pub fn update_tx<U>(
        &self,
        tx: &mut S::Transaction,
        entity: &mut T,
        mut update_fn: U,
    ) -> EntityResult<UpdateOutcome>
    where
        U: FnMut(&mut T) -> EntityResult<()>,
    {
        self.apply_update(tx, entity, &mut update_fn, None::<&mut NoCreate<T>>)
    }

    /// Runs the update protocol with a create fallback in an open transaction.
    pub fn update_or_create_tx<U, C>(
        &self,
        tx: &mut S::Transaction,
        entity: &mut T,
        mut update_fn: U,
        mut create_fn: C,
    ) -> EntityResult<UpdateOutcome>
    where
        U: FnMut(&mut T) -> EntityResult<()>,
        C: FnMut(&mut T) -> EntityResult<()>,
    {
        self.apply_update(tx, entity, &mut update_fn, Some(&mut create_fn))
    }

    fn run_update<U, C>(
        &self,
        ctx: &Context,
        entity: &mut T,
        mut update_fn: U,
        mut create_fn: Option<C>,
    ) -> EntityResult<UpdateOutcome>
    where
        U: FnMut(&mut T) -> EntityResult<()>,
        C: FnMut(&mut T) -> EntityResult<()>,
    {
        let mut outcome = UpdateOutcome::Aborted;
        self.run_in_transaction(ctx, |tx| {
            outcome = self.apply_update(tx, entity, &mut update_fn, create_fn.as_mut())?;
            Ok(())
        })?;
        debug!(kind = %self.kind, ?outcome, "update committed");
        Ok(outcome)
    }

    fn apply_update<U, C>(
        &self,
        tx: &mut S::Transaction,
        entity: &mut T,
        update_fn: &mut U,
        mut create_fn: Option<&mut C>,
    ) -> EntityResult<UpdateOutcome>
    where
        U: FnMut(&mut T) -> EntityResult<()>,
        C: FnMut(&mut T) -> EntityResult<()>,
    {
        let key = derive_key(entity, &self.namespace)?;
        let mut step = Step::Read;
        loop {
            trace!(?step, %key, "update protocol");
            step = match step {
                Step::Read => {
                    let found = tx.get_multi(slice::from_ref(&key))?.pop().flatten();
                    match found {
                        Some(properties) => {
                            self.load_entity(&key, properties, entity)?;
                            Step::Apply { insert: false }
                        }
                        None => Step::Create,
                    }
                }
                Step::Create => {
                    let Some(create) = create_fn.as_mut() else {
                        return Err(EntityError::NotFound { key });
                    };
                    create(entity)?;
                    self.ensure_same_key(&key, entity)?;
                    Step::Apply { insert: true }
                }
                Step::Apply { insert } => match update_fn(entity) {
                    Ok(()) => Step::Verify { insert },
                    Err(EntityError::UpdateAborted) => {
                        debug!(%key, "update aborted by callback");
                        return Ok(UpdateOutcome::Aborted);
                    }
                    Err(err) => return Err(err),
                },
                Step::Verify { insert } => {
                    self.ensure_same_key(&key, entity)?;
                    Step::Write { insert }
                }
                Step::Write { insert } => {
                    let properties = entity.save()?;
                    let (mutation, outcome) = if insert {
                        (Mutation::insert(key, properties), UpdateOutcome::Created)
                    } else {
                        (Mutation::update(key, properties), UpdateOutcome::Updated)
                    };
                    tx.mutate(vec![mutation])?;
                    return Ok(outcome);
                }
            };
        }
    }

    fn ensure_same_key(&self, original: &Key, entity: &T) -> EntityResult<()> {
        let derived = derive_key(entity, &self.namespace)?;
        if keys_equivalent(original, &derived) {
            return Ok(());
        }
        Err(EntityError::KeyChanged {
            original: original.clone(),
            derived,
        })
    }
}
