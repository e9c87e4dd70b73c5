//! Create, put, get, delete and exists.

use super::{EntitySession, ResolvedKey, ResolvedKeys};
use crate::codec::{derive_key, derive_keys};
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult, MultiError};
use dsent_store::{
    Context, Key, Mutation, PendingKey, Properties, Query, StoreClient, StoreError,
    StoreTransaction,
};
use std::slice;
use tracing::debug;

impl<T: Entity, S: StoreClient> EntitySession<T, S> {
    /// Inserts an entity. Fails if its key already holds an entity.
    ///
    /// A store-assigned identifier is written back through the entity's
    /// key-resolution hook.
    pub fn create(&self, ctx: &Context, entity: &mut T) -> EntityResult<ResolvedKey> {
        let key = derive_key(entity, &self.namespace)?;
        let mutation = Mutation::insert(key, entity.save()?);
        let key = single_key(self.client.mutate(ctx, vec![mutation])?)?;
        debug!(kind = %self.kind, namespace = %self.namespace, %key, "entity created");
        self.resolve_one(key, entity)
    }

    /// Queues an insert in an open transaction.
    pub fn create_tx(&self, tx: &mut S::Transaction, entity: &T) -> EntityResult<PendingKey> {
        single_pending(self.batch_create_tx(tx, slice::from_ref(entity))?)
    }

    /// Inserts several entities atomically.
    ///
    /// Either every entity is created or none is.
    pub fn batch_create(&self, ctx: &Context, entities: &mut [T]) -> EntityResult<ResolvedKeys> {
        let mut pending = Vec::new();
        let commit = self.run_in_transaction(ctx, |tx| {
            pending = self.batch_create_tx(tx, entities)?;
            Ok(())
        })?;
        debug!(
            kind = %self.kind,
            namespace = %self.namespace,
            count = pending.len(),
            "batch created"
        );
        self.resolve_pending(&commit, &pending, entities)
    }

    /// Queues inserts for several entities in an open transaction.
    pub fn batch_create_tx(
        &self,
        tx: &mut S::Transaction,
        entities: &[T],
    ) -> EntityResult<Vec<PendingKey>> {
        let mutations = self.mutations(entities, Mutation::insert)?;
        Ok(tx.mutate(mutations)?)
    }

    /// Writes an entity whether or not it exists.
    pub fn put(&self, ctx: &Context, entity: &mut T) -> EntityResult<ResolvedKey> {
        let key = derive_key(entity, &self.namespace)?;
        let mutation = Mutation::upsert(key, entity.save()?);
        let key = single_key(self.client.mutate(ctx, vec![mutation])?)?;
        debug!(kind = %self.kind, namespace = %self.namespace, %key, "entity put");
        self.resolve_one(key, entity)
    }

    /// Queues an upsert in an open transaction.
    pub fn put_tx(&self, tx: &mut S::Transaction, entity: &T) -> EntityResult<PendingKey> {
        single_pending(self.batch_put_tx(tx, slice::from_ref(entity))?)
    }

    /// Writes several entities atomically.
    pub fn batch_put(&self, ctx: &Context, entities: &mut [T]) -> EntityResult<ResolvedKeys> {
        let mut pending = Vec::new();
        let commit = self.run_in_transaction(ctx, |tx| {
            pending = self.batch_put_tx(tx, entities)?;
            Ok(())
        })?;
        debug!(kind = %self.kind, namespace = %self.namespace, count = pending.len(), "batch put");
        self.resolve_pending(&commit, &pending, entities)
    }

    /// Queues upserts for several entities in an open transaction.
    pub fn batch_put_tx(
        &self,
        tx: &mut S::Transaction,
        entities: &[T],
    ) -> EntityResult<Vec<PendingKey>> {
        let mutations = self.mutations(entities, Mutation::upsert)?;
        Ok(tx.mutate(mutations)?)
    }

    /// Loads an entity in place from the key it derives.
    ///
    /// A missing entity is reported as [`EntityError::NotFound`].
    pub fn get(&self, ctx: &Context, entity: &mut T) -> EntityResult<()> {
        self.batch_get(ctx, slice::from_mut(entity))
            .map_err(EntityError::into_single)
    }

    /// Loads an entity in place within an open transaction.
    pub fn get_tx(&self, tx: &mut S::Transaction, entity: &mut T) -> EntityResult<()> {
        self.batch_get_tx(tx, slice::from_mut(entity))
            .map_err(EntityError::into_single)
    }

    /// Loads several entities in place.
    ///
    /// Entities that were found are populated even when others fail; the
    /// failures are reported as [`EntityError::Multi`] by position.
    pub fn batch_get(&self, ctx: &Context, entities: &mut [T]) -> EntityResult<()> {
        let keys = derive_keys(entities, &self.namespace)?;
        let found = self.client.get_multi(ctx, &keys)?;
        self.load_all(keys, found, entities)
    }

    /// Loads several entities in place within an open transaction.
    pub fn batch_get_tx(&self, tx: &mut S::Transaction, entities: &mut [T]) -> EntityResult<()> {
        let keys = derive_keys(entities, &self.namespace)?;
        let found = tx.get_multi(&keys)?;
        self.load_all(keys, found, entities)
    }

    /// Deletes an entity. Deleting a missing entity succeeds.
    pub fn delete(&self, ctx: &Context, entity: &T) -> EntityResult<()> {
        let key = derive_key(entity, &self.namespace)?;
        debug!(kind = %self.kind, namespace = %self.namespace, %key, "deleting entity");
        self.client.mutate(ctx, vec![Mutation::delete(key)])?;
        Ok(())
    }

    /// Queues a delete in an open transaction.
    pub fn delete_tx(&self, tx: &mut S::Transaction, entity: &T) -> EntityResult<()> {
        self.batch_delete_tx(tx, slice::from_ref(entity))
    }

    /// Deletes several entities atomically.
    pub fn batch_delete(&self, ctx: &Context, entities: &[T]) -> EntityResult<()> {
        self.run_in_transaction(ctx, |tx| self.batch_delete_tx(tx, entities))?;
        debug!(
            kind = %self.kind,
            namespace = %self.namespace,
            count = entities.len(),
            "batch deleted"
        );
        Ok(())
    }

    /// Queues deletes for several entities in an open transaction.
    pub fn batch_delete_tx(&self, tx: &mut S::Transaction, entities: &[T]) -> EntityResult<()> {
        let keys = derive_keys(entities, &self.namespace)?;
        tx.mutate(keys.into_iter().map(Mutation::delete).collect())?;
        Ok(())
    }

    /// Reports whether an entity exists at the key it derives.
    pub fn exists(&self, ctx: &Context, entity: &T) -> EntityResult<bool> {
        let query = self.existence_query(entity)?;
        Ok(!self.client.keys_only(ctx, &query)?.is_empty())
    }

    /// Reports whether an entity exists, as seen by an open transaction.
    pub fn exists_tx(&self, tx: &mut S::Transaction, entity: &T) -> EntityResult<bool> {
        let query = self.existence_query(entity)?;
        Ok(!tx.keys_only(&query)?.is_empty())
    }

    fn existence_query(&self, entity: &T) -> EntityResult<Query> {
        let key = derive_key(entity, &self.namespace)?;
        Ok(Query::new(key.kind.clone())
            .namespace(self.namespace.clone())
            .filter_key(key)
            .limit(1))
    }

    fn mutations(
        &self,
        entities: &[T],
        op: fn(Key, Properties) -> Mutation,
    ) -> EntityResult<Vec<Mutation>> {
        let keys = derive_keys(entities, &self.namespace)?;
        keys.into_iter()
            .zip(entities)
            .map(|(key, entity)| Ok(op(key, entity.save()?)))
            .collect()
    }

    fn resolve_one(&self, key: Key, entity: &mut T) -> EntityResult<ResolvedKey> {
        let mut resolved = self.resolve_keys(vec![key], slice::from_mut(entity));
        let key = single_key(std::mem::take(&mut resolved.keys))?;
        Ok(ResolvedKey {
            key,
            resolve_error: resolved.resolve_error,
        })
    }

    /// Loads one entity and hands it its key.
    pub(super) fn load_entity(
        &self,
        key: &Key,
        properties: Properties,
        entity: &mut T,
    ) -> EntityResult<()> {
        entity.load(properties)?;
        self.resolve_key(key, entity)
    }

    fn load_all(
        &self,
        keys: Vec<Key>,
        found: Vec<Option<Properties>>,
        entities: &mut [T],
    ) -> EntityResult<()> {
        let mut errors = Vec::with_capacity(keys.len());
        let mut failed = false;
        for ((key, properties), entity) in keys.into_iter().zip(found).zip(entities.iter_mut()) {
            let result = match properties {
                Some(properties) => self.load_entity(&key, properties, entity),
                None => Err(EntityError::NotFound { key }),
            };
            failed |= result.is_err();
            errors.push(result.err());
        }
        if failed {
            return Err(EntityError::Multi(MultiError::new(errors)));
        }
        Ok(())
    }
}

fn single_key(keys: Vec<Key>) -> EntityResult<Key> {
    keys.into_iter()
        .next()
        .ok_or_else(|| StoreError::invalid_operation("store returned no key").into())
}

fn single_pending(pending: Vec<PendingKey>) -> EntityResult<PendingKey> {
    pending
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::invalid_operation("store returned no pending key").into())
}
