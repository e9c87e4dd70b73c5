//! # dsent Core
//!
//! Typed entity persistence over a transactional key-value store.
//!
//! A record type implements [`Entity`]: it knows how to derive its own key
//! and how to marshal itself to [`Properties`](dsent_store::Properties). An
//! [`EntitySession`] then provides create, put, get, delete and exists
//! (single and batched, with or without an open transaction) plus the
//! read-modify-write [`update`](EntitySession::update) protocol.
//!
//! The session enforces two guarantees the store does not:
//!
//! - **Key stability**: callbacks passed to `update` may not change the
//!   record's derived key; doing so fails with [`EntityError::KeyChanged`].
//! - **Serialized writers**: concurrent updates of the same key are
//!   serialized by the store's transactions; the loser fails with
//!   [`EntityError::ConcurrentTransaction`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use dsent_core::EntitySession;
//! use dsent_store::{Context, MemoryStore};
//! use std::sync::Arc;
//!
//! let tasks = EntitySession::<Task, _>::new(Arc::new(MemoryStore::new()), "tenant", "Task");
//! let ctx = Context::background();
//! tasks.update_or_create(&ctx, &mut Task::with_id(1), |t| { t.done = true; Ok(()) }, |_| Ok(()))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod entity;
mod error;
mod registry;
mod session;

pub use codec::{derive_key, derive_keys, keys_equivalent, set_namespace};
pub use entity::{Entity, KeyLoader};
pub use error::{EntityError, EntityResult, MultiError};
pub use registry::{is_registered, register_kind, unregister_kind};
pub use session::{EntitySession, ResolvedKey, ResolvedKeys, UpdateOutcome};
