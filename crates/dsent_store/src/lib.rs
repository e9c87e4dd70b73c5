//! # dsent Store
//!
//! Store client contract for dsent.
//!
//! dsent sits on top of a transactional key-value document store. This crate
//! describes what dsent needs from that store and nothing more:
//!
//! - [`Key`] - hierarchical `(kind, identifier)` paths with a namespace tag
//! - [`Properties`] - the marshaled form of a record
//! - [`StoreClient`] / [`StoreTransaction`] - batched lookup, mutation,
//!   keys-only queries and run-in-transaction
//! - [`Context`] - caller-supplied deadline and cancellation
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - in-process store with serializable conflict detection,
//!   used for testing and embedding
//!
//! ## Example
//!
//! ```rust
//! use dsent_store::{Context, Key, MemoryStore, Mutation, Properties, StoreClient};
//!
//! let store = MemoryStore::new();
//! let ctx = Context::background();
//! let key = Key::name_key("Task", "write-docs", None);
//! store
//!     .mutate(&ctx, vec![Mutation::insert(key.clone(), Properties::new())])
//!     .unwrap();
//! let found = store.get_multi(&ctx, &[key]).unwrap();
//! assert!(found[0].is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod context;
mod error;
mod key;
mod memory;
mod mutation;
mod properties;
mod query;

pub use client::{Commit, PendingKey, StoreClient, StoreTransaction, TransactionId};
pub use config::{StoreConfig, TransactionOptions};
pub use context::Context;
pub use error::{StoreError, StoreResult};
pub use key::{Identifier, Key};
pub use memory::{MemoryStore, MemoryTransaction};
pub use mutation::{Mutation, MutationOp};
pub use properties::{PropertyLoadSaver, Properties};
pub use query::Query;
