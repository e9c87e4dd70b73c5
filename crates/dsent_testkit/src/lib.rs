//! # dsent Testkit
//!
//! Test utilities for dsent.
//!
//! This crate provides:
//! - Record types covering every shape of key derivation and key resolution
//! - Session helpers over an in-memory store
//! - Property-based generators for keys using proptest
//! - `tracing` output captured by the test harness
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dsent_testkit::prelude::*;
//!
//! #[test]
//! fn create_assigns_an_id() {
//!     let records = memory_session::<ExampleRecord>();
//!     let mut record = ExampleRecord::new(0, "hello");
//!     records.create(&Context::background(), &mut record).unwrap();
//!     assert_ne!(record.id, 0);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use dsent_core::{EntityError, EntityResult, EntitySession, UpdateOutcome};
    pub use dsent_store::{Context, Key, MemoryStore, StoreConfig};
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
