//! Store and transaction configuration.

use std::time::Duration;

/// Configuration for a [`MemoryStore`](crate::MemoryStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Simulated latency of every store round-trip.
    ///
    /// The wait honours the caller's context, so a short deadline aborts
    /// the call.
    pub round_trip_latency: Duration,

    /// First surrogate id handed out for incomplete keys.
    pub first_allocated_id: i64,

    /// Attempts made by `run_in_transaction` when no options are given.
    pub default_max_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            round_trip_latency: Duration::ZERO,
            first_allocated_id: 1 << 32,
            default_max_attempts: 1,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulated round-trip latency.
    #[must_use]
    pub const fn round_trip_latency(mut self, latency: Duration) -> Self {
        self.round_trip_latency = latency;
        self
    }

    /// Sets the first allocated surrogate id.
    #[must_use]
    pub const fn first_allocated_id(mut self, id: i64) -> Self {
        self.first_allocated_id = id;
        self
    }

    /// Sets the default number of transaction attempts.
    #[must_use]
    pub const fn default_max_attempts(mut self, attempts: u32) -> Self {
        self.default_max_attempts = attempts;
        self
    }
}

/// Options for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    /// How many times `run_in_transaction` runs the body when commit
    /// reports a conflict. 1 means no retry.
    pub max_attempts: u32,

    /// Rejects mutations when set.
    pub read_only: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            read_only: false,
        }
    }
}

impl TransactionOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of attempts.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets whether the transaction is read-only.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }
}
