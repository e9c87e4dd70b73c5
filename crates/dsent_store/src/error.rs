//! Error types for store operations.

use crate::key::Key;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a store client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No entity is stored at the key.
    #[error("no such entity: {key}")]
    NotFound {
        /// The key that was looked up.
        key: Key,
    },

    /// An insert targeted a key that already holds an entity.
    #[error("entity already exists: {key}")]
    AlreadyExists {
        /// The key that was inserted.
        key: Key,
    },

    /// The transaction lost a race with a concurrently committed transaction.
    #[error("concurrent transaction")]
    Conflict,

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline expired before the store answered.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A complete key was required.
    #[error("incomplete key: {key}")]
    IncompleteKey {
        /// The offending key.
        key: Key,
    },

    /// The key is malformed.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// Properties could not be marshaled or unmarshaled.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// A pending key was resolved against the commit of another transaction.
    #[error("pending key does not belong to this commit")]
    UnknownPendingKey,
}

impl StoreError {
    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if the caller's context ended the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled | StoreError::DeadlineExceeded)
    }
}
