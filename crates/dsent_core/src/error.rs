//! Error types for entity sessions.

use dsent_store::{Key, StoreError};
use std::fmt;
use thiserror::Error;

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Errors that can occur in entity operations.
#[derive(Debug, Error)]
pub enum EntityError {
    /// The entity cannot produce a valid key.
    #[error("key derivation failed: {message}")]
    KeyDerivation {
        /// Description of what is missing or malformed.
        message: String,
    },

    /// No entity exists at the derived key.
    #[error("entity not found: {key}")]
    NotFound {
        /// The key that was looked up.
        key: Key,
    },

    /// A create or update callback changed the entity's key.
    #[error("key changed during transaction: {original} became {derived}")]
    KeyChanged {
        /// Key derived before the callback ran.
        original: Key,
        /// Key derived after the callback ran.
        derived: Key,
    },

    /// The transaction lost a race with a concurrent transaction.
    ///
    /// Retrying the whole operation may succeed.
    #[error("concurrent transaction")]
    ConcurrentTransaction,

    /// Returned by an update callback to skip the write.
    ///
    /// When the update callback returns it, the update protocol ends as a
    /// clean no-op and reports [`UpdateOutcome::Aborted`](crate::UpdateOutcome::Aborted).
    /// Returned from a create fallback, it is passed to the caller like any
    /// other callback error.
    #[error("update aborted")]
    UpdateAborted,

    /// Per-entity failures of a batch operation.
    #[error("{0}")]
    Multi(MultiError),

    /// The kind name is already registered.
    #[error("kind already registered: {kind}")]
    KindAlreadyRegistered {
        /// The duplicate kind name.
        kind: String,
    },

    /// A caller-supplied callback failed.
    #[error("callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Store error passed through unchanged.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl EntityError {
    /// Creates a key derivation error.
    pub fn key_derivation(message: impl Into<String>) -> Self {
        Self::KeyDerivation {
            message: message.into(),
        }
    }

    /// Wraps a caller error.
    pub fn callback(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Callback(err.into())
    }

    /// Returns true if no entity was found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EntityError::NotFound { .. })
    }

    /// Returns true if the insert target already existed.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, EntityError::Store(StoreError::AlreadyExists { .. }))
    }

    /// Returns true if the caller's context cancelled or timed out the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EntityError::Store(e) if e.is_cancelled())
    }

    /// Returns true if retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EntityError::ConcurrentTransaction)
    }

    /// Reduces a batch error to its first per-entity error.
    ///
    /// Other errors are returned unchanged.
    #[must_use]
    pub fn into_single(self) -> Self {
        match self {
            EntityError::Multi(multi) => multi.into_first().unwrap_or(EntityError::Multi(
                MultiError::default(),
            )),
            other => other,
        }
    }
}

impl From<StoreError> for EntityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => EntityError::NotFound { key },
            StoreError::Conflict => EntityError::ConcurrentTransaction,
            other => EntityError::Store(other),
        }
    }
}

/// Per-slot errors of a batch operation.
///
/// Slot `i` holds the error for the `i`-th entity of the batch, or `None`
/// if that entity succeeded.
#[derive(Debug, Default)]
pub struct MultiError(Vec<Option<EntityError>>);

impl MultiError {
    /// Creates a multi-error from per-slot results.
    #[must_use]
    pub fn new(errors: Vec<Option<EntityError>>) -> Self {
        Self(errors)
    }

    /// Returns the error of slot `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EntityError> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failed slots.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|e| e.is_some()).count()
    }

    /// Iterates over the failed slots as `(index, error)`.
    pub fn errors(&self) -> impl Iterator<Item = (usize, &EntityError)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i, e)))
    }

    /// Returns the first failure.
    #[must_use]
    pub fn into_first(self) -> Option<EntityError> {
        self.0.into_iter().flatten().next()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = self.errors();
        match errors.next() {
            None => write!(f, "(0 errors)"),
            Some((_, first)) => {
                let others = self.error_count() - 1;
                match others {
                    0 => write!(f, "{first}"),
                    1 => write!(f, "{first} (and 1 other error)"),
                    n => write!(f, "{first} (and {n} other errors)"),
                }
            }
        }
    }
}
