//! Error types for versionless
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{EntityKey, FieldConflict};
use std::io;
use thiserror::Error;

/// Result type alias for versionless operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the locking engine and its storage layer
#[derive(Debug, Error)]
pub enum Error {
    /// Row does not exist
    #[error("Row not found: {key}")]
    NotFound {
        /// Key that was looked up
        key: EntityKey,
    },

    /// Row already exists (insert of a taken key)
    #[error("Row already exists: {key}")]
    AlreadyExists {
        /// Key that was taken
        key: EntityKey,
    },

    /// A dirty field changed since the snapshot was taken
    ///
    /// Never retried by the engine. The caller decides whether to reload.
    #[error("Concurrent modification of {key}: {} conflicting field(s)", .conflicts.len())]
    ConcurrentModification {
        /// Row the commit targeted
        key: EntityKey,
        /// Conflicting fields (may be empty if the row changed back and forth
        /// between validation and the compare-and-write)
        conflicts: Vec<FieldConflict>,
    },

    /// Storage layer failure
    #[error("Storage error: {message}")]
    Storage {
        /// Description from the storage layer
        message: String,
    },

    /// I/O error (config files, file-backed stores)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation attempted on an entity record in a terminal state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid operation or argument
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Row or mutation does not match the registered schema
    #[error("Schema violation on {entity}: {reason}")]
    SchemaViolation {
        /// Entity whose schema was violated
        entity: String,
        /// What was wrong
        reason: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation(message.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState(message.into())
    }

    /// Create a schema violation error
    pub fn schema_violation(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaViolation {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// True for `ConcurrentModification`
    ///
    /// Used by caller-side retry loops to decide whether another attempt
    /// makes sense.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::ConcurrentModification { .. })
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Conflicting fields if this is a `ConcurrentModification`
    pub fn conflicts(&self) -> Option<&[FieldConflict]> {
        match self {
            Error::ConcurrentModification { conflicts, .. } => Some(conflicts),
            _ => None,
        }
    }
}
