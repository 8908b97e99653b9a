//! Concurrency layer for versionless
//!
//! This crate implements optimistic concurrency control on dirty fields,
//! without a version column:
//! - EntitySnapshot: immutable load-time baseline
//! - EntityRecord: mutable working copy with its lifecycle state
//! - MutationSet: explicit list of fields to write, or a field-by-field diff
//! - Validation: dirty fields compared against the current row at commit time
//! - LockingEngine: load, commit, merge and reattach over a `RowStore`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod mutation;
pub mod record;
pub mod snapshot;
pub mod validation;

pub use manager::{CommitOutcome, LockingEngine};
pub use mutation::MutationSet;
pub use record::{EntityRecord, RecordStatus};
pub use snapshot::EntitySnapshot;
pub use validation::{
    validate_against_store, validate_fields, ConflictType, ValidationResult,
};
