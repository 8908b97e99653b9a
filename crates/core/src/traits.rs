//! Storage abstraction consumed by the locking engine
//!
//! The engine never writes rows directly. It reads rows and hands the storage
//! layer a compare-and-write request naming the expected values of exactly the
//! fields it intends to change. Everything else about persistence (sharding,
//! durability, I/O) belongs to the implementation.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{EntityKey, FieldMap};

/// Row storage contract
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
///
/// Failures are reported as `Error::Storage` or `Error::Io`; the engine
/// propagates them to the caller unchanged.
pub trait RowStore: Send + Sync {
    /// Read the current field values of a row
    ///
    /// Returns `None` if the row does not exist.
    fn read_row(&self, key: &EntityKey) -> Result<Option<FieldMap>>;

    /// Atomically check and update a row
    ///
    /// If the row exists and, for every `(field, value)` in `expected`, the
    /// row's current value for `field` equals `value`, every `(field, value)`
    /// in `new_fields` is written into the row and `true` is returned.
    /// Otherwise nothing is written and `false` is returned.
    ///
    /// The check and the write must form a single atomic unit with respect to
    /// the row: no other write to the row may interleave.
    fn compare_and_write_row(
        &self,
        key: &EntityKey,
        expected: &FieldMap,
        new_fields: &FieldMap,
    ) -> Result<bool>;

    /// Create a row
    ///
    /// Returns `false` without writing if the row already exists.
    fn insert_row(&self, key: &EntityKey, row: FieldMap) -> Result<bool>;

    /// Remove a row, returning its last field values if it existed
    fn delete_row(&self, key: &EntityKey) -> Result<Option<FieldMap>>;
}

impl<S: RowStore + ?Sized> RowStore for Arc<S> {
    fn read_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        (**self).read_row(key)
    }

    fn compare_and_write_row(
        &self,
        key: &EntityKey,
        expected: &FieldMap,
        new_fields: &FieldMap,
    ) -> Result<bool> {
        (**self).compare_and_write_row(key, expected, new_fields)
    }

    fn insert_row(&self, key: &EntityKey, row: FieldMap) -> Result<bool> {
        (**self).insert_row(key, row)
    }

    fn delete_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        (**self).delete_row(key)
    }
}
