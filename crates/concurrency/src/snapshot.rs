//! Load-time snapshots
//!
//! An [`EntitySnapshot`] is the baseline a commit is validated against: the
//! row's field values exactly as read at load time. It is immutable, not
//! `Clone`, and taken by value by every commit path, so one snapshot backs at
//! most one commit.

use std::sync::Arc;
use versionless_core::{EntityKey, Error, FieldMap, Result, Value};

use crate::mutation::MutationSet;

/// Immutable field values of a row as read at load time
#[derive(Debug)]
pub struct EntitySnapshot {
    key: EntityKey,
    fields: Arc<FieldMap>,
}

impl EntitySnapshot {
    /// Snapshot of `fields` for the row at `key`
    ///
    /// Normally produced by `LockingEngine::load`. Building one by hand is
    /// useful to reattach a detached entity whose load-time state the caller
    /// kept elsewhere.
    pub fn new(key: EntityKey, fields: FieldMap) -> Self {
        Self {
            key,
            fields: Arc::new(fields),
        }
    }

    pub(crate) fn shared(key: EntityKey, fields: Arc<FieldMap>) -> Self {
        Self { key, fields }
    }

    /// Shared load-time values; a record and the snapshot taken with it
    /// point at the same allocation
    pub(crate) fn shared_fields(&self) -> &Arc<FieldMap> {
        &self.fields
    }

    /// Row this snapshot was taken from
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Load-time value of `field`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All load-time values
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Load-time values of exactly the fields in `mutations`
    ///
    /// This is the expected state handed to the storage layer's
    /// compare-and-write.
    ///
    /// # Errors
    /// `InvalidOperation` if a mutated field is not part of the snapshot.
    pub fn expected_for(&self, mutations: &MutationSet) -> Result<FieldMap> {
        mutations
            .iter()
            .map(|(field, _)| match self.fields.get(field) {
                Some(value) => Ok((field.clone(), value.clone())),
                None => Err(Error::invalid_operation(format!(
                    "field '{}' is not part of the snapshot of {}",
                    field, self.key
                ))),
            })
            .collect()
    }
}
