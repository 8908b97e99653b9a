//! Entity records
//!
//! An [`EntityRecord`] is the caller's mutable working copy of a loaded row.
//! It keeps the load-time values alongside the working values, so the dirty
//! fields are always one explicit diff away.
//!
//! State transitions:
//! - `Loaded` → `Mutated` (a field now differs from its loaded value)
//! - `Mutated` → `Loaded` (every field set back to its loaded value)
//! - `Loaded` | `Mutated` → `Committed` (commit succeeded, possibly as a no-op)
//! - `Loaded` | `Mutated` → `Rejected` (commit failed)
//!
//! Terminal states (no operations allowed):
//! - `Committed`
//! - `Rejected`

use std::sync::Arc;
use versionless_core::{EntityKey, Error, FieldMap, Result, Value};

use crate::mutation::MutationSet;
use crate::snapshot::EntitySnapshot;

/// Status of an entity record in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Freshly loaded, no dirty fields
    Loaded,
    /// At least one field differs from its loaded value
    Mutated,
    /// Commit succeeded
    Committed,
    /// Commit failed
    Rejected {
        /// Human-readable reason for rejection
        reason: String,
    },
}

/// Mutable working copy of a loaded row
#[derive(Debug, Clone)]
pub struct EntityRecord {
    key: EntityKey,
    baseline: Arc<FieldMap>,
    current: FieldMap,
    status: RecordStatus,
}

impl EntityRecord {
    pub(crate) fn new(key: EntityKey, baseline: Arc<FieldMap>) -> Self {
        let current = (*baseline).clone();
        Self {
            key,
            baseline,
            current,
            status: RecordStatus::Loaded,
        }
    }

    /// Row this record was loaded from
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Current status
    pub fn status(&self) -> &RecordStatus {
        &self.status
    }

    /// Working value of `field`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.current.get(field)
    }

    /// All working values
    pub fn fields(&self) -> &FieldMap {
        &self.current
    }

    /// Value of `field` as it was loaded
    pub fn loaded_value(&self, field: &str) -> Option<&Value> {
        self.baseline.get(field)
    }

    /// Change the working value of `field`
    ///
    /// # Errors
    /// - `InvalidState` if the record is committed or rejected
    /// - `InvalidOperation` if `field` was not part of the loaded row
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_open()?;
        let Some(slot) = self.current.get_mut(field) else {
            return Err(Error::invalid_operation(format!(
                "{} has no field '{}'",
                self.key, field
            )));
        };
        *slot = value.into();
        self.refresh_status();
        Ok(())
    }

    /// Put `field` back to its loaded value
    ///
    /// # Errors
    /// `InvalidState` if the record is committed or rejected.
    pub fn reset(&mut self, field: &str) -> Result<()> {
        self.ensure_open()?;
        if let Some(original) = self.baseline.get(field) {
            self.current.insert(field.to_string(), original.clone());
        }
        self.refresh_status();
        Ok(())
    }

    /// True if the working value of `field` differs from its loaded value
    pub fn is_dirty(&self, field: &str) -> bool {
        self.current.get(field) != self.baseline.get(field)
    }

    /// Names of the dirty fields, in order
    pub fn dirty_fields(&self) -> Vec<String> {
        self.mutation_set().field_names()
    }

    /// The fields to write on commit
    pub fn mutation_set(&self) -> MutationSet {
        MutationSet::diff(&self.baseline, &self.current)
    }

    /// True if committed or rejected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            RecordStatus::Committed | RecordStatus::Rejected { .. }
        )
    }

    /// True if the last commit succeeded
    pub fn is_committed(&self) -> bool {
        matches!(self.status, RecordStatus::Committed)
    }

    /// True if the last commit failed
    pub fn is_rejected(&self) -> bool {
        matches!(self.status, RecordStatus::Rejected { .. })
    }

    /// Reason for rejection, if rejected
    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.status {
            RecordStatus::Rejected { reason } => Some(reason),
            _ => None,
        }
    }

    /// Check that the record still accepts operations
    ///
    /// # Errors
    /// `InvalidState` if the record is committed or rejected.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_terminal() {
            Err(Error::invalid_state(format!(
                "record {} is {:?}",
                self.key, self.status
            )))
        } else {
            Ok(())
        }
    }

    /// Check that `snapshot` was taken by the same load as this record
    ///
    /// # Errors
    /// `InvalidOperation` if the snapshot belongs to another row or to
    /// another load of this row.
    pub fn ensure_snapshot(&self, snapshot: &EntitySnapshot) -> Result<()> {
        if snapshot.key() != &self.key {
            return Err(Error::invalid_operation(format!(
                "snapshot of {} used to commit record {}",
                snapshot.key(),
                self.key
            )));
        }
        if !Arc::ptr_eq(&self.baseline, snapshot.shared_fields()) {
            return Err(Error::invalid_operation(format!(
                "snapshot of {} was not taken with this record",
                self.key
            )));
        }
        Ok(())
    }

    fn refresh_status(&mut self) {
        self.status = if self.current == *self.baseline {
            RecordStatus::Loaded
        } else {
            RecordStatus::Mutated
        };
    }

    /// `Loaded` | `Mutated` → `Committed`
    pub(crate) fn mark_committed(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.status = RecordStatus::Committed;
        Ok(())
    }

    /// `Loaded` | `Mutated` → `Rejected`
    pub(crate) fn mark_rejected(&mut self, reason: String) -> Result<()> {
        self.ensure_open()?;
        self.status = RecordStatus::Rejected { reason };
        Ok(())
    }
}
