//! Locking engine: load and commit with dirty-field validation
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Empty mutation set?  → NoOp (no read, no write)
//! 2. expected = snapshot values of the dirty fields
//! 3. Re-read the row, compare expected against it
//! 4. IF conflicts: return ConcurrentModification, nothing written
//! 5. compare_and_write_row(key, expected, new values)   ← atomic in storage
//! 6. IF the store refused (a writer slipped in after step 3):
//!        re-read to describe the conflict, return ConcurrentModification
//! 7. Return Applied
//! ```
//!
//! Step 5 is the only critical section, and it lives in the storage layer.
//! The engine holds no lock of its own and never retries.

use std::sync::Arc;
use tracing::{debug, warn};
use versionless_core::{EntityKey, Error, FieldMap, Result, RowStore};

use crate::mutation::MutationSet;
use crate::record::EntityRecord;
use crate::snapshot::EntitySnapshot;
use crate::validation::{validate_against_store, validate_fields};

/// Successful commit result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Empty mutation set; storage was not touched
    NoOp,
    /// The listed fields were written
    Applied {
        /// Names of the written fields, in order
        fields: Vec<String>,
    },
}

impl CommitOutcome {
    /// True if nothing was written
    pub fn is_noop(&self) -> bool {
        matches!(self, CommitOutcome::NoOp)
    }

    /// Names of the written fields (empty for a no-op)
    pub fn written_fields(&self) -> &[String] {
        match self {
            CommitOutcome::NoOp => &[],
            CommitOutcome::Applied { fields } => fields,
        }
    }
}

/// Dirty-field optimistic locking over a [`RowStore`]
///
/// # Thread Safety
///
/// `LockingEngine` is `Send + Sync` whenever the store is; share it behind an
/// `Arc` and call it from any number of threads. Atomicity of the final check
/// and write is delegated to `RowStore::compare_and_write_row`.
pub struct LockingEngine<S> {
    store: S,
}

impl<S: RowStore> LockingEngine<S> {
    /// Create an engine over `store`
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a row for modification
    ///
    /// Returns the caller's working copy and the immutable snapshot that the
    /// later commit will be validated against. Both share one copy of the
    /// load-time values.
    ///
    /// # Errors
    /// - `NotFound` if the row does not exist
    /// - storage errors, unchanged
    pub fn load(&self, key: &EntityKey) -> Result<(EntityRecord, EntitySnapshot)> {
        let row = self
            .store
            .read_row(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        debug!(target: "versionless::engine", %key, fields = row.len(), "Row loaded");

        let baseline = Arc::new(row);
        Ok((
            EntityRecord::new(key.clone(), Arc::clone(&baseline)),
            EntitySnapshot::shared(key.clone(), baseline),
        ))
    }

    /// Read the current row without taking a snapshot
    pub fn get_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        self.store.read_row(key)
    }

    /// Commit a mutation set against a load-time snapshot
    ///
    /// All-or-nothing: either every field in `mutations` is written in one
    /// atomic storage step, or nothing is.
    ///
    /// An empty mutation set is a no-op whatever snapshot accompanies it.
    ///
    /// # Errors
    /// - `InvalidOperation` if `snapshot` belongs to another row, or a
    ///   mutated field is not part of the snapshot
    /// - `ConcurrentModification` if any dirty field's stored value differs
    ///   from its snapshot value
    /// - storage errors, unchanged
    pub fn commit(
        &self,
        key: &EntityKey,
        snapshot: EntitySnapshot,
        mutations: &MutationSet,
    ) -> Result<CommitOutcome> {
        if mutations.is_empty() {
            debug!(target: "versionless::engine", %key, "Empty mutation set, nothing to commit");
            return Ok(CommitOutcome::NoOp);
        }

        if snapshot.key() != key {
            return Err(Error::invalid_operation(format!(
                "snapshot of {} used to commit {}",
                snapshot.key(),
                key
            )));
        }

        let expected = snapshot.expected_for(mutations)?;

        let validation = validate_against_store(key, &expected, &self.store)?;
        if !validation.is_valid() {
            warn!(
                target: "versionless::engine",
                %key,
                conflicts = validation.conflict_count(),
                "Commit rejected: dirty fields changed since load"
            );
            return Err(Error::ConcurrentModification {
                key: key.clone(),
                conflicts: validation.into_field_conflicts(),
            });
        }

        if !self
            .store
            .compare_and_write_row(key, &expected, mutations.as_field_map())?
        {
            // Lost the race between validation and the atomic write
            let current = self.store.read_row(key)?;
            let validation = validate_fields(&expected, current.as_ref());
            warn!(
                target: "versionless::engine",
                %key,
                conflicts = validation.conflict_count(),
                "Commit rejected: row changed during compare-and-write"
            );
            return Err(Error::ConcurrentModification {
                key: key.clone(),
                conflicts: validation.into_field_conflicts(),
            });
        }

        let fields = mutations.field_names();
        debug!(target: "versionless::engine", %key, ?fields, "Commit applied");
        Ok(CommitOutcome::Applied { fields })
    }

    /// Commit a record's dirty fields and move it to a terminal state
    ///
    /// On success the record becomes `Committed`; on any commit failure it
    /// becomes `Rejected` with the error text as reason, and the error is
    /// returned.
    ///
    /// # Errors
    /// - `InvalidState` if the record is already committed or rejected
    /// - `InvalidOperation` if `snapshot` was not taken together with the
    ///   record (the record is left untouched)
    /// - everything [`commit`](Self::commit) can return
    pub fn commit_record(
        &self,
        record: &mut EntityRecord,
        snapshot: EntitySnapshot,
    ) -> Result<CommitOutcome> {
        self.commit_record_checked(record, snapshot, |_| Ok(()))
    }

    /// [`commit_record`](Self::commit_record) with a check run on the
    /// record's mutation set before storage is touched
    ///
    /// A failing check rejects the record like any other commit failure.
    pub fn commit_record_checked<F>(
        &self,
        record: &mut EntityRecord,
        snapshot: EntitySnapshot,
        check: F,
    ) -> Result<CommitOutcome>
    where
        F: FnOnce(&MutationSet) -> Result<()>,
    {
        record.ensure_open()?;
        record.ensure_snapshot(&snapshot)?;

        let mutations = record.mutation_set();
        let key = record.key().clone();
        let result = check(&mutations).and_then(|()| self.commit(&key, snapshot, &mutations));
        match result {
            Ok(outcome) => {
                record.mark_committed()?;
                Ok(outcome)
            }
            Err(e) => {
                record.mark_rejected(e.to_string())?;
                Err(e)
            }
        }
    }

    /// Write back a detached state by reloading the row first
    ///
    /// The detached state is diffed against the row as it is *now*, and that
    /// diff is committed against a snapshot taken now. Changes made by others
    /// since the detached state was loaded are overwritten on the fields where
    /// the detached state differs; only writers racing this call are detected.
    ///
    /// # Errors
    /// - `NotFound` if the row does not exist
    /// - everything [`commit`](Self::commit) can return
    pub fn merge(&self, key: &EntityKey, detached: &FieldMap) -> Result<CommitOutcome> {
        let current = self
            .store
            .read_row(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        let mutations = MutationSet::diff(&current, detached);
        let snapshot = EntitySnapshot::new(key.clone(), current);
        debug!(
            target: "versionless::engine",
            %key,
            dirty = mutations.len(),
            "Merging detached state"
        );
        self.commit(key, snapshot, &mutations)
    }

    /// Write back a detached state against its original snapshot
    ///
    /// The detached state is diffed against `original`, the snapshot taken
    /// when it was loaded, and committed against it. Any change by others to
    /// one of the dirty fields since then is a conflict.
    ///
    /// # Errors
    /// Everything [`commit`](Self::commit) can return.
    pub fn reattach(
        &self,
        key: &EntityKey,
        original: EntitySnapshot,
        detached: &FieldMap,
    ) -> Result<CommitOutcome> {
        let mutations = MutationSet::diff(original.fields(), detached);
        debug!(
            target: "versionless::engine",
            %key,
            dirty = mutations.len(),
            "Reattaching detached state"
        );
        self.commit(key, original, &mutations)
    }

    /// Create a row
    ///
    /// # Errors
    /// - `AlreadyExists` if the key is taken
    /// - storage errors, unchanged
    pub fn insert(&self, key: &EntityKey, row: FieldMap) -> Result<()> {
        if self.store.insert_row(key, row)? {
            debug!(target: "versionless::engine", %key, "Row inserted");
            Ok(())
        } else {
            Err(Error::AlreadyExists { key: key.clone() })
        }
    }

    /// Remove a row, returning whether it existed
    pub fn delete(&self, key: &EntityKey) -> Result<bool> {
        let existed = self.store.delete_row(key)?.is_some();
        debug!(target: "versionless::engine", %key, existed, "Row deleted");
        Ok(existed)
    }
}
