//! Commit coordinator
//!
//! The CommitCoordinator wraps LockingEngine and adds:
//! - Commit metrics (loads, applied, no-op, rejected, failed)
//! - Write logging when `show_writes` is enabled

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};
use versionless_concurrency::{
    CommitOutcome, EntityRecord, EntitySnapshot, LockingEngine, MutationSet,
};
use versionless_core::{EntityKey, Error, FieldMap, Result, RowStore};

/// Commit coordinator for the database
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering. They are purely observational
/// and do not synchronize any other memory operations.
pub struct CommitCoordinator<S> {
    engine: LockingEngine<S>,
    show_writes: bool,
    total_loads: AtomicU64,
    total_committed: AtomicU64,
    total_noop: AtomicU64,
    total_rejected: AtomicU64,
    total_failed: AtomicU64,
}

impl<S: RowStore> CommitCoordinator<S> {
    /// Create a coordinator over `store`
    pub fn new(store: S, show_writes: bool) -> Self {
        Self {
            engine: LockingEngine::new(store),
            show_writes,
            total_loads: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_noop: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }

    /// Underlying engine
    pub fn engine(&self) -> &LockingEngine<S> {
        &self.engine
    }

    /// Load a row and count the load
    pub fn load(&self, key: &EntityKey) -> Result<(EntityRecord, EntitySnapshot)> {
        let loaded = self.engine.load(key)?;
        self.total_loads.fetch_add(1, Ordering::Relaxed);
        Ok(loaded)
    }

    /// Commit through the engine, recording the outcome
    pub fn commit(
        &self,
        key: &EntityKey,
        snapshot: EntitySnapshot,
        mutations: &MutationSet,
    ) -> Result<CommitOutcome> {
        let result = self.engine.commit(key, snapshot, mutations);
        self.record(key, Some(mutations.as_field_map()), &result);
        result
    }

    /// Commit a record through the engine, recording the outcome
    ///
    /// `check` runs on the record's mutation set before storage is touched;
    /// a failing check rejects the record. A terminal record or a foreign
    /// snapshot is refused before anything is counted.
    pub fn commit_record<F>(
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
        let result = self.engine.commit_record_checked(record, snapshot, check);
        self.record(&key, Some(mutations.as_field_map()), &result);
        result
    }

    /// Merge through the engine, recording the outcome
    pub fn merge(&self, key: &EntityKey, detached: &FieldMap) -> Result<CommitOutcome> {
        let result = self.engine.merge(key, detached);
        self.record(key, None, &result);
        result
    }

    /// Reattach through the engine, recording the outcome
    pub fn reattach(
        &self,
        key: &EntityKey,
        original: EntitySnapshot,
        detached: &FieldMap,
    ) -> Result<CommitOutcome> {
        let result = self.engine.reattach(key, original, detached);
        self.record(key, None, &result);
        result
    }

    fn record(&self, key: &EntityKey, written: Option<&FieldMap>, result: &Result<CommitOutcome>) {
        match result {
            Ok(CommitOutcome::NoOp) => {
                self.total_noop.fetch_add(1, Ordering::Relaxed);
            }
            Ok(CommitOutcome::Applied { fields }) => {
                self.total_committed.fetch_add(1, Ordering::Relaxed);
                if self.show_writes {
                    match written {
                        Some(values) => {
                            info!(target: "versionless::write", %key, ?values, "update")
                        }
                        None => info!(target: "versionless::write", %key, ?fields, "update"),
                    }
                }
            }
            Err(Error::ConcurrentModification { .. }) => {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.total_failed.fetch_add(1, Ordering::Relaxed);
                warn!(target: "versionless::txn", %key, error = %e, "Commit failed");
            }
        }
    }

    /// Get commit metrics
    ///
    /// Returns current snapshot of commit statistics.
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            total_loads: self.total_loads.load(Ordering::Relaxed),
            total_committed: self.total_committed.load(Ordering::Relaxed),
            total_noop: self.total_noop.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Commit metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMetrics {
    /// Rows loaded for modification
    pub total_loads: u64,
    /// Commits that wrote at least one field
    pub total_committed: u64,
    /// Commits with an empty mutation set
    pub total_noop: u64,
    /// Commits rejected with `ConcurrentModification`
    pub total_rejected: u64,
    /// Commits that failed for any other reason
    pub total_failed: u64,
}

impl TransactionMetrics {
    /// Total commits attempted
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_noop + self.total_rejected + self.total_failed
    }

    /// Rejection rate (rejected / attempted)
    pub fn rejection_rate(&self) -> f64 {
        let completed = self.total_completed();
        if completed > 0 {
            self.total_rejected as f64 / completed as f64
        } else {
            0.0
        }
    }
}
