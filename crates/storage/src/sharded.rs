//! Sharded in-memory row storage
//!
//! Rows live in a DashMap keyed by [`EntityKey`].
//!
//! # Design
//!
//! - DashMap: 16-way sharded by default, concurrent reads
//! - Compare-and-write takes the row's shard write guard via `get_mut`, checks
//!   the expected fields and applies the new fields before releasing it. That
//!   guard is the only critical section; it is never held across calls.
//! - A monotonically increasing write counter records how many row mutations
//!   were applied. It is diagnostic only; conflict detection never uses it.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;
use versionless_core::{EntityKey, FieldMap, Result, RowStore};

/// Row as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    /// Current field values
    pub fields: FieldMap,
    /// Value of the store's write counter when this row was last written
    pub last_write: u64,
}

/// In-memory [`RowStore`] backed by a sharded concurrent map
pub struct ShardedRowStore {
    rows: DashMap<EntityKey, StoredRow>,
    /// Number of row mutations applied (inserts, updates, deletes)
    writes: AtomicU64,
}

impl ShardedRowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            writes: AtomicU64::new(0),
        }
    }

    fn next_write(&self) -> u64 {
        self.writes.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Total row mutations applied so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full stored row, including write bookkeeping
    pub fn stored_row(&self, key: &EntityKey) -> Option<StoredRow> {
        self.rows.get(key).map(|r| r.value().clone())
    }
}

impl Default for ShardedRowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedRowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedRowStore")
            .field("rows", &self.rows.len())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl RowStore for ShardedRowStore {
    fn read_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        Ok(self.rows.get(key).map(|r| r.value().fields.clone()))
    }

    fn compare_and_write_row(
        &self,
        key: &EntityKey,
        expected: &FieldMap,
        new_fields: &FieldMap,
    ) -> Result<bool> {
        // Shard write guard held from here to the end of the block
        let Some(mut row) = self.rows.get_mut(key) else {
            trace!(target: "versionless::storage", %key, "compare-and-write on missing row");
            return Ok(false);
        };

        let matches = expected
            .iter()
            .all(|(field, value)| row.fields.get(field) == Some(value));
        if !matches {
            trace!(target: "versionless::storage", %key, "compare-and-write mismatch");
            return Ok(false);
        }

        for (field, value) in new_fields {
            row.fields.insert(field.clone(), value.clone());
        }
        row.last_write = self.next_write();
        Ok(true)
    }

    fn insert_row(&self, key: &EntityKey, row: FieldMap) -> Result<bool> {
        use dashmap::mapref::entry::Entry;

        match self.rows.entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let last_write = self.next_write();
                slot.insert(StoredRow {
                    fields: row,
                    last_write,
                });
                Ok(true)
            }
        }
    }

    fn delete_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        let removed = self.rows.remove(key).map(|(_, row)| row.fields);
        if removed.is_some() {
            self.next_write();
        }
        Ok(removed)
    }
}
