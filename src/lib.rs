//! Versionless - dirty-field optimistic locking for entity rows
//!
//! Rows carry no version column. A commit compares the load-time values of
//! only the fields it writes against the stored row, and is rejected with
//! [`Error::ConcurrentModification`] if any of them changed in the meantime.
//! Concurrent commits that touch disjoint fields of the same row both succeed.
//!
//! # Quick Start
//!
//! ```ignore
//! use versionless::{field_map, Database, EntityKey, Value};
//!
//! let db = Database::in_memory();
//! let key = EntityKey::new("Product", 1);
//! db.persist(&key, field_map([("name", Value::from("TV")), ("price", Value::Float(199.99))]))?;
//!
//! let (mut record, snapshot) = db.load(&key)?;
//! record.set("price", 21.22)?;
//! db.commit_record(&mut record, snapshot)?;
//! ```
//!
//! # Architecture
//!
//! - `versionless-core`: values, keys, schemas, errors, the `RowStore` contract
//! - `versionless-storage`: sharded in-memory row store with atomic compare-and-write
//! - `versionless-concurrency`: snapshots, records, mutation sets, the locking engine
//! - `versionless-engine`: the `Database` facade, configuration, retry helper, metrics

pub use versionless_concurrency::{
    CommitOutcome, EntityRecord, EntitySnapshot, LockingEngine, MutationSet, RecordStatus,
};
pub use versionless_core::{
    field_map, EntityKey, EntitySchema, Error, FieldConflict, FieldDef, FieldMap, Result,
    RowStore, Value, ValueKind,
};
pub use versionless_engine::{
    Database, EngineConfig, RetryConfig, SchemaValidation, TransactionMetrics, CONFIG_FILE_NAME,
};
pub use versionless_storage::ShardedRowStore;

/// Fault-injecting store wrappers for tests
pub mod testing {
    pub use versionless_storage::testing::{Fault, FaultyRowStore};
}
