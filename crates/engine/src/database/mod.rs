//! Database struct and entity operations
//!
//! This module provides the main Database struct that combines:
//! - A row store behind the locking engine
//! - A registry of entity schemas
//! - Commit metrics
//!
//! ## Transaction API
//!
//! The Database provides two ways to modify a row:
//!
//! 1. **Closure API** (recommended): `db.transaction(&key, |record| { ... })`
//!    - Load, run the closure, commit the record's dirty fields
//!    - A closure error aborts without writing
//!
//! 2. **Manual API**: `load()` + `commit_record()` (or `commit()` with an
//!    explicit `MutationSet`)
//!    - For cases requiring external control over commit timing
//!
//! Neither form retries. `transaction_with_retry()` re-runs the whole
//! load-mutate-commit cycle on `ConcurrentModification` only.

pub mod config;
mod retry;

pub use config::{EngineConfig, SchemaValidation, CONFIG_FILE_NAME};
pub use retry::RetryConfig;

use crate::coordinator::{CommitCoordinator, TransactionMetrics};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};
use versionless_concurrency::{CommitOutcome, EntityRecord, EntitySnapshot, MutationSet};
use versionless_core::{EntityKey, EntitySchema, FieldMap, Result, RowStore};
use versionless_storage::ShardedRowStore;

/// Entity database with dirty-field optimistic locking
///
/// # Thread Safety
///
/// `Database` is `Send + Sync` when its store is. Share it behind an `Arc`;
/// all operations take `&self`.
///
/// # Example
///
/// ```ignore
/// use versionless_engine::Database;
///
/// let db = Database::in_memory();
/// db.register_schema(product_schema());
/// db.persist(&key, field_map([("name", "TV"), ("price", 199.99)]))?;
///
/// db.transaction(&key, |record| record.set("price", 21.22))?;
/// ```
pub struct Database<S = ShardedRowStore> {
    coordinator: CommitCoordinator<S>,
    schemas: RwLock<HashMap<String, EntitySchema>>,
    validation: SchemaValidation,
    config: EngineConfig,
}

impl Database<ShardedRowStore> {
    /// Open an in-memory database with the given configuration
    ///
    /// # Errors
    /// `Error::Config` if the configuration is invalid.
    pub fn open(config: EngineConfig) -> Result<Self> {
        Self::with_store(ShardedRowStore::new(), config)
    }

    /// Open an in-memory database configured from a `versionless.toml` file
    pub fn open_with_config_file(path: &Path) -> Result<Self> {
        Self::open(EngineConfig::from_file(path)?)
    }

    /// In-memory database with default configuration
    pub fn in_memory() -> Self {
        Self::from_parts(
            ShardedRowStore::new(),
            EngineConfig::default(),
            SchemaValidation::Strict,
        )
    }
}

impl<S: RowStore> Database<S> {
    /// Open a database over an arbitrary row store
    ///
    /// # Errors
    /// `Error::Config` if the configuration is invalid.
    pub fn with_store(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let validation = config.schema_validation_mode()?;
        Ok(Self::from_parts(store, config, validation))
    }

    fn from_parts(store: S, config: EngineConfig, validation: SchemaValidation) -> Self {
        info!(
            target: "versionless::db",
            show_writes = config.show_writes,
            schema_validation = %config.schema_validation,
            "Database opened"
        );
        Self {
            coordinator: CommitCoordinator::new(store, config.show_writes),
            schemas: RwLock::new(HashMap::new()),
            validation,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying row store
    pub fn store(&self) -> &S {
        self.coordinator.engine().store()
    }

    // ========================================================================
    // Schemas
    // ========================================================================

    /// Register the schema of an entity, replacing any earlier one
    ///
    /// Returns the replaced schema, if any.
    pub fn register_schema(&self, schema: EntitySchema) -> Option<EntitySchema> {
        let name = schema.name().to_string();
        debug!(target: "versionless::db", entity = %name, fields = schema.fields().len(), "Schema registered");
        self.schemas.write().insert(name, schema)
    }

    /// Registered schema of `entity`
    pub fn schema(&self, entity: &str) -> Option<EntitySchema> {
        self.schemas.read().get(entity).cloned()
    }

    fn check_mutation(&self, key: &EntityKey, fields: &FieldMap) -> Result<()> {
        if self.validation == SchemaValidation::Off {
            return Ok(());
        }
        match self.schemas.read().get(key.entity()) {
            Some(schema) => schema.validate_mutation(fields),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Entity operations
    // ========================================================================

    /// Create a row
    ///
    /// If the entity has a registered schema, omitted fields are filled with
    /// their defaults and, under strict validation, the full row is checked
    /// before anything is written.
    ///
    /// # Errors
    /// - `SchemaViolation` if the row does not fit the schema
    /// - `AlreadyExists` if the key is taken
    pub fn persist(&self, key: &EntityKey, row: FieldMap) -> Result<()> {
        let row = match self.schemas.read().get(key.entity()) {
            Some(schema) => {
                let mut full = schema.default_row();
                full.extend(row);
                if self.validation == SchemaValidation::Strict {
                    schema.validate_row(&full)?;
                }
                full
            }
            None => row,
        };
        self.coordinator.engine().insert(key, row.clone())?;
        if self.config.show_writes {
            info!(target: "versionless::write", %key, values = ?row, "insert");
        }
        Ok(())
    }

    /// Load a row for modification
    ///
    /// See `LockingEngine::load`.
    pub fn load(&self, key: &EntityKey) -> Result<(EntityRecord, EntitySnapshot)> {
        self.coordinator.load(key)
    }

    /// Current contents of a row, without a snapshot
    pub fn get_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        self.coordinator.engine().get_row(key)
    }

    /// Commit an explicit mutation set against a load-time snapshot
    ///
    /// # Errors
    /// `SchemaViolation` before any storage access, then everything
    /// `LockingEngine::commit` can return.
    pub fn commit(
        &self,
        key: &EntityKey,
        snapshot: EntitySnapshot,
        mutations: &MutationSet,
    ) -> Result<CommitOutcome> {
        self.check_mutation(key, mutations.as_field_map())?;
        self.coordinator.commit(key, snapshot, mutations)
    }

    /// Check a record's dirty fields against its entity schema
    ///
    /// Takes no snapshot, so a record that fails here can be corrected and
    /// committed afterwards.
    pub fn validate_record(&self, record: &EntityRecord) -> Result<()> {
        self.check_mutation(record.key(), record.mutation_set().as_field_map())
    }

    /// Commit a record's dirty fields
    ///
    /// Every failure, a schema violation included, consumes the snapshot and
    /// moves the record to `Rejected`. Call
    /// [`validate_record`](Self::validate_record) first to catch schema
    /// violations while the record is still open.
    pub fn commit_record(
        &self,
        record: &mut EntityRecord,
        snapshot: EntitySnapshot,
    ) -> Result<CommitOutcome> {
        let key = record.key().clone();
        self.coordinator.commit_record(record, snapshot, |mutations| {
            self.check_mutation(&key, mutations.as_field_map())
        })
    }

    /// Write back a detached state, diffing it against the current row
    ///
    /// See `LockingEngine::merge`: concurrent changes made since the detached
    /// state was loaded are not detected.
    pub fn merge(&self, key: &EntityKey, detached: &FieldMap) -> Result<CommitOutcome> {
        self.check_mutation(key, detached)?;
        self.coordinator.merge(key, detached)
    }

    /// Write back a detached state against its original snapshot
    ///
    /// See `LockingEngine::reattach`.
    pub fn reattach(
        &self,
        key: &EntityKey,
        original: EntitySnapshot,
        detached: &FieldMap,
    ) -> Result<CommitOutcome> {
        self.check_mutation(key, detached)?;
        self.coordinator.reattach(key, original, detached)
    }

    /// Remove a row, returning whether it existed
    pub fn delete(&self, key: &EntityKey) -> Result<bool> {
        let existed = self.coordinator.engine().delete(key)?;
        if existed && self.config.show_writes {
            info!(target: "versionless::write", %key, "delete");
        }
        Ok(existed)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Load `key`, run `f` on the record, commit its dirty fields
    ///
    /// If `f` returns an error nothing is written and the error is returned.
    /// A `ConcurrentModification` is returned as is; see
    /// [`transaction_with_retry`](Self::transaction_with_retry).
    pub fn transaction<F, T>(&self, key: &EntityKey, f: F) -> Result<T>
    where
        F: FnOnce(&mut EntityRecord) -> Result<T>,
    {
        let (mut record, snapshot) = self.load(key)?;
        let value = f(&mut record)?;
        self.commit_record(&mut record, snapshot)?;
        Ok(value)
    }

    /// Like [`transaction`](Self::transaction), re-running the whole cycle
    /// from a fresh load when the commit is rejected
    ///
    /// Only `ConcurrentModification` is retried, at most
    /// `config.max_retries` times with exponential backoff. Every other error
    /// is returned immediately. The closure may run more than once.
    ///
    /// # Errors
    /// `Error::Config` before the first attempt if `config` is invalid.
    pub fn transaction_with_retry<F, T>(
        &self,
        key: &EntityKey,
        config: RetryConfig,
        f: F,
    ) -> Result<T>
    where
        F: Fn(&mut EntityRecord) -> Result<T>,
    {
        config.validate()?;
        let mut rejected = 0u32;
        loop {
            match self.transaction(key, &f) {
                Err(e) if e.is_conflict() => {
                    rejected += 1;
                    if !config.allows_retry(rejected) {
                        warn!(target: "versionless::txn", %key, attempts = rejected, "Retries exhausted");
                        return Err(e);
                    }
                    debug!(target: "versionless::txn", %key, rejected, "Retrying after conflict");
                    std::thread::sleep(config.backoff(rejected));
                }
                other => return other,
            }
        }
    }

    /// Retry settings from the configuration
    pub fn retry_config(&self) -> RetryConfig {
        self.config.retry.clone()
    }

    /// Commit metrics
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }
}
