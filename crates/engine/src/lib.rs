//! Database engine for versionless
//!
//! This crate orchestrates the lower layers:
//! - Database: entity operations, schema registry, transaction helpers
//! - Commit coordination and metrics
//! - Configuration (`versionless.toml`)
//!
//! The engine is the only component that knows about:
//! - Schemas and when to enforce them
//! - Caller-side retry policy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod database;

pub use coordinator::{CommitCoordinator, TransactionMetrics};
pub use database::{Database, EngineConfig, RetryConfig, SchemaValidation, CONFIG_FILE_NAME};
