//! Storage layer for versionless
//!
//! This crate implements the row storage backend consumed by the locking
//! engine:
//! - ShardedRowStore: DashMap-backed rows with atomic per-row compare-and-write
//! - testing: fault injection for exercising the engine's error paths

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;
pub mod testing;

pub use sharded::{ShardedRowStore, StoredRow};
