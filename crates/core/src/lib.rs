//! Core types and traits for versionless
//!
//! This crate defines the foundational types used throughout the system:
//! - Value / ValueKind: field values and declared field types
//! - EntityKey / FieldMap: row identity and row contents
//! - EntitySchema: explicit per-entity field lists
//! - Error: error type hierarchy
//! - RowStore: the storage contract consumed by the locking engine

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use schema::{EntitySchema, FieldDef};
pub use traits::RowStore;
pub use types::{field_map, EntityKey, FieldConflict, FieldMap};
pub use value::{Value, ValueKind};
