//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::Once;
pub use versionless::{
    field_map, Database, EntityKey, EntitySchema, Error, FieldMap, MutationSet, Value, ValueKind,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs through the test harness's captured output.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Product fixture
// ============================================================================

/// Key of the product row used throughout the suites.
pub fn product_key() -> EntityKey {
    EntityKey::new("Product", 1)
}

/// Schema of the `Product` entity.
pub fn product_schema() -> EntitySchema {
    EntitySchema::new("Product")
        .field("name", ValueKind::String)
        .nullable_field("description", ValueKind::String)
        .field("price", ValueKind::Float)
        .field("quantity", ValueKind::Int)
        .field("likes", ValueKind::Int)
}

/// The TV product as first persisted.
pub fn tv() -> FieldMap {
    field_map([
        ("name", Value::from("TV")),
        ("description", Value::from("Plasma TV")),
        ("price", Value::Float(199.99)),
        ("quantity", Value::Int(7)),
        ("likes", Value::Int(0)),
    ])
}

/// In-memory database holding the TV product.
pub fn product_db() -> Database {
    init_tracing();
    let db = Database::in_memory();
    db.register_schema(product_schema());
    db.persist(&product_key(), tv()).unwrap();
    db
}

/// Current value of `field` in the product row.
pub fn stored(db: &Database, field: &str) -> Value {
    db.get_row(&product_key())
        .unwrap()
        .expect("product row exists")
        .get(field)
        .cloned()
        .expect("field exists")
}
