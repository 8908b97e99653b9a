//! Detached entities written back with merge and reattach
//!
//! A caller holds the TV product outside any load/commit cycle while another
//! session changes its price. `merge` diffs against the row as it is now and
//! overwrites; `reattach` diffs against the original snapshot and is rejected.

use crate::common::*;
use versionless::EntitySnapshot;

fn concurrent_price_change(db: &Database) {
    db.transaction(&product_key(), |record| record.set("price", 21.22))
        .unwrap();
}

#[test]
fn merge_of_stale_state_overwrites() {
    let db = product_db();
    let (_, original) = db.load(&product_key()).unwrap();
    let mut detached = original.fields().clone();

    concurrent_price_change(&db);

    detached.insert("price".into(), Value::Float(1.00));
    let outcome = db.merge(&product_key(), &detached).unwrap();

    assert_eq!(outcome.written_fields(), ["price".to_string()]);
    assert_eq!(stored(&db, "price"), Value::Float(1.00));
}

#[test]
fn reattach_of_stale_state_is_rejected() {
    let db = product_db();
    let (_, original) = db.load(&product_key()).unwrap();
    let mut detached = original.fields().clone();

    concurrent_price_change(&db);

    detached.insert("price".into(), Value::Float(1.00));
    let err = db.reattach(&product_key(), original, &detached).unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(stored(&db, "price"), Value::Float(21.22));
}

#[test]
fn reattach_ignores_changes_to_other_fields() {
    let db = product_db();
    let (_, original) = db.load(&product_key()).unwrap();
    let mut detached = original.fields().clone();

    concurrent_price_change(&db);

    detached.insert("likes".into(), Value::Int(1));
    let outcome = db.reattach(&product_key(), original, &detached).unwrap();

    assert_eq!(outcome.written_fields(), ["likes".to_string()]);
    assert_eq!(stored(&db, "price"), Value::Float(21.22));
    assert_eq!(stored(&db, "likes"), Value::Int(1));
}

#[test]
fn reattach_with_hand_built_snapshot() {
    let db = product_db();
    let original = EntitySnapshot::new(product_key(), tv());
    let mut detached = tv();
    detached.insert("quantity".into(), Value::Int(6));

    db.reattach(&product_key(), original, &detached).unwrap();
    assert_eq!(stored(&db, "quantity"), Value::Int(6));
}

#[test]
fn merge_of_unchanged_state_is_noop() {
    let db = product_db();
    concurrent_price_change(&db);

    let current = db.get_row(&product_key()).unwrap().unwrap();
    assert!(db.merge(&product_key(), &current).unwrap().is_noop());
}

#[test]
fn merge_checks_schema() {
    let db = product_db();
    let mut detached = tv();
    detached.insert("price".into(), Value::from("free"));

    let err = db.merge(&product_key(), &detached).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { .. }));
    assert_eq!(stored(&db, "price"), Value::Float(199.99));
}

#[test]
fn merge_of_missing_row_is_not_found() {
    let db = product_db();
    db.delete(&product_key()).unwrap();
    assert!(db.merge(&product_key(), &tv()).unwrap_err().is_not_found());
}
