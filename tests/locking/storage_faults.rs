//! Storage failures surface unchanged and leave the row untouched

use crate::common::*;
use versionless::testing::{Fault, FaultyRowStore};
use versionless::{EngineConfig, ShardedRowStore};

fn faulty_db() -> Database<FaultyRowStore<ShardedRowStore>> {
    init_tracing();
    let db = Database::with_store(
        FaultyRowStore::new(ShardedRowStore::new()),
        EngineConfig::default(),
    )
    .unwrap();
    db.register_schema(product_schema());
    db.persist(&product_key(), tv()).unwrap();
    db
}

fn stored_price(db: &Database<FaultyRowStore<ShardedRowStore>>) -> Value {
    db.get_row(&product_key()).unwrap().unwrap()["price"].clone()
}

#[test]
fn read_failure_on_load() {
    let db = faulty_db();
    db.store().fail_next(Fault::Read);

    let err = db.load(&product_key()).unwrap_err();
    assert!(matches!(err, Error::Storage { .. }));
    assert!(!err.is_conflict());
    assert_eq!(db.metrics().total_loads, 0);
}

#[test]
fn read_failure_during_validation() {
    let db = faulty_db();
    let (mut record, snapshot) = db.load(&product_key()).unwrap();
    record.set("price", 21.22).unwrap();

    db.store().fail_next(Fault::Read);
    let err = db.commit_record(&mut record, snapshot).unwrap_err();

    assert!(matches!(err, Error::Storage { .. }));
    assert!(record.is_rejected());
    assert_eq!(stored_price(&db), Value::Float(199.99));
}

#[test]
fn write_failure_is_not_a_conflict() {
    let db = faulty_db();
    let (_, snapshot) = db.load(&product_key()).unwrap();

    db.store().fail_next(Fault::CompareAndWrite);
    let err = db
        .commit(&product_key(), snapshot, &MutationSet::new().with("price", 21.22))
        .unwrap_err();

    match err {
        Error::Storage { message } => assert!(message.contains("CompareAndWrite")),
        other => panic!("expected storage error, got {:?}", other),
    }
    assert_eq!(stored_price(&db), Value::Float(199.99));

    let metrics = db.metrics();
    assert_eq!(metrics.total_failed, 1);
    assert_eq!(metrics.total_rejected, 0);
}

#[test]
fn retry_helper_does_not_retry_storage_errors() {
    let db = faulty_db();
    db.store().fail_next(Fault::CompareAndWrite);

    let err = db
        .transaction_with_retry(&product_key(), db.retry_config(), |record| {
            record.set("likes", 1i64)
        })
        .unwrap_err();

    assert!(matches!(err, Error::Storage { .. }));
    assert_eq!(db.store().compare_and_write_calls(), 1);
}

#[test]
fn insert_and_delete_failures() {
    let db = faulty_db();

    db.store().fail_next(Fault::Insert);
    let err = db.persist(&EntityKey::new("Product", 2), tv()).unwrap_err();
    assert!(matches!(err, Error::Storage { .. }));

    db.store().fail_next(Fault::Delete);
    assert!(db.delete(&product_key()).is_err());
    assert!(db.get_row(&product_key()).unwrap().is_some());
}

#[test]
fn writer_slipping_in_before_the_write_is_detected() {
    let db = faulty_db();
    let (mut record, snapshot) = db.load(&product_key()).unwrap();
    record.set("price", 1.00).unwrap();

    db.store().interleave_before_next_write(|inner: &ShardedRowStore| {
        use versionless::RowStore;
        let expected = field_map([("price", Value::Float(199.99))]);
        let new_fields = field_map([("price", Value::Float(21.22))]);
        assert!(inner
            .compare_and_write_row(&product_key(), &expected, &new_fields)
            .unwrap());
    });

    let err = db.commit_record(&mut record, snapshot).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(stored_price(&db), Value::Float(21.22));
}
