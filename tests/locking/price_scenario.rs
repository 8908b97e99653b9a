//! Two sessions race to change the price of the same product
//!
//! Both load `{price: 199.99}`. A commits 21.22 first and wins; B's later
//! commit of 1.00 is rejected and the stored price stays 21.22.

use crate::common::*;
use versionless::RecordStatus;

#[test]
fn first_committer_wins_second_is_rejected() {
    let db = product_db();

    let (mut a, snap_a) = db.load(&product_key()).unwrap();
    let (mut b, snap_b) = db.load(&product_key()).unwrap();

    a.set("price", 21.22).unwrap();
    let outcome = db.commit_record(&mut a, snap_a).unwrap();
    assert_eq!(outcome.written_fields(), ["price".to_string()]);
    assert_eq!(a.status(), &RecordStatus::Committed);

    b.set("price", 1.00).unwrap();
    let err = db.commit_record(&mut b, snap_b).unwrap_err();
    assert!(err.is_conflict());
    assert!(b.is_rejected());
    assert!(b.rejection_reason().unwrap().contains("Product#1"));

    assert_eq!(stored(&db, "price"), Value::Float(21.22));
}

#[test]
fn conflict_describes_expected_and_current_values() {
    let db = product_db();

    let (_, snap_a) = db.load(&product_key()).unwrap();
    let (_, snap_b) = db.load(&product_key()).unwrap();

    db.commit(&product_key(), snap_a, &MutationSet::new().with("price", 21.22))
        .unwrap();

    match db.commit(&product_key(), snap_b, &MutationSet::new().with("price", 1.00)) {
        Err(Error::ConcurrentModification { key, conflicts }) => {
            assert_eq!(key, product_key());
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].field, "price");
            assert_eq!(conflicts[0].expected, Value::Float(199.99));
            assert_eq!(conflicts[0].current, Some(Value::Float(21.22)));
        }
        other => panic!("expected ConcurrentModification, got {:?}", other),
    }
}

#[test]
fn rejected_commit_writes_none_of_its_fields() {
    let db = product_db();

    let (mut a, snap_a) = db.load(&product_key()).unwrap();
    let (mut b, snap_b) = db.load(&product_key()).unwrap();

    a.set("price", 21.22).unwrap();
    db.commit_record(&mut a, snap_a).unwrap();

    b.set("price", 1.00).unwrap();
    b.set("name", "Television").unwrap();
    b.set("likes", 3i64).unwrap();
    db.commit_record(&mut b, snap_b).unwrap_err();

    assert_eq!(stored(&db, "name"), Value::from("TV"));
    assert_eq!(stored(&db, "likes"), Value::Int(0));
}

#[test]
fn reload_after_rejection_succeeds() {
    let db = product_db();

    let (mut a, snap_a) = db.load(&product_key()).unwrap();
    let (mut b, snap_b) = db.load(&product_key()).unwrap();

    a.set("price", 21.22).unwrap();
    db.commit_record(&mut a, snap_a).unwrap();
    b.set("price", 1.00).unwrap();
    db.commit_record(&mut b, snap_b).unwrap_err();

    let (mut again, snap) = db.load(&product_key()).unwrap();
    assert_eq!(again.get("price"), Some(&Value::Float(21.22)));
    again.set("price", 1.00).unwrap();
    db.commit_record(&mut again, snap).unwrap();

    assert_eq!(stored(&db, "price"), Value::Float(1.00));

    let metrics = db.metrics();
    assert_eq!(metrics.total_committed, 2);
    assert_eq!(metrics.total_rejected, 1);
}

#[test]
fn same_value_as_winner_is_still_rejected() {
    let db = product_db();

    let (_, snap_a) = db.load(&product_key()).unwrap();
    let (_, snap_b) = db.load(&product_key()).unwrap();

    db.commit(&product_key(), snap_a, &MutationSet::new().with("price", 21.22))
        .unwrap();
    let err = db
        .commit(&product_key(), snap_b, &MutationSet::new().with("price", 21.22))
        .unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn deleted_row_rejects_pending_commit() {
    let db = product_db();

    let (mut record, snapshot) = db.load(&product_key()).unwrap();
    assert!(db.delete(&product_key()).unwrap());

    record.set("price", 1.00).unwrap();
    let err = db.commit_record(&mut record, snapshot).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.conflicts().unwrap()[0].current, None);
    assert!(db.get_row(&product_key()).unwrap().is_none());
}
