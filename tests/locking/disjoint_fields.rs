//! Concurrent commits from independent threads
//!
//! Commits on disjoint fields of the same row never conflict. Commits on the
//! same field from the same baseline have exactly one winner.

use crate::common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn disjoint_fields_all_commit() {
    let db = Arc::new(product_db());
    let fields = [
        ("name", Value::from("Television")),
        ("description", Value::from("OLED TV")),
        ("price", Value::Float(21.22)),
        ("quantity", Value::Int(6)),
        ("likes", Value::Int(1)),
    ];
    let barrier = Arc::new(Barrier::new(fields.len()));

    let handles: Vec<_> = fields
        .iter()
        .cloned()
        .map(|(field, value)| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let (mut record, snapshot) = db.load(&product_key()).unwrap();
                record.set(field, value).unwrap();
                barrier.wait();
                db.commit_record(&mut record, snapshot)
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    for (field, value) in &fields {
        assert_eq!(&stored(&db, field), value);
    }
    assert_eq!(db.metrics().total_rejected, 0);
}

#[test]
fn same_field_has_exactly_one_winner() {
    const THREADS: usize = 8;

    let db = Arc::new(product_db());
    let barrier = Arc::new(Barrier::new(THREADS));
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            let wins = Arc::clone(&wins);
            thread::spawn(move || {
                let (mut record, snapshot) = db.load(&product_key()).unwrap();
                record.set("quantity", i as i64 + 100).unwrap();
                barrier.wait();
                match db.commit_record(&mut record, snapshot) {
                    Ok(_) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                        Some(i as i64 + 100)
                    }
                    Err(e) => {
                        assert!(e.is_conflict(), "unexpected error: {}", e);
                        None
                    }
                }
            })
        })
        .collect();

    let winners: Vec<i64> = handles
        .into_iter()
        .filter_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert_eq!(winners.len(), 1);
    assert_eq!(stored(&db, "quantity"), Value::Int(winners[0]));

    let metrics = db.metrics();
    assert_eq!(metrics.total_committed, 1);
    assert_eq!(metrics.total_rejected, (THREADS - 1) as u64);
}

#[test]
fn overlapping_sets_reject_as_a_whole() {
    const ROUNDS: usize = 50;

    for _ in 0..ROUNDS {
        let db = Arc::new(product_db());
        let barrier = Arc::new(Barrier::new(2));

        // Both write `likes`; each also writes a field of its own.
        let spawn = |own: &'static str, value: Value| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let (mut record, snapshot) = db.load(&product_key()).unwrap();
                record.set("likes", 5i64).unwrap();
                record.set(own, value).unwrap();
                barrier.wait();
                db.commit_record(&mut record, snapshot).is_ok()
            })
        };
        let a = spawn("price", Value::Float(21.22));
        let b = spawn("quantity", Value::Int(6));
        let (a_won, b_won) = (a.join().unwrap(), b.join().unwrap());

        assert!(a_won ^ b_won);
        assert_eq!(stored(&db, "likes"), Value::Int(5));
        let price_written = stored(&db, "price") == Value::Float(21.22);
        let quantity_written = stored(&db, "quantity") == Value::Int(6);
        assert_eq!(price_written, a_won);
        assert_eq!(quantity_written, b_won);
    }
}

#[test]
fn databases_sharing_a_store_see_each_others_commits() {
    use versionless::{EngineConfig, ShardedRowStore};

    let store = Arc::new(ShardedRowStore::new());
    let first = Database::with_store(Arc::clone(&store), EngineConfig::default()).unwrap();
    let second = Database::with_store(Arc::clone(&store), EngineConfig::default()).unwrap();
    first.persist(&product_key(), tv()).unwrap();

    let (mut a, snap_a) = first.load(&product_key()).unwrap();
    let (mut b, snap_b) = second.load(&product_key()).unwrap();

    a.set("price", 21.22).unwrap();
    first.commit_record(&mut a, snap_a).unwrap();

    b.set("price", 1.00).unwrap();
    assert!(second.commit_record(&mut b, snap_b).unwrap_err().is_conflict());
    assert_eq!(store.write_count(), 2);
}
