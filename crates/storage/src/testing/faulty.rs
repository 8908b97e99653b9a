//! Fault injection around a row store

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use versionless_core::{EntityKey, Error, FieldMap, Result, RowStore};

/// Store operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `read_row`
    Read,
    /// `compare_and_write_row`
    CompareAndWrite,
    /// `insert_row`
    Insert,
    /// `delete_row`
    Delete,
}

type Interleave<S> = Box<dyn FnOnce(&S) + Send>;

/// Row store wrapper that injects failures and interleaved writes
///
/// Each armed fault fires once, on the next call of that operation, with an
/// `Error::Storage` naming the operation. Calls are counted per operation.
pub struct FaultyRowStore<S> {
    inner: S,
    armed: Mutex<HashSet<Fault>>,
    before_cas: Mutex<Option<Interleave<S>>>,
    reads: AtomicUsize,
    cas_calls: AtomicUsize,
}

impl<S: RowStore> FaultyRowStore<S> {
    /// Wrap a store with no faults armed
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            armed: Mutex::new(HashSet::new()),
            before_cas: Mutex::new(None),
            reads: AtomicUsize::new(0),
            cas_calls: AtomicUsize::new(0),
        }
    }

    /// Wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Make the next call of `fault`'s operation fail
    pub fn fail_next(&self, fault: Fault) {
        self.armed.lock().insert(fault);
    }

    /// Run `f` against the wrapped store right before the next compare-and-write
    ///
    /// Simulates another transaction committing between the engine's
    /// validation read and its atomic write.
    pub fn interleave_before_next_write<F>(&self, f: F)
    where
        F: FnOnce(&S) + Send + 'static,
    {
        *self.before_cas.lock() = Some(Box::new(f));
    }

    /// Number of `read_row` calls seen
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `compare_and_write_row` calls seen
    pub fn compare_and_write_calls(&self) -> usize {
        self.cas_calls.load(Ordering::SeqCst)
    }

    fn trip(&self, fault: Fault) -> Result<()> {
        if self.armed.lock().remove(&fault) {
            Err(Error::storage(format!("injected {:?} failure", fault)))
        } else {
            Ok(())
        }
    }
}

impl<S: RowStore> RowStore for FaultyRowStore<S> {
    fn read_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.trip(Fault::Read)?;
        self.inner.read_row(key)
    }

    fn compare_and_write_row(
        &self,
        key: &EntityKey,
        expected: &FieldMap,
        new_fields: &FieldMap,
    ) -> Result<bool> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);
        self.trip(Fault::CompareAndWrite)?;
        let interleave = self.before_cas.lock().take();
        if let Some(f) = interleave {
            f(&self.inner);
        }
        self.inner.compare_and_write_row(key, expected, new_fields)
    }

    fn insert_row(&self, key: &EntityKey, row: FieldMap) -> Result<bool> {
        self.trip(Fault::Insert)?;
        self.inner.insert_row(key, row)
    }

    fn delete_row(&self, key: &EntityKey) -> Result<Option<FieldMap>> {
        self.trip(Fault::Delete)?;
        self.inner.delete_row(key)
    }
}
