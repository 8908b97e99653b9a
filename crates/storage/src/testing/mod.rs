//! Testing utilities for the storage contract
//!
//! - **FaultyRowStore**: wraps any [`RowStore`](versionless_core::RowStore) and
//!   injects storage failures or a concurrent write just before the next
//!   compare-and-write. Used to check that storage errors reach callers
//!   unchanged and that lost races are reported as conflicts.
//!
//! # Example
//!
//! ```
//! use versionless_storage::testing::{Fault, FaultyRowStore};
//! use versionless_storage::ShardedRowStore;
//! use versionless_core::{EntityKey, RowStore};
//!
//! let store = FaultyRowStore::new(ShardedRowStore::new());
//! store.fail_next(Fault::Read);
//! assert!(store.read_row(&EntityKey::new("Product", 1)).is_err());
//! ```

mod faulty;

pub use faulty::{Fault, FaultyRowStore};
