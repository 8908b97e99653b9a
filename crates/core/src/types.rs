//! Core types for entity rows
//!
//! This module defines the foundational types:
//! - EntityKey: primary key of a stored row (entity name + numeric id)
//! - FieldMap: the field values of one row, ordered by field name
//! - FieldConflict: one field whose stored value moved away from a snapshot

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field values of a row, keyed by field name
///
/// Ordered so that logs, conflict reports and diffs are deterministic.
pub type FieldMap = BTreeMap<String, Value>;

/// Primary key of a stored row
///
/// Rows are partitioned by entity name (`"Product"`) and identified within the
/// entity by a numeric id. Displayed as `Product#1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    /// Entity (table) name
    pub entity: String,
    /// Identifier within the entity
    pub id: i64,
}

impl EntityKey {
    /// Create a new key
    pub fn new(entity: impl Into<String>, id: i64) -> Self {
        Self {
            entity: entity.into(),
            id,
        }
    }

    /// Entity name of this key
    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.id)
    }
}

/// A dirty field whose stored value no longer matches the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    /// Field name
    pub field: String,
    /// Value recorded in the snapshot at load time
    pub expected: Value,
    /// Value currently stored (`None` if the row or field is gone)
    pub current: Option<Value>,
}

impl fmt::Display for FieldConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.current {
            Some(current) => write!(
                f,
                "{}: expected {}, found {}",
                self.field, self.expected, current
            ),
            None => write!(f, "{}: expected {}, found nothing", self.field, self.expected),
        }
    }
}

/// Build a [`FieldMap`] from `(name, value)` pairs
///
/// ```
/// use versionless_core::{field_map, Value};
///
/// let row = field_map([("name", Value::from("TV")), ("quantity", Value::Int(7))]);
/// assert_eq!(row.len(), 2);
/// ```
pub fn field_map<K, V, I>(pairs: I) -> FieldMap
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
