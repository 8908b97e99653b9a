//! Mutation sets
//!
//! A mutation set is the list of fields a commit intends to change, with their
//! new values. It is either built explicitly by the caller or computed by
//! [`MutationSet::diff`], which compares two field maps field by field. No
//! reflection or change interception is involved: a field is dirty because a
//! diff says so, or because the caller listed it.

use versionless_core::{FieldMap, Value};

/// Fields to write, with their new values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationSet {
    fields: FieldMap,
}

impl MutationSet {
    /// Create an empty mutation set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new value for `field`
    ///
    /// A later `set` of the same field replaces the earlier value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Fields of `proposed` whose value differs from `baseline`
    ///
    /// Fields absent from `proposed` are treated as unchanged. Fields present
    /// in `proposed` but absent from `baseline` are included; committing them
    /// against a snapshot that lacks them is rejected.
    pub fn diff(baseline: &FieldMap, proposed: &FieldMap) -> Self {
        let fields = proposed
            .iter()
            .filter(|(field, value)| baseline.get(*field) != Some(*value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        Self { fields }
    }

    /// True if nothing would be written
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of dirty fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// New value for `field`, if it is part of this set
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// True if `field` is part of this set
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Names of the dirty fields, in order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Iterate over `(field, new value)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// The new values as a field map
    pub fn as_field_map(&self) -> &FieldMap {
        &self.fields
    }

    /// Consume the set, returning the new values
    pub fn into_field_map(self) -> FieldMap {
        self.fields
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MutationSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<FieldMap> for MutationSet {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}
