//! Commit validation for dirty-field optimistic locking
//!
//! Key rules:
//! - Only fields in the mutation set are compared. A concurrent change to a
//!   field this commit does not write is not a conflict.
//! - The comparison baseline is the snapshot value, never the value another
//!   transaction wrote at its own commit.
//! - First committer wins: once a write lands, every commit still holding the
//!   old value of that field as its baseline fails.

use versionless_core::{EntityKey, FieldConflict, FieldMap, Result, RowStore, Value};

/// Ways a dirty field can fail validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictType {
    /// The stored value differs from the snapshot value
    FieldChanged {
        /// Field name
        field: String,
        /// Snapshot value
        expected: Value,
        /// Value currently stored
        current: Value,
    },

    /// The row exists but no longer has the field
    FieldMissing {
        /// Field name
        field: String,
        /// Snapshot value
        expected: Value,
    },

    /// The row was deleted after the snapshot was taken
    RowDeleted {
        /// Field name
        field: String,
        /// Snapshot value
        expected: Value,
    },
}

impl ConflictType {
    /// Field this conflict is about
    pub fn field(&self) -> &str {
        match self {
            ConflictType::FieldChanged { field, .. }
            | ConflictType::FieldMissing { field, .. }
            | ConflictType::RowDeleted { field, .. } => field,
        }
    }
}

impl From<ConflictType> for FieldConflict {
    fn from(conflict: ConflictType) -> Self {
        match conflict {
            ConflictType::FieldChanged {
                field,
                expected,
                current,
            } => FieldConflict {
                field,
                expected,
                current: Some(current),
            },
            ConflictType::FieldMissing { field, expected }
            | ConflictType::RowDeleted { field, expected } => FieldConflict {
                field,
                expected,
                current: None,
            },
        }
    }
}

/// Result of commit validation
///
/// Accumulates all conflicts found during validation.
/// A commit proceeds only if is_valid() returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Convert into the error-facing conflict list
    pub fn into_field_conflicts(self) -> Vec<FieldConflict> {
        self.conflicts.into_iter().map(FieldConflict::from).collect()
    }
}

/// Compare expected snapshot values against a current row
///
/// # Arguments
/// * `expected` - Snapshot values of the dirty fields
/// * `current` - Current stored row, `None` if it no longer exists
pub fn validate_fields(expected: &FieldMap, current: Option<&FieldMap>) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (field, expected_value) in expected {
        let conflict = match current {
            None => Some(ConflictType::RowDeleted {
                field: field.clone(),
                expected: expected_value.clone(),
            }),
            Some(row) => match row.get(field) {
                None => Some(ConflictType::FieldMissing {
                    field: field.clone(),
                    expected: expected_value.clone(),
                }),
                Some(current_value) if current_value != expected_value => {
                    Some(ConflictType::FieldChanged {
                        field: field.clone(),
                        expected: expected_value.clone(),
                        current: current_value.clone(),
                    })
                }
                Some(_) => None,
            },
        };
        if let Some(conflict) = conflict {
            result.conflicts.push(conflict);
        }
    }

    result
}

/// Re-read a row and validate the expected snapshot values against it
///
/// Storage errors are returned unchanged.
pub fn validate_against_store<S: RowStore + ?Sized>(
    key: &EntityKey,
    expected: &FieldMap,
    store: &S,
) -> Result<ValidationResult> {
    let current = store.read_row(key)?;
    Ok(validate_fields(expected, current.as_ref()))
}
