//! Explicit entity schemas
//!
//! Schemas are declared in code and registered with the database; there is no
//! annotation scanning or schema generation. A schema lists the fields of an
//! entity with their kind and nullability. The row id lives in the
//! [`EntityKey`](crate::EntityKey), not in a field.
//!
//! ```
//! use versionless_core::{EntitySchema, ValueKind};
//!
//! let product = EntitySchema::new("Product")
//!     .field("name", ValueKind::String)
//!     .field("description", ValueKind::String)
//!     .field("price", ValueKind::Float)
//!     .field("quantity", ValueKind::Int)
//!     .field("likes", ValueKind::Int);
//! assert_eq!(product.fields().len(), 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::FieldMap;
use crate::value::{Value, ValueKind};

/// Declaration of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared kind
    pub kind: ValueKind,
    /// Whether `Value::Null` is accepted
    pub nullable: bool,
}

/// Field list of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Start an empty schema for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a non-nullable field
    ///
    /// Redeclaring a field replaces the earlier declaration.
    pub fn field(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push(name.into(), kind, false)
    }

    /// Add a nullable field
    pub fn nullable_field(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push(name.into(), kind, true)
    }

    fn push(mut self, name: String, kind: ValueKind, nullable: bool) -> Self {
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldDef {
            name,
            kind,
            nullable,
        });
        self
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field declaration
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Row with every field at its zero value
    ///
    /// Nullable fields start as `Null`.
    pub fn default_row(&self) -> FieldMap {
        self.fields
            .iter()
            .map(|f| {
                let value = if f.nullable { Value::Null } else { f.kind.zero() };
                (f.name.clone(), value)
            })
            .collect()
    }

    /// Validate a complete row
    ///
    /// Every declared field must be present, no undeclared field may appear,
    /// and every value must match its declaration.
    pub fn validate_row(&self, row: &FieldMap) -> Result<()> {
        for def in &self.fields {
            if !row.contains_key(&def.name) {
                return Err(self.violation(format!("missing field '{}'", def.name)));
            }
        }
        self.validate_fields(row)
    }

    /// Validate a partial update
    ///
    /// Only the listed fields are checked; each must be declared and hold a
    /// value matching its declaration.
    pub fn validate_mutation(&self, fields: &FieldMap) -> Result<()> {
        self.validate_fields(fields)
    }

    fn validate_fields(&self, fields: &FieldMap) -> Result<()> {
        for (name, value) in fields {
            let def = self
                .get(name)
                .ok_or_else(|| self.violation(format!("unknown field '{}'", name)))?;
            self.check_value(def, value)?;
        }
        Ok(())
    }

    fn check_value(&self, def: &FieldDef, value: &Value) -> Result<()> {
        match value.kind() {
            None if def.nullable => Ok(()),
            None => Err(self.violation(format!("field '{}' is not nullable", def.name))),
            Some(kind) if kind == def.kind => Ok(()),
            Some(kind) => Err(self.violation(format!(
                "field '{}' expects {}, got {}",
                def.name, def.kind, kind
            ))),
        }
    }

    fn violation(&self, reason: String) -> Error {
        Error::schema_violation(self.name.clone(), reason)
    }
}
