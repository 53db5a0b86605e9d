//! Column catalog for record types
//!
//! A [`ColumnCatalog`] is the static description of a record type's persisted
//! fields: the SQL column name, the Rust member it comes from, the column
//! kind, nullability, and whether the column is (part of) the key. It is built
//! once per type from the derive-generated [`ColumnSpec`] table and is
//! immutable afterwards.

use crate::provider::MoorError;
use std::collections::HashSet;

/// Storage kind of a column, derived from the field's Rust type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Text,
    Bytes,
    Json,
    Timestamp,
    Decimal,
}

/// Compile-time column declaration emitted by `#[derive(Record)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Rust member name
    pub field: &'static str,
    /// SQL column name
    pub column: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// Marked `#[primary_key]`
    pub key: bool,
    /// Marked `#[auto_increment]`
    pub auto_increment: bool,
}

/// A cataloged column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// SQL column name
    pub name: &'static str,
    /// Rust member name
    pub field: &'static str,
    /// PascalCase form of the member name, as used in dynamic finder names
    pub property: String,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub is_key: bool,
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// Build a descriptor from a derive-generated spec
    pub fn from_spec(spec: &ColumnSpec) -> Self {
        Self {
            name: spec.column,
            field: spec.field,
            property: pascal_case(spec.field),
            kind: spec.kind,
            nullable: spec.nullable,
            is_key: spec.key,
            auto_increment: spec.auto_increment,
        }
    }
}

/// Ordered, immutable column description of one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCatalog {
    type_name: &'static str,
    table: &'static str,
    columns: Vec<ColumnDescriptor>,
}

impl ColumnCatalog {
    /// Build a catalog from a record type's column specs
    ///
    /// Column order follows `specs`.
    ///
    /// # Errors
    ///
    /// Returns `MoorError::SchemaError` if no column is marked as key, or if
    /// two columns share an SQL name.
    pub fn build(
        type_name: &'static str,
        table: &'static str,
        specs: &[ColumnSpec],
    ) -> Result<Self, MoorError> {
        let mut seen = HashSet::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.column) {
                return Err(MoorError::SchemaError {
                    type_name,
                    reason: format!("column `{}` is declared more than once", spec.column),
                });
            }
        }

        if !specs.iter().any(|spec| spec.key) {
            return Err(MoorError::SchemaError {
                type_name,
                reason: "no #[primary_key] field found".to_string(),
            });
        }

        let columns = specs.iter().map(ColumnDescriptor::from_spec).collect();
        log::debug!("Built column catalog for {type_name} (table `{table}`)");

        Ok(Self {
            type_name,
            table,
            columns,
        })
    }

    /// Name of the Rust type this catalog describes
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// SQL table name
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// All columns, in declaration order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// SQL names of all columns, in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Look up a column by its Rust member name
    pub fn by_field(&self, member: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field == member)
    }

    /// Look up a column by its SQL name
    pub fn by_name(&self, column: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == column)
    }

    /// Resolve a Rust member name, failing with `UnknownColumn` on a miss
    pub fn resolve_member(&self, member: &str) -> Result<&ColumnDescriptor, MoorError> {
        self.by_field(member).ok_or_else(|| self.unknown(member))
    }

    /// Resolve a column by SQL name first, then by member name
    pub fn resolve(&self, name: &str) -> Result<&ColumnDescriptor, MoorError> {
        self.by_name(name)
            .or_else(|| self.by_field(name))
            .ok_or_else(|| self.unknown(name))
    }

    /// Resolve a dynamic-name fragment against column names and PascalCase
    /// member names. Matching is case-sensitive.
    pub fn resolve_property(&self, fragment: &str) -> Result<&ColumnDescriptor, MoorError> {
        self.columns
            .iter()
            .find(|c| c.name == fragment || c.property == fragment)
            .ok_or_else(|| self.unknown(fragment))
    }

    /// Key columns, in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &ColumnDescriptor> + '_ {
        self.columns.iter().filter(|c| c.is_key)
    }

    /// The first key column
    ///
    /// Every catalog has at least one key; `build` rejects keyless types.
    pub fn primary_key(&self) -> &ColumnDescriptor {
        // build() guarantees a key, the fallback is unreachable
        self.keys().next().unwrap_or(&self.columns[0])
    }

    /// `UnknownColumn` error for `column` on this catalog's table
    pub fn unknown(&self, column: &str) -> MoorError {
        MoorError::UnknownColumn {
            table: self.table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Convert a snake_case member name to PascalCase (`first_name` -> `FirstName`)
pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
