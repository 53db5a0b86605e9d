//! Provider-neutral result rows
//!
//! Providers hand back rows as ordered `(column name, Value)` pairs so record
//! materialization does not depend on a particular driver.

use crate::provider::MoorError;
use crate::value::ValueType;
use sea_query::Value;

/// A single result row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel column-name and value lists
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values) = pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self { columns, values }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names, in result order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value at position `idx`
    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Raw value of the column named `column`
    pub fn value_of(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Read column `column` as `T`
    ///
    /// # Errors
    ///
    /// Returns `MoorError::ParseError` if the column is missing, or its value
    /// does not fit `T` (including NULL in a non-`Option` field).
    pub fn get<T: ValueType>(&self, column: &str) -> Result<T, MoorError> {
        let value = self
            .value_of(column)
            .ok_or_else(|| MoorError::ParseError(format!("column `{column}` not in result row")))?;
        T::from_value(value.clone()).ok_or_else(|| {
            MoorError::ParseError(format!(
                "column `{column}` holds {value:?}, which does not fit {}",
                std::any::type_name::<T>()
            ))
        })
    }
}

/// Materialize a record from a result row
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, MoorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::from_pairs([
            ("id", Value::BigInt(Some(7))),
            ("name", Value::String(Some("Alice".to_string()))),
            ("email", Value::String(None)),
        ])
    }

    #[test]
    fn test_get_by_name() {
        let row = row();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get::<i64>("id").unwrap(), 7);
        assert_eq!(row.get::<String>("name").unwrap(), "Alice");
        assert_eq!(row.get::<Option<String>>("email").unwrap(), None);
    }

    #[test]
    fn test_null_in_required_field_is_parse_error() {
        assert!(matches!(row().get::<String>("email"), Err(MoorError::ParseError(_))));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let err = row().get::<i64>("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        assert!(matches!(row().get::<i32>("id"), Err(MoorError::ParseError(_))));
    }
}
