//! `Provider` Module
//!
//! The provider is the only component that talks to storage. Everything above
//! it (conditions, pipelines, change tracking) produces statement text plus
//! a list of `sea_query::Value` parameters and hands both to a provider.
//!
//! [`MayPostgresProvider`] is the production implementation over a
//! `may_postgres::Client`; [`crate::mock::MockProvider`] records statements
//! in memory.

use crate::row::Row;
use crate::value::conversion::with_converted_params;
use may_postgres::types::Type;
use may_postgres::{Client, Error as PostgresError};
use rust_decimal::Decimal;
use sea_query::Value;
use std::fmt;

/// Mooring error type
#[derive(Debug)]
pub enum MoorError {
    /// `PostgreSQL` error from `may_postgres`, passed through unchanged
    PostgresError(PostgresError),
    /// Statement construction or execution error
    QueryError(String),
    /// Row parsing/conversion error
    ParseError(String),
    /// The record type has no usable key, or its column shape is inconsistent
    SchemaError {
        type_name: &'static str,
        reason: String,
    },
    /// A predicate, dynamic name or column selector referenced a column the
    /// catalog does not contain
    UnknownColumn { table: String, column: String },
    /// A dynamic finder name and its argument list disagree in length
    ArityMismatch { expected: usize, actual: usize },
    /// Negative (or zero) offset, or negative count, passed to a range
    InvalidRange { offset: i64, count: i64 },
    /// A predicate shape that has no `Condition` representation
    TranslationError(String),
    /// Other errors
    Other(String),
}

impl fmt::Display for MoorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoorError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            MoorError::QueryError(s) => write!(f, "Query error: {s}"),
            MoorError::ParseError(s) => write!(f, "Parse error: {s}"),
            MoorError::SchemaError { type_name, reason } => {
                write!(f, "Schema error for {type_name}: {reason}")
            }
            MoorError::UnknownColumn { table, column } => {
                write!(f, "Unknown column `{column}` on table `{table}`")
            }
            MoorError::ArityMismatch { expected, actual } => write!(
                f,
                "Arity mismatch: expected {expected} argument(s), got {actual}"
            ),
            MoorError::InvalidRange { offset, count } => write!(
                f,
                "Invalid range: offset {offset}, count {count} (offset is 1-based, count must not be negative)"
            ),
            MoorError::TranslationError(s) => write!(f, "Translation error: {s}"),
            MoorError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for MoorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MoorError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for MoorError {
    fn from(err: PostgresError) -> Self {
        MoorError::PostgresError(err)
    }
}

/// Trait for executing statements against storage
///
/// Implementations own connection acquisition and must be safe to share
/// between threads; the core issues one logical statement per call and never
/// retries.
pub trait Provider: Send + Sync {
    /// Execute a parameterized statement and return the number of rows affected
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, MoorError>;

    /// Execute a parameterized query and return every row
    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, MoorError>;

    /// Execute a statement without parameters (DDL)
    fn execute_non_query(&self, sql: &str) -> Result<u64, MoorError> {
        self.execute(sql, &[])
    }
}

/// Implementation of `Provider` for `may_postgres::Client`
pub struct MayPostgresProvider {
    client: Client,
}

impl MayPostgresProvider {
    /// Create a new provider from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Provider for MayPostgresProvider {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, MoorError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("mooring.execute", sql = %sql).entered();
        log::debug!(target: "mooring::sql", "{sql} {params:?}");

        with_converted_params(params, |params| {
            self.client.execute(sql, params).map_err(MoorError::PostgresError)
        })
    }

    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, MoorError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("mooring.query", sql = %sql).entered();
        log::debug!(target: "mooring::sql", "{sql} {params:?}");

        let rows = with_converted_params(params, |params| {
            self.client.query(sql, params).map_err(MoorError::PostgresError)
        })?;
        rows.iter().map(convert_row).collect()
    }

    fn execute_non_query(&self, sql: &str) -> Result<u64, MoorError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("mooring.ddl", sql = %sql).entered();
        log::debug!(target: "mooring::sql", "{sql}");

        self.client.execute(sql, &[]).map_err(MoorError::PostgresError)
    }
}

/// Convert a driver row into the provider-neutral [`Row`] by column type
fn convert_row(row: &may_postgres::Row) -> Result<Row, MoorError> {
    let mut names = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (idx, column) in row.columns().iter().enumerate() {
        let value = match *column.type_() {
            Type::BOOL => Value::Bool(row.try_get(idx)?),
            Type::CHAR => Value::TinyInt(row.try_get(idx)?),
            Type::INT2 => Value::SmallInt(row.try_get(idx)?),
            Type::INT4 => Value::Int(row.try_get(idx)?),
            Type::INT8 => Value::BigInt(row.try_get(idx)?),
            Type::FLOAT4 => Value::Float(row.try_get(idx)?),
            Type::FLOAT8 => Value::Double(row.try_get(idx)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Value::String(row.try_get(idx)?)
            }
            Type::BYTEA => Value::Bytes(row.try_get(idx)?),
            Type::JSON | Type::JSONB => {
                let json: Option<serde_json::Value> = row.try_get(idx)?;
                Value::Json(json.map(Box::new))
            }
            Type::TIMESTAMP => {
                let ts: Option<chrono::NaiveDateTime> = row.try_get(idx)?;
                Value::from(ts)
            }
            Type::NUMERIC => {
                let num: Option<Decimal> = row.try_get(idx)?;
                Value::from(num)
            }
            ref other => {
                return Err(MoorError::ParseError(format!(
                    "unsupported column type {} for column `{}`",
                    other,
                    column.name()
                )));
            }
        };
        names.push(column.name().to_string());
        values.push(value);
    }

    Ok(Row::new(names, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moor_error_display() {
        let err = MoorError::QueryError("test error".to_string());
        assert!(err.to_string().contains("Query error"));
    }

    #[test]
    fn test_moor_error_taxonomy_display() {
        let err = MoorError::UnknownColumn {
            table: "users".to_string(),
            column: "NoSuchField".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown column `NoSuchField` on table `users`");

        let err = MoorError::ArityMismatch { expected: 2, actual: 1 };
        assert!(err.to_string().contains("expected 2"));

        let err = MoorError::InvalidRange { offset: -1, count: 5 };
        assert!(err.to_string().contains("offset -1"));

        let err = MoorError::SchemaError {
            type_name: "Keyless",
            reason: "no primary key".to_string(),
        };
        assert!(err.to_string().contains("Keyless"));

        let err = MoorError::TranslationError("member compared to member".to_string());
        assert!(err.to_string().starts_with("Translation error"));
    }

    #[test]
    fn test_non_postgres_errors_have_no_source() {
        use std::error::Error;
        let err = MoorError::Other("boom".to_string());
        assert!(err.source().is_none());
    }
}
