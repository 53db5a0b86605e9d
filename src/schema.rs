//! Column-level schema changes
//!
//! A [`SchemaBuilder`] renders `ALTER TABLE` statements for adding and
//! dropping a single column. [`PostgresSchemaBuilder`] builds them with
//! `sea_query::Table::alter()`; the registry hands the text to the provider's
//! non-query path.

use crate::catalog::{ColumnDescriptor, ColumnKind};
use crate::condition::SqlIdent;
use crate::provider::MoorError;
use sea_query::{ColumnDef, Expr, PostgresQueryBuilder, Table, Value};

/// Renders DDL for column additions and removals
pub trait SchemaBuilder: Send + Sync {
    /// `ALTER TABLE table ADD COLUMN ...`, with an optional literal default
    fn add_column(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        default: Option<&Value>,
    ) -> Result<String, MoorError>;

    /// `ALTER TABLE table DROP COLUMN column`
    fn drop_column(&self, table: &str, column: &str) -> Result<String, MoorError>;
}

/// PostgreSQL dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSchemaBuilder;

impl PostgresSchemaBuilder {
    fn column_def(column: &ColumnDescriptor, default: Option<&Value>) -> ColumnDef {
        let mut def = ColumnDef::new(SqlIdent::new(column.name));
        match column.kind {
            ColumnKind::Boolean => def.boolean(),
            ColumnKind::TinyInt => def.tiny_integer(),
            ColumnKind::SmallInt => def.small_integer(),
            ColumnKind::Integer => def.integer(),
            ColumnKind::BigInt => def.big_integer(),
            ColumnKind::Float => def.float(),
            ColumnKind::Double => def.double(),
            ColumnKind::Text => def.text(),
            ColumnKind::Bytes => def.binary(),
            ColumnKind::Json => def.json_binary(),
            ColumnKind::Timestamp => def.timestamp(),
            ColumnKind::Decimal => def.decimal(),
        };
        if column.nullable {
            def.null();
        } else {
            def.not_null();
        }
        if let Some(value) = default {
            def.default(Expr::val(value.clone()));
        }
        def
    }
}

impl SchemaBuilder for PostgresSchemaBuilder {
    fn add_column(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        default: Option<&Value>,
    ) -> Result<String, MoorError> {
        if column.is_key {
            return Err(MoorError::QueryError(format!(
                "cannot add key column `{}` to existing table `{table}`",
                column.name
            )));
        }
        let alter = Table::alter()
            .table(SqlIdent::new(table))
            .add_column(Self::column_def(column, default))
            .to_owned();
        Ok(alter.build(PostgresQueryBuilder))
    }

    fn drop_column(&self, table: &str, column: &str) -> Result<String, MoorError> {
        if column.trim().is_empty() {
            return Err(MoorError::QueryError(format!(
                "empty column name in DROP COLUMN on `{table}`"
            )));
        }
        let alter = Table::alter()
            .table(SqlIdent::new(table))
            .drop_column(SqlIdent::new(column))
            .to_owned();
        Ok(alter.build(PostgresQueryBuilder))
    }
}
