//! Model registry
//!
//! A [`ModelRegistry`] owns the provider handle, the schema builder, and one
//! lazily built [`ModelContext`] per record type. It is passed explicitly to
//! every entry point; there is no process-global registry.
//!
//! Each record type gets a slot keyed by `TypeId`. The slot is created under
//! the write lock and filled exactly once with `OnceCell::get_or_try_init`, so
//! concurrent first access to the same type never builds two catalogs. After
//! that, lookups take only the read lock and clone an `Arc`.

use crate::catalog::{ColumnCatalog, ColumnDescriptor};
use crate::condition::{Condition, Op};
use crate::config::DatabaseConfig;
use crate::provider::{MayPostgresProvider, MoorError, Provider};
use crate::query::execution::{
    delete_statement, insert_statement, materialize, update_statement,
};
use crate::query::{Patch, QueryPipeline};
use crate::record::Record;
use crate::schema::{PostgresSchemaBuilder, SchemaBuilder};
use crate::value::{integer_as, is_unset_key};
use once_cell::sync::OnceCell;
use sea_query::Value;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Slot = Arc<OnceCell<Arc<ModelContext>>>;

/// Per-application registry of record-type contexts
pub struct ModelRegistry {
    provider: Arc<dyn Provider>,
    schema: Arc<dyn SchemaBuilder>,
    contexts: RwLock<HashMap<TypeId, Slot>>,
}

impl ModelRegistry {
    /// Create a registry over `provider` with the PostgreSQL schema builder
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            schema: Arc::new(PostgresSchemaBuilder),
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Connect to PostgreSQL with `config` and build a registry on the client
    pub fn connect(config: &DatabaseConfig) -> Result<Self, MoorError> {
        let client = crate::connection::connect_with_config(config)?;
        Ok(Self::new(Arc::new(MayPostgresProvider::new(client))))
    }

    /// Replace the schema builder used for `add_column`/`drop_column`
    ///
    /// Contexts built afterwards use the new builder.
    pub fn with_schema_builder(mut self, schema: impl SchemaBuilder + 'static) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The context of `R`, built on first access
    ///
    /// # Errors
    ///
    /// `SchemaError` when `R` declares no key. The slot stays empty, so every
    /// later call reports the same error.
    pub fn get_or_create<R: Record>(&self) -> Result<Arc<ModelContext>, MoorError> {
        let type_id = TypeId::of::<R>();

        let existing = self
            .contexts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&type_id)
            .cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => self
                .contexts
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .entry(type_id)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone(),
        };

        slot.get_or_try_init(|| -> Result<Arc<ModelContext>, MoorError> {
            let catalog = ColumnCatalog::build(type_name::<R>(), R::TABLE, R::COLUMNS)?;
            Ok(Arc::new(ModelContext {
                record_type: type_id,
                catalog,
                provider: Arc::clone(&self.provider),
                schema: Arc::clone(&self.schema),
            }))
        })
        .cloned()
    }

    /// Start a query pipeline over `R`
    pub fn from<R: Record>(&self) -> Result<QueryPipeline<R>, MoorError> {
        Ok(self.get_or_create::<R>()?.from::<R>())
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self
            .contexts
            .read()
            .map(|contexts| contexts.len())
            .unwrap_or_default();
        f.debug_struct("ModelRegistry")
            .field("registered", &registered)
            .finish_non_exhaustive()
    }
}

/// Catalog, provider and schema builder of one record type
///
/// The operator primitives here are the statements the pipeline terminals,
/// the static finders and the change tracker share.
pub struct ModelContext {
    record_type: TypeId,
    catalog: ColumnCatalog,
    provider: Arc<dyn Provider>,
    schema: Arc<dyn SchemaBuilder>,
}

impl ModelContext {
    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn schema_builder(&self) -> &dyn SchemaBuilder {
        self.schema.as_ref()
    }

    /// Fail unless this is the context of `R`
    pub(crate) fn check<R: Record>(&self) -> Result<(), MoorError> {
        if self.record_type == TypeId::of::<R>() {
            Ok(())
        } else {
            Err(MoorError::SchemaError {
                type_name: type_name::<R>(),
                reason: format!("context belongs to {}", self.catalog.type_name()),
            })
        }
    }

    /// Start a query pipeline over `R`
    pub fn from<R: Record>(self: &Arc<Self>) -> QueryPipeline<R> {
        QueryPipeline::new(Arc::clone(self))
    }

    /// Read the value of a cataloged column from `record`
    fn value_of<R: Record>(&self, record: &R, column: &ColumnDescriptor) -> Result<Value, MoorError> {
        record.get(column.field).ok_or_else(|| {
            MoorError::SchemaError {
                type_name: self.catalog.type_name(),
                reason: format!("member `{}` has no accessor", column.field),
            }
        })
    }

    /// `key1 = ? AND key2 = ?` for `record`
    pub fn key_condition<R: Record>(&self, record: &R) -> Result<Condition, MoorError> {
        self.check::<R>()?;
        self.catalog.keys().try_fold(Condition::Empty, |acc, key| {
            Ok(acc.and(Condition::compare(key.name, Op::Eq, self.value_of(record, key)?)))
        })
    }

    /// Insert `record`
    ///
    /// Each auto-increment column that still holds its default is left to
    /// storage and read back. Returns the generated values as
    /// `(member, value)` pairs, re-typed to each column's width.
    pub fn insert<R: Record>(&self, record: &R) -> Result<Vec<(&'static str, Value)>, MoorError> {
        self.check::<R>()?;
        let mut columns = Vec::new();
        let mut values = Vec::new();
        let mut generated = Vec::new();

        for column in self.catalog.columns() {
            let value = self.value_of(record, column)?;
            if column.auto_increment && is_unset_key(&value) {
                generated.push(column);
                continue;
            }
            columns.push(column.name);
            values.push(value);
        }

        let returning: Vec<&'static str> = generated.iter().map(|column| column.name).collect();
        let (sql, params) = insert_statement(&self.catalog, &columns, values, &returning)?;
        if generated.is_empty() {
            self.provider.execute(&sql, &params)?;
            return Ok(Vec::new());
        }

        let rows = self.provider.query_all(&sql, &params)?;
        let row = rows.first().ok_or_else(|| {
            MoorError::QueryError(format!(
                "INSERT into `{}` returned no generated key",
                self.catalog.table()
            ))
        })?;
        generated
            .into_iter()
            .map(|column| {
                let value = row.value_of(column.name).cloned().ok_or_else(|| {
                    MoorError::QueryError(format!(
                        "INSERT into `{}` did not return `{}`",
                        self.catalog.table(),
                        column.name
                    ))
                })?;
                Ok((column.field, integer_as(value, column.kind)))
            })
            .collect()
    }

    /// Update the given members of `record`, matched by key
    ///
    /// Columns are written in catalog order. Key columns are never written.
    /// No members means no statement.
    pub fn update<R: Record>(&self, record: &R, members: &[&str]) -> Result<u64, MoorError> {
        self.check::<R>()?;
        let mut assignments = Vec::new();
        for column in self.catalog.columns() {
            if column.is_key || !members.contains(&column.field) {
                continue;
            }
            assignments.push((column.name, self.value_of(record, column)?));
        }
        if assignments.is_empty() {
            return Ok(0);
        }

        let condition = self.key_condition(record)?;
        let (sql, params) = update_statement(&self.catalog, assignments, &condition);
        self.provider.execute(&sql, &params)
    }

    /// Delete `record`, matched by key
    pub fn delete<R: Record>(&self, record: &R) -> Result<u64, MoorError> {
        let condition = self.key_condition(record)?;
        self.delete_by(&condition)
    }

    /// Delete every row matching `condition`
    pub fn delete_by(&self, condition: &Condition) -> Result<u64, MoorError> {
        let (sql, params) = delete_statement(&self.catalog, condition);
        self.provider.execute(&sql, &params)
    }

    /// Apply `patch` to every row matching `condition`
    pub fn update_by<R: Record>(&self, condition: &Condition, patch: &Patch<R>) -> Result<u64, MoorError> {
        self.check::<R>()?;
        if patch.is_empty() {
            return Ok(0);
        }
        let assignments = patch
            .assignments()
            .iter()
            .map(|(member, value)| Ok((self.catalog.resolve_member(member)?.name, value.clone())))
            .collect::<Result<Vec<_>, MoorError>>()?;
        let (sql, params) = update_statement(&self.catalog, assignments, condition);
        self.provider.execute(&sql, &params)
    }

    /// Run caller-written SQL and materialize the rows as `R`
    pub fn find_by_sql<R: Record>(&self, sql: &str, params: &[Value]) -> Result<Vec<R>, MoorError> {
        self.check::<R>()?;
        let rows = self.provider.query_all(sql, params)?;
        materialize(&rows)
    }

    /// `ALTER TABLE ... ADD COLUMN` for a cataloged column
    pub fn add_column(&self, column: &ColumnDescriptor, default: Option<Value>) -> Result<(), MoorError> {
        let sql = self
            .schema
            .add_column(self.catalog.table(), column, default.as_ref())?;
        self.provider.execute_non_query(&sql)?;
        Ok(())
    }

    /// `ALTER TABLE ... DROP COLUMN`
    pub fn drop_column(&self, column: &str) -> Result<(), MoorError> {
        let sql = self.schema.drop_column(self.catalog.table(), column)?;
        self.provider.execute_non_query(&sql)?;
        Ok(())
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}
