//! Static finder surface
//!
//! [`Model`] is blanket-implemented for every [`Record`], so any derived type
//! gets `User::find(&registry, condition)`, `User::find_by_id(...)`,
//! `User::count_where(...)` and friends. Each call starts a fresh
//! [`QueryPipeline`] from the registry; nothing is cached between calls
//! except the type's catalog.
//!
//! Aggregates take the filter first and the column second. When nothing
//! matches they return `None`, never zero.

use crate::condition::{Condition, Op};
use crate::dynamic::DynamicFinder;
use crate::predicate::{Field, Predicate};
use crate::provider::MoorError;
use crate::query::{Patch, QueryPipeline};
use crate::record::Record;
use crate::registry::ModelRegistry;
use crate::translate::PredicateTranslator;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_query::Value;
use std::any::type_name;

/// Class-level operations on a record type
pub trait Model: Record + Sized {
    /// Start an unfiltered pipeline
    fn query(registry: &ModelRegistry) -> Result<QueryPipeline<Self>, MoorError> {
        registry.from::<Self>()
    }

    /// Start a pipeline filtered by a typed predicate
    fn query_where<F>(registry: &ModelRegistry, predicate: F) -> Result<QueryPipeline<Self>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Predicate<Self>,
    {
        Ok(Self::query(registry)?.filter_by(predicate))
    }

    /// Look up a record by its single key
    ///
    /// # Errors
    ///
    /// `SchemaError` for a type with a composite key.
    fn find_by_id(registry: &ModelRegistry, id: impl Into<Value>) -> Result<Option<Self>, MoorError> {
        let ctx = registry.get_or_create::<Self>()?;
        let mut keys = ctx.catalog().keys();
        let key = match (keys.next(), keys.next()) {
            (Some(key), None) => key.name,
            _ => {
                return Err(MoorError::SchemaError {
                    type_name: type_name::<Self>(),
                    reason: "find_by_id needs exactly one key column".to_string(),
                })
            }
        };
        ctx.from::<Self>()
            .filter(Condition::compare(key, Op::Eq, id))
            .find_one()
    }

    /// Run caller-written SQL and materialize each row
    fn find_by_sql(registry: &ModelRegistry, sql: &str, params: &[Value]) -> Result<Vec<Self>, MoorError> {
        registry.get_or_create::<Self>()?.find_by_sql(sql, params)
    }

    fn find(registry: &ModelRegistry, condition: Condition) -> Result<Vec<Self>, MoorError> {
        Self::query(registry)?.filter(condition).select()
    }

    /// `find` ordered by a clause such as `"name DESC, id"`
    fn find_ordered(
        registry: &ModelRegistry,
        condition: Condition,
        order_by: &str,
    ) -> Result<Vec<Self>, MoorError> {
        Self::query(registry)?
            .filter(condition)
            .order_by_clause(order_by)
            .select()
    }

    /// First match by key order, or `None`
    fn find_one(registry: &ModelRegistry, condition: Condition) -> Result<Option<Self>, MoorError> {
        Self::query(registry)?.filter(condition).find_one()
    }

    /// First match under the given order, or `None`
    fn find_one_ordered(
        registry: &ModelRegistry,
        condition: Condition,
        order_by: &str,
    ) -> Result<Option<Self>, MoorError> {
        Self::query(registry)?
            .filter(condition)
            .order_by_clause(order_by)
            .find_one()
    }

    fn find_where<F>(registry: &ModelRegistry, predicate: F) -> Result<Vec<Self>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Predicate<Self>,
    {
        Self::query_where(registry, predicate)?.select()
    }

    fn find_one_where<F>(registry: &ModelRegistry, predicate: F) -> Result<Option<Self>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Predicate<Self>,
    {
        Self::query_where(registry, predicate)?.find_one()
    }

    /// The `count` records with the highest key, newest first
    fn find_recent(registry: &ModelRegistry, count: i64) -> Result<Vec<Self>, MoorError> {
        let ctx = registry.get_or_create::<Self>()?;
        let key = ctx.catalog().primary_key().name;
        ctx.from::<Self>()
            .order_by_name(key, crate::query::Direction::Desc)
            .range(1, count)
            .select()
    }

    /// Look up records by a dynamic name such as `"NameAndAge"`
    fn find_by(registry: &ModelRegistry, name: &str, args: Vec<Value>) -> Result<Vec<Self>, MoorError> {
        Self::query(registry)?.filter_by_name(name, args).select()
    }

    /// Row count; `0` when nothing matches, never absent
    fn count(registry: &ModelRegistry) -> Result<u64, MoorError> {
        Self::query(registry)?.count()
    }

    fn count_where(registry: &ModelRegistry, condition: Condition) -> Result<u64, MoorError> {
        Self::query(registry)?.filter(condition).count()
    }

    fn max<T, F>(registry: &ModelRegistry, condition: Condition, column: F) -> Result<Option<Decimal>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Field<Self, T>,
    {
        Self::query(registry)?.filter(condition).max(column)
    }

    fn min<T, F>(registry: &ModelRegistry, condition: Condition, column: F) -> Result<Option<Decimal>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Field<Self, T>,
    {
        Self::query(registry)?.filter(condition).min(column)
    }

    fn sum<T, F>(registry: &ModelRegistry, condition: Condition, column: F) -> Result<Option<Decimal>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Field<Self, T>,
    {
        Self::query(registry)?.filter(condition).sum(column)
    }

    fn max_date<T, F>(
        registry: &ModelRegistry,
        condition: Condition,
        column: F,
    ) -> Result<Option<NaiveDateTime>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Field<Self, T>,
    {
        Self::query(registry)?.filter(condition).max_date(column)
    }

    fn min_date<T, F>(
        registry: &ModelRegistry,
        condition: Condition,
        column: F,
    ) -> Result<Option<NaiveDateTime>, MoorError>
    where
        F: FnOnce(Self::Fields) -> Field<Self, T>,
    {
        Self::query(registry)?.filter(condition).min_date(column)
    }

    /// `max` over a column named at runtime (SQL or member name)
    fn max_by_name(registry: &ModelRegistry, condition: Condition, column: &str) -> Result<Option<Decimal>, MoorError> {
        Self::query(registry)?.filter(condition).max_by_name(column)
    }

    fn min_by_name(registry: &ModelRegistry, condition: Condition, column: &str) -> Result<Option<Decimal>, MoorError> {
        Self::query(registry)?.filter(condition).min_by_name(column)
    }

    fn sum_by_name(registry: &ModelRegistry, condition: Condition, column: &str) -> Result<Option<Decimal>, MoorError> {
        Self::query(registry)?.filter(condition).sum_by_name(column)
    }

    fn max_date_by_name(
        registry: &ModelRegistry,
        condition: Condition,
        column: &str,
    ) -> Result<Option<NaiveDateTime>, MoorError> {
        Self::query(registry)?.filter(condition).max_date_by_name(column)
    }

    fn min_date_by_name(
        registry: &ModelRegistry,
        condition: Condition,
        column: &str,
    ) -> Result<Option<NaiveDateTime>, MoorError> {
        Self::query(registry)?.filter(condition).min_date_by_name(column)
    }

    /// Bulk delete; returns the affected row count
    fn delete_by(registry: &ModelRegistry, condition: Condition) -> Result<u64, MoorError> {
        registry.get_or_create::<Self>()?.delete_by(&condition)
    }

    fn delete_where<F>(registry: &ModelRegistry, predicate: F) -> Result<u64, MoorError>
    where
        F: FnOnce(Self::Fields) -> Predicate<Self>,
    {
        Self::query_where(registry, predicate)?.delete()
    }

    /// Bulk update; returns the affected row count
    fn update_by(registry: &ModelRegistry, condition: Condition, patch: Patch<Self>) -> Result<u64, MoorError> {
        registry.get_or_create::<Self>()?.update_by(&condition, &patch)
    }

    /// Translate a typed predicate into a condition without running it
    fn parse<F>(registry: &ModelRegistry, predicate: F) -> Result<Condition, MoorError>
    where
        F: FnOnce(Self::Fields) -> Predicate<Self>,
    {
        let ctx = registry.get_or_create::<Self>()?;
        PredicateTranslator::new(ctx.catalog()).translate_predicate(&predicate(Self::fields()))
    }

    /// Parse a dynamic name into a condition without running it
    fn parse_name(registry: &ModelRegistry, name: &str, args: Vec<Value>) -> Result<Condition, MoorError> {
        let ctx = registry.get_or_create::<Self>()?;
        DynamicFinder::parse(ctx.catalog(), name, args)
    }

    /// `ALTER TABLE ... ADD COLUMN` for a declared member
    fn add_column<T, F>(registry: &ModelRegistry, column: F, default: Option<Value>) -> Result<(), MoorError>
    where
        F: FnOnce(Self::Fields) -> Field<Self, T>,
    {
        let ctx = registry.get_or_create::<Self>()?;
        let member = column(Self::fields()).member();
        let descriptor = PredicateTranslator::new(ctx.catalog()).column_of(member)?;
        ctx.add_column(descriptor, default)
    }

    /// `ALTER TABLE ... DROP COLUMN`
    fn drop_column(registry: &ModelRegistry, column: &str) -> Result<(), MoorError> {
        registry.get_or_create::<Self>()?.drop_column(column)
    }
}

impl<R: Record> Model for R {}
