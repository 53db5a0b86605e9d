//! Terminal operations for `QueryPipeline`, plus the write statements they
//! and the change tracker share.
//!
//! Every terminal consumes the pipeline, surfaces a deferred builder error
//! before touching the provider, and issues at most one statement.

use crate::catalog::ColumnCatalog;
use crate::condition::{Condition, SqlIdent};
use crate::predicate::Field;
use crate::provider::MoorError;
use crate::query::select::QueryPipeline;
use crate::record::Record;
use crate::row::Row;
use crate::value::{is_null, numeric_value, ValueType};
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_query::{ConditionalStatement, Expr, Func, PostgresQueryBuilder, Query, Value};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy)]
enum Aggregate {
    Max,
    Min,
    Sum,
}

/// Aggregated column, as a typed member or a runtime name
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Member(&'a str),
    Name(&'a str),
}

impl std::fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Member(name) | Target::Name(name) => f.write_str(name),
        }
    }
}

impl<R: Record> QueryPipeline<R> {
    /// Execute the query and return every matching record
    ///
    /// A window with a count of zero returns an empty list without executing
    /// a statement.
    pub fn select(mut self) -> Result<Vec<R>, MoorError> {
        self.check()?;
        if matches!(self.range, Some(range) if range.count() == 0) {
            return Ok(Vec::new());
        }

        let (sql, values) = self.select_statement().build(PostgresQueryBuilder);
        let rows = self.ctx.provider().query_all(&sql, &values.0)?;
        materialize(&rows)
    }

    /// Execute the query and return the first record, or `None`
    ///
    /// Orders by the primary key when no order was given. Within an explicit
    /// range the first row of that window is returned.
    pub fn find_one(mut self) -> Result<Option<R>, MoorError> {
        self.check()?;
        if self.order.is_empty() {
            let key = self.ctx.catalog().primary_key().name;
            self.order.push(crate::query::OrderBy::asc(key));
        }
        self.range = Some(self.range.map_or_else(crate::query::Range::first, |r| r.single()));
        Ok(self.select()?.into_iter().next())
    }

    /// Count matching records; order and range are ignored
    ///
    /// Unlike `max`/`min`/`sum`, a count is never absent: no matching rows
    /// (or no result row at all) is `0`.
    pub fn count(mut self) -> Result<u64, MoorError> {
        self.check()?;
        let mut query = Query::select();
        query
            .expr(Expr::cust("COUNT(*)"))
            .from(SqlIdent::new(self.ctx.catalog().table()));
        self.apply_filter(&mut query);

        let (sql, values) = query.build(PostgresQueryBuilder);
        let rows = self.ctx.provider().query_all(&sql, &values.0)?;
        let Some(value) = rows.first().and_then(|row| row.value(0)).cloned() else {
            return Ok(0);
        };
        if is_null(&value) {
            return Ok(0);
        }
        numeric_value(value.clone())
            .and_then(|n| n.to_u64())
            .ok_or_else(|| MoorError::ParseError(format!("COUNT(*) returned {value:?}")))
    }

    /// Largest value of a numeric column, or `None` when nothing matches
    pub fn max<T, F>(self, column: F) -> Result<Option<Decimal>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.numeric(Aggregate::Max, Target::Member(member))
    }

    /// Smallest value of a numeric column, or `None` when nothing matches
    pub fn min<T, F>(self, column: F) -> Result<Option<Decimal>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.numeric(Aggregate::Min, Target::Member(member))
    }

    /// Sum of a numeric column, or `None` when nothing matches
    pub fn sum<T, F>(self, column: F) -> Result<Option<Decimal>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.numeric(Aggregate::Sum, Target::Member(member))
    }

    /// Latest value of a timestamp column, or `None` when nothing matches
    pub fn max_date<T, F>(self, column: F) -> Result<Option<NaiveDateTime>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.date(Aggregate::Max, Target::Member(member))
    }

    /// Earliest value of a timestamp column, or `None` when nothing matches
    pub fn min_date<T, F>(self, column: F) -> Result<Option<NaiveDateTime>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.date(Aggregate::Min, Target::Member(member))
    }

    /// `max` of a column given by SQL or member name
    pub fn max_by_name(self, column: &str) -> Result<Option<Decimal>, MoorError> {
        self.numeric(Aggregate::Max, Target::Name(column))
    }

    /// `min` of a column given by SQL or member name
    pub fn min_by_name(self, column: &str) -> Result<Option<Decimal>, MoorError> {
        self.numeric(Aggregate::Min, Target::Name(column))
    }

    /// `sum` of a column given by SQL or member name
    pub fn sum_by_name(self, column: &str) -> Result<Option<Decimal>, MoorError> {
        self.numeric(Aggregate::Sum, Target::Name(column))
    }

    /// `max_date` of a column given by SQL or member name
    pub fn max_date_by_name(self, column: &str) -> Result<Option<NaiveDateTime>, MoorError> {
        self.date(Aggregate::Max, Target::Name(column))
    }

    /// `min_date` of a column given by SQL or member name
    pub fn min_date_by_name(self, column: &str) -> Result<Option<NaiveDateTime>, MoorError> {
        self.date(Aggregate::Min, Target::Name(column))
    }

    /// `MAX` of any column, as a raw value
    pub fn max_value<T, F>(self, column: F) -> Result<Option<Value>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.aggregate(Aggregate::Max, Target::Member(member))
    }

    /// `MIN` of any column, as a raw value
    pub fn min_value<T, F>(self, column: F) -> Result<Option<Value>, MoorError>
    where
        F: FnOnce(R::Fields) -> Field<R, T>,
    {
        let member = column(R::fields()).member();
        self.aggregate(Aggregate::Min, Target::Member(member))
    }

    fn numeric(self, func: Aggregate, target: Target<'_>) -> Result<Option<Decimal>, MoorError> {
        match self.aggregate(func, target)? {
            None => Ok(None),
            Some(value) => numeric_value(value.clone()).map(Some).ok_or_else(|| {
                MoorError::ParseError(format!("{func:?}({target}) is not numeric: {value:?}"))
            }),
        }
    }

    fn date(self, func: Aggregate, target: Target<'_>) -> Result<Option<NaiveDateTime>, MoorError> {
        match self.aggregate(func, target)? {
            None => Ok(None),
            Some(value) => <NaiveDateTime as ValueType>::from_value(value.clone())
                .map(Some)
                .ok_or_else(|| {
                    MoorError::ParseError(format!("{func:?}({target}) is not a timestamp: {value:?}"))
                }),
        }
    }

    /// Run `func(column)` over the filtered rows; NULL and no-row results are `None`
    fn aggregate(mut self, func: Aggregate, target: Target<'_>) -> Result<Option<Value>, MoorError> {
        self.check()?;
        let catalog = self.ctx.catalog();
        let resolved = match target {
            Target::Member(member) => catalog.resolve_member(member)?,
            Target::Name(name) => catalog.resolve(name)?,
        };
        let column = Expr::col(SqlIdent::new(resolved.name));
        let expr = match func {
            Aggregate::Max => Func::max(column),
            Aggregate::Min => Func::min(column),
            Aggregate::Sum => Func::sum(column),
        };

        let mut query = Query::select();
        query.expr(expr).from(SqlIdent::new(catalog.table()));
        self.apply_filter(&mut query);

        let (sql, values) = query.build(PostgresQueryBuilder);
        let rows = self.ctx.provider().query_all(&sql, &values.0)?;
        Ok(rows
            .first()
            .and_then(|row| row.value(0))
            .filter(|value| !is_null(value))
            .cloned())
    }

    /// Delete every matching record; order and range are ignored
    pub fn delete(mut self) -> Result<u64, MoorError> {
        self.check()?;
        self.ctx.delete_by(&self.condition)
    }

    /// Apply `patch` to every matching record; order and range are ignored
    ///
    /// An empty patch returns 0 without executing a statement.
    pub fn update(mut self, patch: Patch<R>) -> Result<u64, MoorError> {
        self.check()?;
        self.ctx.update_by(&self.condition, &patch)
    }
}

pub(crate) fn materialize<R: Record>(rows: &[Row]) -> Result<Vec<R>, MoorError> {
    rows.iter()
        .map(|row| {
            R::from_row(row)
                .map_err(|e| MoorError::ParseError(format!("Failed to parse row: {e}")))
        })
        .collect()
}

/// Column assignments for a bulk update
///
/// ```rust
/// use mooring::{Patch, Record};
///
/// #[derive(Record)]
/// struct User {
///     #[primary_key]
///     id: i64,
///     active: bool,
///     note: Option<String>,
/// }
///
/// let f = User::fields();
/// let patch = Patch::<User>::new().set(f.active, false).set(f.note, None::<String>);
/// assert_eq!(patch.len(), 2);
/// ```
pub struct Patch<R> {
    assignments: Vec<(&'static str, Value)>,
    _record: PhantomData<fn(&R)>,
}

impl<R: Record> Patch<R> {
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Assign `value` to `field`; a later assignment to the same field wins
    pub fn set<T: ValueType>(mut self, field: Field<R, T>, value: impl Into<T>) -> Self {
        let value = value.into().into_value();
        match self
            .assignments
            .iter_mut()
            .find(|(member, _)| *member == field.member())
        {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((field.member(), value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// `(member, value)` pairs in assignment order
    pub fn assignments(&self) -> &[(&'static str, Value)] {
        &self.assignments
    }
}

impl<R: Record> Default for Patch<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for Patch<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patch")
            .field("assignments", &self.assignments)
            .finish()
    }
}

/// `INSERT INTO table (cols) VALUES (...) [RETURNING keys]`
pub(crate) fn insert_statement(
    catalog: &ColumnCatalog,
    columns: &[&'static str],
    values: Vec<Value>,
    returning: &[&'static str],
) -> Result<(String, Vec<Value>), MoorError> {
    let mut insert = Query::insert();
    insert.into_table(SqlIdent::new(catalog.table()));
    if columns.is_empty() {
        insert.or_default_values();
    } else {
        insert.columns(columns.iter().copied().map(SqlIdent::new));
        insert
            .values(values.into_iter().map(Expr::val))
            .map_err(|e| MoorError::QueryError(e.to_string()))?;
    }
    if !returning.is_empty() {
        insert.returning(Query::returning().columns(returning.iter().copied().map(SqlIdent::new)));
    }
    let (sql, values) = insert.build(PostgresQueryBuilder);
    Ok((sql, values.0))
}

/// `UPDATE table SET col = ?, ... WHERE condition`
pub(crate) fn update_statement(
    catalog: &ColumnCatalog,
    assignments: Vec<(&'static str, Value)>,
    condition: &Condition,
) -> (String, Vec<Value>) {
    let mut update = Query::update();
    update.table(SqlIdent::new(catalog.table()));
    for (column, value) in assignments {
        update.value(SqlIdent::new(column), Expr::val(value));
    }
    if !condition.is_trivial() {
        update.cond_where(condition.clone());
    }
    let (sql, values) = update.build(PostgresQueryBuilder);
    (sql, values.0)
}

/// `DELETE FROM table WHERE condition`
pub(crate) fn delete_statement(catalog: &ColumnCatalog, condition: &Condition) -> (String, Vec<Value>) {
    let mut delete = Query::delete();
    delete.from_table(SqlIdent::new(catalog.table()));
    if !condition.is_trivial() {
        delete.cond_where(condition.clone());
    }
    let (sql, values) = delete.build(PostgresQueryBuilder);
    (sql, values.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnKind, ColumnSpec};
    use crate::condition::Op;

    const SPECS: &[ColumnSpec] = &[
        ColumnSpec {
            field: "id",
            column: "id",
            kind: ColumnKind::BigInt,
            nullable: false,
            key: true,
            auto_increment: true,
        },
        ColumnSpec {
            field: "name",
            column: "name",
            kind: ColumnKind::Text,
            nullable: false,
            key: false,
            auto_increment: false,
        },
    ];

    fn catalog() -> ColumnCatalog {
        ColumnCatalog::build("Item", "items", SPECS).unwrap()
    }

    #[test]
    fn test_insert_statement_with_returning() {
        let (sql, values) = insert_statement(
            &catalog(),
            &["name"],
            vec![Value::from("widget")],
            &["id"],
        )
        .unwrap();
        assert_eq!(sql, r#"INSERT INTO "items" ("name") VALUES ($1) RETURNING "id""#);
        assert_eq!(values, vec![Value::from("widget")]);
    }

    #[test]
    fn test_update_statement_binds_set_before_where() {
        let (sql, values) = update_statement(
            &catalog(),
            vec![("name", Value::from("gadget"))],
            &Condition::compare("id", Op::Eq, 7i64),
        );
        assert_eq!(sql, r#"UPDATE "items" SET "name" = $1 WHERE "id" = $2"#);
        assert_eq!(values, vec![Value::from("gadget"), Value::from(7i64)]);
    }

    #[test]
    fn test_delete_statement() {
        let (sql, values) = delete_statement(&catalog(), &Condition::is_in("id", [1i64, 2]));
        assert_eq!(sql, r#"DELETE FROM "items" WHERE "id" IN ($1, $2)"#);
        assert_eq!(values.len(), 2);

        let (sql, _) = delete_statement(&catalog(), &Condition::Empty);
        assert_eq!(sql, r#"DELETE FROM "items""#);
    }
}
