//! Select pipeline for record types.
//!
//! This module holds the [`QueryPipeline`] state and the clause-adding
//! builder methods (filter, order, range). Terminal operations that run the
//! statement live in the execution module.

use crate::condition::{Condition, SqlIdent};
use crate::dynamic::DynamicFinder;
use crate::predicate::{OrderKey, Predicate};
use crate::provider::MoorError;
use crate::query::order::{Direction, OrderBy, Range};
use crate::record::Record;
use crate::registry::ModelContext;
use crate::translate::PredicateTranslator;
use sea_query::{ConditionalStatement, PostgresQueryBuilder, Query, SelectStatement, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// Query pipeline over records of type `R`
///
/// Clause-adding calls take and return the pipeline by value. A clause that
/// cannot be resolved (unknown column, invalid range) does not panic: the
/// first such error is kept and returned by the terminal operation, which
/// then executes nothing.
///
/// Repeated `filter` calls combine with AND. To express OR at the top level,
/// build it inside one condition.
pub struct QueryPipeline<R: Record> {
    pub(crate) ctx: Arc<ModelContext>,
    pub(crate) condition: Condition,
    pub(crate) order: Vec<OrderBy>,
    pub(crate) range: Option<Range>,
    pub(crate) error: Option<MoorError>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> QueryPipeline<R> {
    /// Start a pipeline on `ctx`, which must be the context of `R`
    pub(crate) fn new(ctx: Arc<ModelContext>) -> Self {
        let error = ctx.check::<R>().err();
        Self {
            ctx,
            condition: Condition::Empty,
            order: Vec::new(),
            range: None,
            error,
            _record: PhantomData,
        }
    }

    fn fail(mut self, err: MoorError) -> Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }

    fn translator(&self) -> PredicateTranslator<'_> {
        PredicateTranslator::new(self.ctx.catalog())
    }

    /// AND `condition` into the filter
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = std::mem::take(&mut self.condition).and(condition);
        self
    }

    /// AND a typed predicate into the filter
    ///
    /// ```no_run
    /// # use mooring::{Model, ModelRegistry, Record};
    /// # #[derive(Record)]
    /// # struct User { #[primary_key] id: i64, age: i32 }
    /// # fn demo(registry: &ModelRegistry) -> Result<(), mooring::MoorError> {
    /// let adults = User::query(registry)?.filter_by(|u| u.age.ge(18)).select()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter_by<F>(self, predicate: F) -> Self
    where
        F: FnOnce(R::Fields) -> Predicate<R>,
    {
        let predicate = predicate(R::fields());
        let translated = self.translator().translate_predicate(&predicate);
        match translated {
            Ok(condition) => self.filter(condition),
            Err(err) => self.fail(err),
        }
    }

    /// AND a dynamic-name condition (`"NameAndAge"`) into the filter
    pub fn filter_by_name(self, name: &str, args: Vec<Value>) -> Self {
        let parsed = DynamicFinder::parse(self.ctx.catalog(), name, args);
        match parsed {
            Ok(condition) => self.filter(condition),
            Err(err) => self.fail(err),
        }
    }

    /// Append a typed sort key
    pub fn order_by(mut self, key: OrderKey<R>) -> Self {
        let resolved = self.translator().order_key(&key);
        match resolved {
            Ok(order) => {
                self.order.push(order);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Append a sort key by column or member name
    pub fn order_by_name(mut self, name: &str, direction: Direction) -> Self {
        let resolved = self.ctx.catalog().resolve(name).map(|c| c.name);
        match resolved {
            Ok(column) => {
                self.order.push(OrderBy {
                    column: column.to_string(),
                    direction,
                });
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Append the sort keys of a clause such as `"name DESC, id"`
    pub fn order_by_clause(mut self, clause: &str) -> Self {
        let parsed = OrderBy::parse_clause(self.ctx.catalog(), clause);
        match parsed {
            Ok(terms) => {
                self.order.extend(terms);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Restrict to `count` rows starting at 1-based position `offset`
    pub fn range(mut self, offset: i64, count: i64) -> Self {
        match Range::new(offset, count) {
            Ok(range) => {
                self.range = Some(range);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Restrict to the first row (`range(1, 1)`)
    pub fn first(mut self) -> Self {
        self.range = Some(Range::first());
        self
    }

    /// The accumulated filter
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// The accumulated sort keys
    pub fn order(&self) -> &[OrderBy] {
        &self.order
    }

    /// The result window, if any
    pub fn window(&self) -> Option<Range> {
        self.range
    }

    /// The first builder error, if any, with its variant intact
    ///
    /// Terminals report the same error before executing anything.
    pub fn error(&self) -> Option<&MoorError> {
        self.error.as_ref()
    }

    /// Build the `SELECT` statement text and parameters without executing it
    ///
    /// A deferred builder error is reported as `QueryError`; use
    /// [`QueryPipeline::error`] to match on the original variant.
    pub fn build(&self) -> Result<(String, Vec<Value>), MoorError> {
        if let Some(err) = &self.error {
            return Err(MoorError::QueryError(err.to_string()));
        }
        let (sql, values) = self.select_statement().build(PostgresQueryBuilder);
        Ok((sql, values.0))
    }

    /// Return the deferred builder error, if any
    pub(crate) fn check(&mut self) -> Result<(), MoorError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn select_statement(&self) -> SelectStatement {
        let catalog = self.ctx.catalog();
        let mut query = Query::select();
        query
            .columns(catalog.column_names().map(SqlIdent::new))
            .from(SqlIdent::new(catalog.table()));
        self.apply_filter(&mut query);
        for term in &self.order {
            query.order_by(SqlIdent::new(term.column.as_str()), term.direction.order());
        }
        if let Some(range) = self.range {
            query.limit(range.count());
            if range.skip() > 0 {
                query.offset(range.skip());
            }
        }
        query
    }

    pub(crate) fn apply_filter<S: ConditionalStatement>(&self, statement: &mut S) {
        if !self.condition.is_trivial() {
            statement.cond_where(self.condition.clone());
        }
    }
}

impl<R: Record> std::fmt::Debug for QueryPipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("table", &self.ctx.catalog().table())
            .field("condition", &self.condition)
            .field("order", &self.order)
            .field("range", &self.range)
            .field("error", &self.error)
            .finish()
    }
}
