//! In-memory provider for tests
//!
//! [`MockProvider`] records every statement it receives and answers from
//! queues of canned results, in the style of sea-orm's `MockDatabase`.
//! Queries pop from the query queue, executes pop from the exec queue; an
//! empty queue answers with no rows or zero affected rows.
//!
//! ```rust
//! use mooring::mock::MockProvider;
//! use mooring::{Provider, Row, Value};
//!
//! let mock = MockProvider::new()
//!     .append_query_results(vec![vec![Row::from_pairs([("id", Value::from(1i64))])]])
//!     .append_exec_results(vec![3]);
//!
//! assert_eq!(mock.query_all("SELECT 1", &[]).unwrap().len(), 1);
//! assert_eq!(mock.execute("DELETE FROM t", &[]).unwrap(), 3);
//! assert_eq!(mock.statement_count(), 2);
//! ```

use crate::provider::{MoorError, Provider};
use crate::row::Row;
use sea_query::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Which provider entry point received a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Execute,
}

/// A statement seen by the mock, with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct State {
    statements: Vec<RecordedStatement>,
    query_results: VecDeque<Result<Vec<Row>, MoorError>>,
    exec_results: VecDeque<Result<u64, MoorError>>,
}

/// Recording provider with canned results
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<State>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue one row set per future query
    pub fn append_query_results(self, results: Vec<Vec<Row>>) -> Self {
        for rows in results {
            self.push_rows(rows);
        }
        self
    }

    /// Queue one affected-row count per future execute
    pub fn append_exec_results(self, results: Vec<u64>) -> Self {
        for affected in results {
            self.push_affected(affected);
        }
        self
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().query_results.push_back(Ok(rows));
    }

    pub fn push_affected(&self, affected: u64) {
        self.state().exec_results.push_back(Ok(affected));
    }

    /// Make the next query fail with `err`
    pub fn push_query_error(&self, err: MoorError) {
        self.state().query_results.push_back(Err(err));
    }

    /// Make the next execute fail with `err`
    pub fn push_exec_error(&self, err: MoorError) {
        self.state().exec_results.push_back(Err(err));
    }

    /// Every statement received so far, oldest first
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state().statements.clone()
    }

    pub fn statement_count(&self) -> usize {
        self.state().statements.len()
    }

    pub fn last_statement(&self) -> Option<RecordedStatement> {
        self.state().statements.last().cloned()
    }

    /// Forget recorded statements; queued results are kept
    pub fn clear(&self) {
        self.state().statements.clear();
    }

    fn record(state: &mut State, kind: StatementKind, sql: &str, params: &[Value]) {
        state.statements.push(RecordedStatement {
            kind,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

impl Provider for MockProvider {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, MoorError> {
        log::debug!(target: "mooring::sql", "{sql} {params:?}");
        let mut state = self.state();
        Self::record(&mut state, StatementKind::Execute, sql, params);
        state.exec_results.pop_front().unwrap_or(Ok(0))
    }

    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, MoorError> {
        log::debug!(target: "mooring::sql", "{sql} {params:?}");
        let mut state = self.state();
        Self::record(&mut state, StatementKind::Query, sql, params);
        state.query_results.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MockProvider")
            .field("statements", &state.statements.len())
            .field("queued_queries", &state.query_results.len())
            .field("queued_execs", &state.exec_results.len())
            .finish()
    }
}
