//! Statement log around another executor.

use super::{ColumnInfo, ExecutionError, Executor, Introspector, ResultSet};
use crate::query::params::Params;
use crate::query::Statement;
use std::cell::RefCell;
use std::collections::BTreeSet;

/// Executor wrapper that records every statement before delegating.
///
/// Useful to assert how many round trips an operation costs:
///
/// ```
/// use namesake::executor::{Executor, RecordingExecutor, ResultSet, ExecutionError};
/// use namesake::Params;
///
/// struct Noop;
/// impl Executor for Noop {
///     fn execute(&self, _: &str, _: &Params) -> Result<ResultSet, ExecutionError> {
///         Ok(ResultSet::default())
///     }
/// }
///
/// let recorder = RecordingExecutor::new(Noop);
/// recorder.execute("SELECT 1", &Params::new()).unwrap();
/// assert_eq!(recorder.count(), 1);
/// assert_eq!(recorder.statements()[0].sql, "SELECT 1");
/// ```
///
/// Introspection calls are delegated without being recorded.
pub struct RecordingExecutor<E> {
    inner: E,
    log: RefCell<Vec<Statement>>,
}

impl<E> RecordingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            log: RefCell::new(Vec::new()),
        }
    }

    /// Statements executed so far, oldest first.
    pub fn statements(&self) -> Vec<Statement> {
        self.log.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn last(&self) -> Option<Statement> {
        self.log.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Executor> Executor for RecordingExecutor<E> {
    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, ExecutionError> {
        self.log.borrow_mut().push(Statement {
            sql: sql.to_string(),
            params: params.clone(),
        });
        self.inner.execute(sql, params)
    }
}

impl<E: Introspector> Introspector for RecordingExecutor<E> {
    fn list_tables(&self) -> Result<BTreeSet<String>, ExecutionError> {
        self.inner.list_tables()
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        self.inner.list_columns(table)
    }
}
