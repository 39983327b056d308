//! Execution and introspection seams.
//!
//! namesake never talks to a database directly. Statements go through an
//! [`Executor`], schema metadata comes from an [`Introspector`]. Any driver
//! can implement them; the crate ships [`SqliteExecutor`] (feature `sqlite`),
//! which implements both, and [`RecordingExecutor`], which wraps another
//! executor and keeps a log of every statement it ran.
//!
//! Both traits are implemented for `Rc<T>` and `Box<T>`, so a single
//! connection can be handed to a [`Database`](crate::Database) in both roles
//! while the caller keeps a handle to it.

pub mod recording;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use recording::RecordingExecutor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

use crate::query::params::Params;
use crate::value::Value;
use std::collections::BTreeSet;
use std::rc::Rc;
use thiserror::Error;

/// Error reported by an executor or introspector
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// SQLite error from `rusqlite`
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Any other driver failure
    #[error("{0}")]
    Other(String),
}

/// Trait for running SQL statements
///
/// # Examples
///
/// ```
/// use namesake::executor::{ExecutionError, Executor, ResultSet};
/// use namesake::{Params, Value};
///
/// struct Always42;
///
/// impl Executor for Always42 {
///     fn execute(&self, _sql: &str, _params: &Params) -> Result<ResultSet, ExecutionError> {
///         Ok(ResultSet {
///             columns: vec!["answer".into()],
///             rows: vec![vec![Value::Int(42)]],
///             ..ResultSet::default()
///         })
///     }
/// }
///
/// let rs = Always42.execute("SELECT 42", &Params::new()).unwrap();
/// assert_eq!(rs.scalar(), Some(&Value::Int(42)));
/// ```
pub trait Executor {
    /// Execute `sql` with named parameters.
    ///
    /// `sql` references parameters as `:name`; `params` holds them without
    /// the leading colon. Statements that return rows fill
    /// [`ResultSet::rows`]; writes fill `rows_affected` (and
    /// `last_insert_id` for inserts).
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] for any transport or database failure.
    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, ExecutionError>;
}

/// Column metadata returned by an [`Introspector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, as the database reports it (`INTEGER`, `varchar(255)`, ...)
    pub raw_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
        }
    }
}

/// Trait for reading schema metadata
///
/// Results are assumed stable for the lifetime of a
/// [`Database`](crate::Database); they are cached there.
pub trait Introspector {
    /// Names of every table (and view).
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] if the catalog cannot be read.
    fn list_tables(&self) -> Result<BTreeSet<String>, ExecutionError>;

    /// Columns of `table` in declaration order; empty when the table does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] if the catalog cannot be read.
    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError>;
}

/// Outcome of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names, in result order
    pub columns: Vec<String>,
    /// Row values, aligned with `columns`
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by a write; `0` for reads
    pub rows_affected: u64,
    /// Key generated by an `INSERT`, if the driver reports one
    pub last_insert_id: Option<Value>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(move |values| RawRow {
            columns: &self.columns,
            values,
        })
    }

    /// First column of the first row (aggregates).
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Borrowed view of one undecoded result row
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RawRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl<T: Executor + ?Sized> Executor for Rc<T> {
    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, ExecutionError> {
        (**self).execute(sql, params)
    }
}

impl<T: Executor + ?Sized> Executor for Box<T> {
    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, ExecutionError> {
        (**self).execute(sql, params)
    }
}

impl<T: Introspector + ?Sized> Introspector for Rc<T> {
    fn list_tables(&self) -> Result<BTreeSet<String>, ExecutionError> {
        (**self).list_tables()
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        (**self).list_columns(table)
    }
}

impl<T: Introspector + ?Sized> Introspector for Box<T> {
    fn list_tables(&self) -> Result<BTreeSet<String>, ExecutionError> {
        (**self).list_tables()
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        (**self).list_columns(table)
    }
}
