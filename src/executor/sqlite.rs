//! SQLite executor and introspector built on `rusqlite`.
//!
//! SQLite accepts the statements namesake renders unchanged: backtick-quoted
//! identifiers, `:name` placeholders and `LIMIT offset, count`.

use super::{ColumnInfo, ExecutionError, Executor, Introspector, ResultSet};
use crate::query::params::Params;
use crate::value::Value;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

/// Executor over a single `rusqlite::Connection`
///
/// # Examples
///
/// ```
/// use namesake::executor::{Executor, Introspector, SqliteExecutor};
/// use namesake::{params, Value};
///
/// let sqlite = SqliteExecutor::open_in_memory().unwrap();
/// sqlite
///     .execute_batch("CREATE TABLE category (id INTEGER PRIMARY KEY, name TEXT);")
///     .unwrap();
///
/// let inserted = sqlite
///     .execute("INSERT INTO `category` (`name`) VALUES (:name)", &params! { "name" => "news" })
///     .unwrap();
/// assert_eq!(inserted.rows_affected, 1);
/// assert_eq!(inserted.last_insert_id, Some(Value::Int(1)));
///
/// assert!(sqlite.list_tables().unwrap().contains("category"));
/// ```
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Sqlite`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Sqlite`] if SQLite cannot allocate it.
    pub fn open_in_memory() -> Result<Self, ExecutionError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consume the executor and return the underlying connection
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Run several `;`-separated statements without parameters (DDL, fixtures).
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Sqlite`] on the first failing statement.
    pub fn execute_batch(&self, sql: &str) -> Result<(), ExecutionError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Executor for SqliteExecutor {
    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, ExecutionError> {
        let start = Instant::now();
        let mut stmt = self.conn.prepare(sql)?;

        // rusqlite wants the full placeholder (`:id`) as the name
        let names: Vec<String> = params.names().map(|name| format!(":{name}")).collect();
        let bound: Vec<(&str, &dyn ToSql)> = names
            .iter()
            .zip(params.iter())
            .map(|(name, (_, value))| (name.as_str(), value as &dyn ToSql))
            .collect();

        let result = if stmt.column_count() == 0 {
            let affected = stmt.execute(bound.as_slice())?;
            let is_insert = sql
                .trim_start()
                .get(..6)
                .is_some_and(|head| head.eq_ignore_ascii_case("insert"));
            ResultSet {
                rows_affected: affected as u64,
                last_insert_id: is_insert.then(|| Value::Int(self.conn.last_insert_rowid())),
                ..ResultSet::default()
            }
        } else {
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            let mut rows = stmt.query(bound.as_slice())?;
            let mut values = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    record.push(value_from_ref(row.get_ref(i)?));
                }
                values.push(record);
            }
            ResultSet {
                columns,
                rows: values,
                ..ResultSet::default()
            }
        };

        log::trace!(target: "namesake::sqlite", "statement finished in {:?}", start.elapsed());
        Ok(result)
    }
}

impl Introspector for SqliteExecutor {
    fn list_tables(&self) -> Result<BTreeSet<String>, ExecutionError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(tables)
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    raw_type: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sqlite;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sqlite::Null),
            Value::Bool(b) => ToSqlOutput::Owned(Sqlite::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(Sqlite::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(Sqlite::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Date(d) => ToSqlOutput::Owned(Sqlite::Text(d.format("%Y-%m-%d").to_string())),
            Value::DateTime(dt) => {
                ToSqlOutput::Owned(Sqlite::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            }
            Value::Json(j) => ToSqlOutput::Owned(Sqlite::Text(j.to_string())),
        })
    }
}
