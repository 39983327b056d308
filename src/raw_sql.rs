//! Raw SQL helpers.
//!
//! For statements the builders do not express. Placeholders are checked
//! against the parameters exactly as for built statements.

use crate::database::Database;
use crate::entity::Entity;
use crate::error::Result;
use crate::query::binding;
use crate::query::params::IntoParams;
use crate::query::Statement;
use crate::row::RowCollection;

/// Execute a statement and return the number of rows affected.
///
/// # Errors
///
/// Returns [`NamesakeError::QueryBinding`](crate::NamesakeError::QueryBinding)
/// on a placeholder mismatch (nothing is executed), or
/// [`NamesakeError::Execution`](crate::NamesakeError::Execution).
///
/// # Examples
///
/// ```
/// use namesake::raw_sql::execute_statement;
/// use namesake::{params, Database, SqliteExecutor};
///
/// let db = Database::new(SqliteExecutor::open_in_memory().unwrap());
/// execute_statement(&db, "CREATE TABLE tag (id INTEGER PRIMARY KEY, label TEXT)", ()).unwrap();
/// let inserted = execute_statement(
///     &db,
///     "INSERT INTO tag (label) VALUES (:label)",
///     params! { "label" => "rust" },
/// )
/// .unwrap();
/// assert_eq!(inserted, 1);
/// ```
pub fn execute_statement(db: &Database, sql: &str, params: impl IntoParams) -> Result<u64> {
    let statement = checked("raw", sql, params)?;
    Ok(db.execute_statement(&statement)?.rows_affected)
}

/// Execute a query and decode its rows as rows of `entity`.
///
/// # Errors
///
/// As [`execute_statement`], plus codec failures.
pub fn find_by_statement(entity: &Entity, sql: &str, params: impl IntoParams) -> Result<RowCollection> {
    let statement = checked(entity.name(), sql, params)?;
    let result = entity.database().execute_statement(&statement)?;
    RowCollection::from_result(entity, &result)
}

fn checked(table: &str, sql: &str, params: impl IntoParams) -> Result<Statement> {
    let params = params.into_params();
    binding::check(table, sql, &params, &[])?;
    Ok(Statement::new(sql, params))
}
