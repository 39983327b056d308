//! `COUNT` and `SUM` builders.

use super::criteria::{criteria_methods, Criteria};
use super::params::Params;
use super::{quote_ident, Statement};
use crate::entity::Entity;
use crate::error::{NamesakeError, Result};
use crate::executor::ResultSet;
use crate::value::Value;

/// Count matching rows.
#[derive(Debug, Clone)]
pub struct Count {
    entity: Entity,
    criteria: Criteria,
}

criteria_methods!(Count);

impl Count {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            criteria: Criteria::default(),
        }
    }

    pub fn statement(&self) -> Result<Statement> {
        let table = self.entity.name();
        let sql = format!("SELECT COUNT(*) FROM {}{}", quote_ident(table), self.criteria.where_sql());
        self.criteria.finish(table, sql, Params::new())
    }

    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// Execute and return the number of matching rows.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::UnexpectedResult`] when the executor does not
    /// return an integer scalar.
    pub fn get(&self) -> Result<i64> {
        let result = self.run()?;
        match result.scalar() {
            Some(value) => value.as_i64().ok_or_else(|| NamesakeError::UnexpectedResult {
                table: self.entity.name().to_string(),
                operation: "count",
                detail: format!("expected an integer, got {}", value.type_name()),
            }),
            None => Err(NamesakeError::UnexpectedResult {
                table: self.entity.name().to_string(),
                operation: "count",
                detail: "no rows returned".to_string(),
            }),
        }
    }
}

/// Sum one field over matching rows.
#[derive(Debug, Clone)]
pub struct Sum {
    entity: Entity,
    criteria: Criteria,
    field: String,
}

criteria_methods!(Sum);

impl Sum {
    pub(crate) fn new(entity: Entity, field: impl Into<String>) -> Self {
        Self {
            entity,
            criteria: Criteria::default(),
            field: field.into(),
        }
    }

    pub fn statement(&self) -> Result<Statement> {
        let table = self.entity.name();
        let sql = format!(
            "SELECT SUM({}) FROM {}{}",
            quote_ident(&self.field),
            quote_ident(table),
            self.criteria.where_sql(),
        );
        self.criteria.finish(table, sql, Params::new())
    }

    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// The sum as returned by the database; `Int(0)` when no row matches.
    pub fn get(&self) -> Result<Value> {
        let result = self.run()?;
        Ok(match result.scalar() {
            None | Some(Value::Null) => Value::Int(0),
            Some(value) => value.clone(),
        })
    }
}
