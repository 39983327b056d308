//! `INSERT`, `UPDATE` and `DELETE` builders.
//!
//! Payload values are encoded through the entity's field codecs and bound
//! as `:__v0`, `:__v1`, … in payload order.

use super::binding;
use super::criteria::{criteria_methods, Criteria};
use super::params::{IntoParams, Params};
use super::{quote_ident, Statement};
use crate::entity::Entity;
use crate::error::{NamesakeError, Result};
use crate::executor::ResultSet;
use crate::value::Value;

/// Insert one row.
///
/// Created by [`Entity::insert`].
#[derive(Debug, Clone)]
pub struct Insert {
    entity: Entity,
    payload: Params,
}

impl Insert {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            payload: Params::new(),
        }
    }

    /// Add fields to the payload. A field given twice keeps the last value.
    pub fn data(mut self, data: impl IntoParams) -> Self {
        for (field, value) in data.into_params() {
            self.payload.insert(field, value);
        }
        self
    }

    /// Render the statement.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::EmptyPayload`] without data, or
    /// [`NamesakeError::Codec`] when a value cannot be encoded.
    pub fn statement(&self) -> Result<Statement> {
        let table = self.entity.name();
        let assignments = encode_payload(&self.entity, &self.payload, "insert")?;

        let columns: Vec<String> = assignments.iter().map(|(c, _)| quote_ident(c)).collect();
        let placeholders: Vec<String> = assignments.iter().map(|(_, p)| format!(":{p}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            placeholders.join(", "),
        );

        let params = bind_payload(&self.entity, &self.payload, &assignments)?;
        binding::check(table, &sql, &params, &[])?;
        Ok(Statement::new(sql, params))
    }

    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// Execute and return the generated key, when the executor reports one.
    pub fn get(&self) -> Result<Option<Value>> {
        Ok(self.run()?.last_insert_id)
    }
}

/// Update matching rows.
///
/// Created by [`Entity::update`]. Without filters every row is updated.
#[derive(Debug, Clone)]
pub struct Update {
    entity: Entity,
    criteria: Criteria,
    payload: Params,
}

criteria_methods!(Update);

impl Update {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            criteria: Criteria::default(),
            payload: Params::new(),
        }
    }

    pub fn data(mut self, data: impl IntoParams) -> Self {
        for (field, value) in data.into_params() {
            self.payload.insert(field, value);
        }
        self
    }

    pub fn statement(&self) -> Result<Statement> {
        let table = self.entity.name();
        let assignments = encode_payload(&self.entity, &self.payload, "update")?;

        let set: Vec<String> = assignments
            .iter()
            .map(|(column, placeholder)| format!("{} = :{placeholder}", quote_ident(column)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_ident(table),
            set.join(", "),
            self.criteria.where_sql(),
        );

        let values = bind_payload(&self.entity, &self.payload, &assignments)?;
        self.criteria.finish(table, sql, values)
    }

    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// Execute and return the number of rows changed.
    pub fn get(&self) -> Result<u64> {
        Ok(self.run()?.rows_affected)
    }
}

/// Delete matching rows.
///
/// Created by [`Entity::delete`]. Without filters every row is deleted.
#[derive(Debug, Clone)]
pub struct Delete {
    entity: Entity,
    criteria: Criteria,
}

criteria_methods!(Delete);

impl Delete {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            criteria: Criteria::default(),
        }
    }

    pub fn statement(&self) -> Result<Statement> {
        let table = self.entity.name();
        let sql = format!("DELETE FROM {}{}", quote_ident(table), self.criteria.where_sql());
        self.criteria.finish(table, sql, Params::new())
    }

    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// Execute and return the number of rows removed.
    pub fn get(&self) -> Result<u64> {
        Ok(self.run()?.rows_affected)
    }
}

/// `(column, placeholder)` pairs for a payload.
fn encode_payload(
    entity: &Entity,
    payload: &Params,
    operation: &'static str,
) -> Result<Vec<(String, String)>> {
    if payload.is_empty() {
        return Err(NamesakeError::EmptyPayload {
            table: entity.name().to_string(),
            operation,
        });
    }
    Ok(payload
        .names()
        .enumerate()
        .map(|(i, field)| (field.to_string(), format!("__v{i}")))
        .collect())
}

fn bind_payload(
    entity: &Entity,
    payload: &Params,
    assignments: &[(String, String)],
) -> Result<Params> {
    let mut params = Params::new();
    for ((field, value), (_, placeholder)) in payload.iter().zip(assignments) {
        params.insert(placeholder, entity.encode_field(field, value.clone())?);
    }
    Ok(params)
}
