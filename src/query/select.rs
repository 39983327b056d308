//! `SELECT` builders.

use super::criteria::{criteria_methods, Criteria};
use super::params::Params;
use super::{quote_ident, Statement};
use crate::entity::Entity;
use crate::error::Result;
use crate::executor::ResultSet;
use crate::row::{Row, RowCollection};

/// Select every matching row.
///
/// Created by [`Entity::select_all`].
///
/// # Example
///
/// ```no_run
/// # fn demo(db: &namesake::Database) -> namesake::Result<()> {
/// use namesake::params;
///
/// let posts = db
///     .entity("post")?
///     .select_all()
///     .filter("id > :id", params! { "id" => 10 })
///     .order_by("id ASC")
///     .limit(100)
///     .get()?;
///
/// for post in &posts {
///     println!("{:?}", post.value("title"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SelectAll {
    entity: Entity,
    criteria: Criteria,
    columns: Vec<String>,
}

criteria_methods!(SelectAll);

impl SelectAll {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            criteria: Criteria::default(),
            columns: Vec::new(),
        }
    }

    /// Append an ordering expression (`"pubdate DESC"`); several calls are
    /// joined with commas.
    pub fn order_by(mut self, expr: impl AsRef<str>) -> Self {
        self.criteria.order_by(expr.as_ref());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.criteria.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.criteria.offset(offset);
        self
    }

    /// Restrict the selected columns (default `*`).
    ///
    /// Plain names are quoted; anything else is passed through as an
    /// expression. Rows selected without `id` are keyed by position in the
    /// returned collection.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| column_sql(c.as_ref())));
        self
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Render the statement.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::QueryBinding`](crate::NamesakeError::QueryBinding)
    /// if placeholders and parameters disagree.
    pub fn statement(&self) -> Result<Statement> {
        render(&self.entity, &self.criteria, &self.columns, None)
    }

    /// Execute and return the raw result set.
    ///
    /// # Errors
    ///
    /// Returns rendering errors, or [`NamesakeError::Execution`](crate::NamesakeError::Execution).
    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// Execute and decode every row.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus codec failures while decoding.
    pub fn get(&self) -> Result<RowCollection> {
        let result = self.run()?;
        RowCollection::from_result(&self.entity, &result)
    }
}

/// Select the first matching row. Always renders `LIMIT 1`.
///
/// Created by [`Entity::select_one`].
#[derive(Debug, Clone)]
pub struct SelectOne {
    entity: Entity,
    criteria: Criteria,
    columns: Vec<String>,
}

criteria_methods!(SelectOne);

impl SelectOne {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            criteria: Criteria::default(),
            columns: Vec::new(),
        }
    }

    pub fn order_by(mut self, expr: impl AsRef<str>) -> Self {
        self.criteria.order_by(expr.as_ref());
        self
    }

    /// Skip `offset` rows before taking the first one.
    pub fn offset(mut self, offset: u64) -> Self {
        self.criteria.offset(offset);
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| column_sql(c.as_ref())));
        self
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn statement(&self) -> Result<Statement> {
        render(&self.entity, &self.criteria, &self.columns, Some(1))
    }

    pub fn run(&self) -> Result<ResultSet> {
        let statement = self.statement()?;
        self.entity.database().execute_statement(&statement)
    }

    /// Execute and decode the first row; `None` when nothing matches.
    pub fn get(&self) -> Result<Option<Row>> {
        let result = self.run()?;
        let row = result
            .iter()
            .next()
            .map(|raw| self.entity.decode_row(raw))
            .transpose();
        row
    }
}

fn render(
    entity: &Entity,
    criteria: &Criteria,
    columns: &[String],
    forced_limit: Option<u64>,
) -> Result<Statement> {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    let sql = format!(
        "SELECT {projection} FROM {}{}{}{}",
        quote_ident(entity.name()),
        criteria.where_sql(),
        criteria.order_sql(),
        criteria.limit_sql(forced_limit),
    );
    criteria.finish(entity.name(), sql, Params::new())
}

fn column_sql(column: &str) -> String {
    let column = column.trim();
    if !column.is_empty() && column.chars().all(|c| c.is_alphanumeric() || c == '_') {
        quote_ident(column)
    } else {
        column.to_string()
    }
}
