//! Memoized relation access on a single row.
//!
//! A [`Relation`] is a handle naming one relation of one row. Nothing runs
//! until [`Relation::get`] is called; the result is then stored on the row
//! and every later access (through the handle, [`Row::get`] or a collection
//! containing the row) reuses it.

use crate::error::Result;
use crate::query::SelectAll;
use crate::row::{Row, RowCollection};

/// A resolved relation: one row (or none) for a direct relationship, a
/// collection for reverse and many-to-many relationships.
#[derive(Debug, Clone)]
pub enum Related {
    One(Option<Row>),
    Many(RowCollection),
}

impl Related {
    /// The row of a to-one relation; `None` for an empty to-one relation and
    /// for to-many relations.
    pub fn one(&self) -> Option<&Row> {
        match self {
            Related::One(row) => row.as_ref(),
            Related::Many(_) => None,
        }
    }

    pub fn many(&self) -> Option<&RowCollection> {
        match self {
            Related::Many(rows) => Some(rows),
            Related::One(_) => None,
        }
    }

    /// Every related row, whatever the cardinality.
    pub fn rows(&self) -> Vec<Row> {
        match self {
            Related::One(row) => row.iter().cloned().collect(),
            Related::Many(rows) => rows.iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Related::One(row) => usize::from(row.is_some()),
            Related::Many(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to one named relation of a row.
///
/// # Example
///
/// ```no_run
/// # fn demo(db: &namesake::Database) -> namesake::Result<()> {
/// let post = db.entity("post")?.get(1)?.expect("post 1 exists");
///
/// // Memoized: the second call does not touch the database.
/// let category = post.relation("category").get()?;
/// let again = post.relation("category").get()?;
/// assert_eq!(category.len(), again.len());
///
/// // Fresh query over the same relationship, open to further filtering.
/// let recent = post
///     .relation("comment")
///     .select()?
///     .order_by("createdAt DESC")
///     .limit(5)
///     .get()?;
/// # let _ = recent;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Relation {
    row: Row,
    name: String,
}

impl Relation {
    pub(crate) fn new(row: Row, name: impl Into<String>) -> Self {
        Self {
            row,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the relation is already memoized on the row.
    pub fn is_resolved(&self) -> bool {
        self.row.memo(&self.name).is_some()
    }

    /// Resolve (once) and return the related rows.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::RelationNotFound`](crate::NamesakeError::RelationNotFound)
    /// when the tables are not related, or any query error.
    pub fn get(&self) -> Result<Related> {
        self.row.related(&self.name)
    }

    /// A fresh, unmemoized query for the related rows.
    ///
    /// # Errors
    ///
    /// Returns entity lookup and relationship errors.
    pub fn select(&self) -> Result<SelectAll> {
        let target = self.row.entity().database().entity(&self.name)?;
        target.select_all().related_with(&self.row)
    }
}
