//! Relationships inferred from table and field names.
//!
//! Two tables `a` and `b` are related when:
//!
//! - `a` has a `{b}_id` field: **direct** (each `a` row belongs to one `b`),
//! - `b` has an `{a}_id` field: **reverse** (each `a` row has many `b`),
//! - a join table named after both, sorted and joined with `_`
//!   (`post` + `tag` → `post_tag`), holds `{a}_id` and `{b}_id`:
//!   **many-to-many**.
//!
//! The checks run in that order; the first match wins. Nothing is declared
//! up front: [`resolve`] is a pure function of the two names and the schema.
//!
//! Loading is lazy and batched. Asking a [`RowCollection`] for a relation
//! fetches it for every member in one query ([`eager`]); asking a single
//! [`Row`] runs the same path over a one-row collection. Results are
//! memoized on each row ([`lazy::Relation`]).

pub mod eager;
pub mod lazy;
pub mod resolver;

pub use lazy::{Related, Relation};
pub use resolver::{join_table_name, resolve, RelationKind, Relationship};

use crate::entity::Entity;
use crate::row::{Row, RowCollection};

/// Rows a query can be constrained by (see `related_with` on the builders).
pub trait RelationSource {
    /// Entity the rows belong to; decides the relationship.
    fn source_entity(&self) -> &Entity;

    fn source_rows(&self) -> Vec<Row>;
}

impl RelationSource for Row {
    fn source_entity(&self) -> &Entity {
        self.entity()
    }

    fn source_rows(&self) -> Vec<Row> {
        vec![self.clone()]
    }
}

impl RelationSource for RowCollection {
    fn source_entity(&self) -> &Entity {
        self.entity()
    }

    fn source_rows(&self) -> Vec<Row> {
        self.iter().cloned().collect()
    }
}
