//! Relationship inference.

use crate::error::{NamesakeError, Result};
use crate::schema::SchemaView;

/// How two tables are linked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The source table holds `foreign_key` (`{target}_id`).
    Direct { foreign_key: String },
    /// The target table holds `foreign_key` (`{source}_id`).
    Reverse { foreign_key: String },
    /// Rows are paired through `join_table`.
    ManyToMany {
        join_table: String,
        /// Join table field pointing at the source (`{source}_id`)
        local_key: String,
        /// Join table field pointing at the target (`{target}_id`)
        remote_key: String,
    },
}

/// Relationship from one table to another
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
}

impl Relationship {
    /// Whether a source row has at most one related row.
    pub fn is_to_one(&self) -> bool {
        matches!(self.kind, RelationKind::Direct { .. })
    }

    pub fn is_to_many(&self) -> bool {
        !self.is_to_one()
    }
}

/// Name of the join table linking `a` and `b`: both names sorted and joined
/// with `_`.
///
/// ```
/// use namesake::relation::join_table_name;
///
/// assert_eq!(join_table_name("post", "category"), "category_post");
/// assert_eq!(join_table_name("category", "post"), "category_post");
/// ```
pub fn join_table_name(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// Infer the relationship from `a` to `b`.
///
/// Checks, in order: `a` holds `{b}_id` (direct), `b` holds `{a}_id`
/// (reverse), the join table exists with both keys (many-to-many).
///
/// # Errors
///
/// Returns [`NamesakeError::RelationNotFound`] when no check matches, when
/// either table is missing, or when `a == b` (self-relations are not
/// inferred). Schema read failures propagate.
pub fn resolve<S: SchemaView + ?Sized>(a: &str, b: &str, schema: &S) -> Result<Relationship> {
    if a == b || !schema.table_exists(a)? || !schema.table_exists(b)? {
        return Err(NamesakeError::relation_not_found(a, b));
    }

    let relationship = |kind| Relationship {
        from: a.to_string(),
        to: b.to_string(),
        kind,
    };

    let to_b = format!("{b}_id");
    if schema.field_names(a)?.contains(&to_b) {
        return Ok(relationship(RelationKind::Direct { foreign_key: to_b }));
    }

    let to_a = format!("{a}_id");
    if schema.field_names(b)?.contains(&to_a) {
        return Ok(relationship(RelationKind::Reverse { foreign_key: to_a }));
    }

    let join_table = join_table_name(a, b);
    if schema.table_exists(&join_table)? {
        let fields = schema.field_names(&join_table)?;
        if fields.contains(&to_a) && fields.contains(&to_b) {
            return Ok(relationship(RelationKind::ManyToMany {
                join_table,
                local_key: to_a,
                remote_key: to_b,
            }));
        }
    }

    Err(NamesakeError::relation_not_found(a, b))
}
