//! Clause and parameter state shared by every builder.

use super::binding;
use super::params::Params;
use super::{quote_ident, Statement};
use crate::entity::Entity;
use crate::error::Result;
use crate::relation::{resolve, RelationKind, RelationSource};
use crate::value::{Key, Value};
use indexmap::IndexMap;

/// `LIMIT offset, count` needs a count; SQLite documents this as "no limit".
pub(crate) const UNBOUNDED_LIMIT: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Default)]
pub(crate) struct Criteria {
    clauses: Vec<String>,
    params: Params,
    conflicts: Vec<String>,
    order: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    generated: usize,
}

impl Criteria {
    pub(crate) fn filter(&mut self, fragment: &str, params: Params) {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            self.clauses.push(fragment.to_string());
        }
        self.params.merge(params, &mut self.conflicts);
    }

    /// `` `field` IN (…) `` over generated placeholders.
    pub(crate) fn filter_in(&mut self, field: &str, values: Vec<Value>) {
        self.filter_in_expr(&quote_ident(field), "__in", values);
    }

    /// `column IN (…)` for an already rendered column expression, with
    /// placeholders named `{base}{n}_{i}`.
    pub(crate) fn filter_in_expr(&mut self, column: &str, base: &str, values: Vec<Value>) {
        let prefix = self.next_prefix(base);
        let fragment = self.in_list(column, &prefix, distinct(values));
        self.clauses.push(fragment);
    }

    /// Constrain `target` rows to those related to `source`.
    pub(crate) fn related_with<S>(&mut self, target: &Entity, source: &S) -> Result<()>
    where
        S: RelationSource + ?Sized,
    {
        let from = source.source_entity();
        let relationship = resolve(from.name(), target.name(), target.database())?;
        let rows = source.source_rows();
        let prefix = self.next_prefix("__related");

        let fragment = match &relationship.kind {
            RelationKind::Direct { foreign_key } => {
                let keys = distinct(rows.iter().filter_map(|row| row.value(foreign_key)).collect());
                self.in_list(&quote_ident("id"), &prefix, keys)
            }
            RelationKind::Reverse { foreign_key } => {
                let keys = distinct(rows.iter().filter_map(|row| row.id()).collect());
                self.in_list(&quote_ident(foreign_key), &prefix, keys)
            }
            RelationKind::ManyToMany {
                join_table,
                local_key,
                remote_key,
            } => {
                let keys = distinct(rows.iter().filter_map(|row| row.id()).collect());
                if keys.is_empty() {
                    EMPTY_SET.to_string()
                } else {
                    let inner = self.in_list(&quote_ident(local_key), &prefix, keys);
                    format!(
                        "{} IN (SELECT {} FROM {} WHERE {inner})",
                        quote_ident("id"),
                        quote_ident(remote_key),
                        quote_ident(join_table),
                    )
                }
            }
        };

        log::debug!(
            target: "namesake::relation",
            "constraining `{}` by {} `{}` row(s) ({:?})",
            target.name(),
            rows.len(),
            from.name(),
            relationship.kind
        );
        self.clauses.push(fragment);
        Ok(())
    }

    pub(crate) fn order_by(&mut self, expr: &str) {
        let expr = expr.trim();
        if !expr.is_empty() {
            self.order.push(expr.to_string());
        }
    }

    pub(crate) fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub(crate) fn offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let clauses: Vec<String> = self.clauses.iter().map(|c| format!("({c})")).collect();
        format!(" WHERE {}", clauses.join(" AND "))
    }

    pub(crate) fn order_sql(&self) -> String {
        if self.order.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", self.order.join(", "))
        }
    }

    /// `forced` replaces the configured limit (`SelectOne`).
    pub(crate) fn limit_sql(&self, forced: Option<u64>) -> String {
        match (forced.or(self.limit), self.offset) {
            (None, None) => String::new(),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (Some(limit), Some(offset)) => format!(" LIMIT {offset}, {limit}"),
            (None, Some(offset)) => format!(" LIMIT {offset}, {UNBOUNDED_LIMIT}"),
        }
    }

    /// Validate bindings for `sql` and pair it with the merged parameters.
    pub(crate) fn finish(&self, table: &str, sql: String, extra: Params) -> Result<Statement> {
        let mut params = self.params.clone();
        let mut conflicts = self.conflicts.clone();
        params.merge(extra, &mut conflicts);
        binding::check(table, &sql, &params, &conflicts)?;
        Ok(Statement::new(sql, params))
    }

    fn next_prefix(&mut self, base: &str) -> String {
        let prefix = format!("{base}{}", self.generated);
        self.generated += 1;
        prefix
    }

    fn in_list(&mut self, column: &str, prefix: &str, values: Vec<Value>) -> String {
        let mut generated = Params::new();
        let names: Vec<String> = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let name = format!("{prefix}_{i}");
                generated.insert(&name, value);
                format!(":{name}")
            })
            .collect();
        self.params.merge(generated, &mut self.conflicts);

        match names.as_slice() {
            [] => EMPTY_SET.to_string(),
            [single] => format!("{column} = {single}"),
            many => format!("{column} IN ({})", many.join(", ")),
        }
    }
}

const EMPTY_SET: &str = "0 = 1";

/// Non-null values, deduplicated by key, in first-seen order. The first
/// value seen for a key is bound as given.
fn distinct(values: Vec<Value>) -> Vec<Value> {
    let mut seen: IndexMap<Key, Value> = IndexMap::new();
    for value in values {
        if let Some(key) = value.key() {
            seen.entry(key).or_insert(value);
        }
    }
    seen.into_values().collect()
}

/// Filter methods shared by every builder that has a `WHERE` clause.
macro_rules! criteria_methods {
    ($builder:ident) => {
        impl $builder {
            /// Append an opaque SQL fragment. Multiple fragments are combined
            /// with `AND`, each wrapped in parentheses.
            ///
            /// `:name` placeholders in the fragment must be bound by `params`
            /// (or an earlier call); mismatches surface as
            /// [`NamesakeError::QueryBinding`](crate::NamesakeError::QueryBinding)
            /// when the statement is rendered.
            pub fn filter(
                mut self,
                fragment: impl AsRef<str>,
                params: impl $crate::query::IntoParams,
            ) -> Self {
                self.criteria.filter(fragment.as_ref(), params.into_params());
                self
            }

            /// Shorthand for `filter("id = :id", params! { "id" => id })`.
            pub fn by_id(self, id: impl Into<$crate::Value>) -> Self {
                let id: $crate::Value = id.into();
                self.filter("id = :id", $crate::params! { "id" => id })
            }

            /// Keep rows whose `field` is one of `values`. An empty list
            /// matches nothing.
            pub fn filter_in<V: Into<$crate::Value>>(
                mut self,
                field: &str,
                values: impl IntoIterator<Item = V>,
            ) -> Self {
                self.criteria
                    .filter_in(field, values.into_iter().map(Into::into).collect());
                self
            }

            /// Keep rows related to `source` (a row or a collection), using
            /// the relationship inferred between the two tables.
            ///
            /// # Errors
            ///
            /// Returns [`NamesakeError::RelationNotFound`](crate::NamesakeError::RelationNotFound)
            /// when no relationship can be inferred.
            pub fn related_with<S>(mut self, source: &S) -> $crate::Result<Self>
            where
                S: $crate::relation::RelationSource + ?Sized,
            {
                self.criteria.related_with(&self.entity, source)?;
                Ok(self)
            }
        }
    };
}

pub(crate) use criteria_methods;
