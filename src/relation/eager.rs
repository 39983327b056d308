//! Batched relation loading.
//!
//! Resolving a relation for a collection costs one query, whatever the
//! collection size:
//!
//! 1. infer the relationship between the owner and target tables,
//! 2. collect the keys of every member that has no memo for the relation,
//! 3. fetch all related rows at once,
//! 4. partition them by key onto each owner's memo; owners without a match
//!    get an explicit empty result.
//!
//! Direct and reverse relationships reuse `related_with` on a
//! [`SelectAll`](crate::query::SelectAll). Many-to-many relationships join
//! through the join table and select the owner key alongside each row, so
//! the partition does not need a second round trip.

use crate::entity::Entity;
use crate::error::Result;
use crate::query::criteria::Criteria;
use crate::query::quote_ident;
use crate::relation::lazy::Related;
use crate::relation::resolver::{resolve, RelationKind};
use crate::row::{Row, RowCollection};
use crate::value::{Key, Value};
use std::collections::HashMap;

/// Column carrying the owner key in many-to-many batches.
pub const RELATION_KEY: &str = "__relation_key";

/// Resolve relation `name` for every member of `rows` and return the union
/// of the related rows (deduplicated by id).
///
/// Members that already hold a memo for `name` are not queried again; when
/// all of them do, no query runs.
///
/// # Errors
///
/// Returns [`NamesakeError::RelationNotFound`](crate::NamesakeError::RelationNotFound)
/// when the tables are not related, or any query error. Memos are only
/// written once the fetch succeeded.
pub fn load(rows: &RowCollection, name: &str) -> Result<RowCollection> {
    let owner = rows.entity();
    let db = owner.database();
    let relationship = resolve(owner.name(), name, db)?;
    let target = db.entity(name)?;

    let pending = rows.filter(|row| row.memo(name).is_none());
    if !pending.is_empty() || rows.is_empty() {
        let fetched = match &relationship.kind {
            RelationKind::Direct { foreign_key } => {
                let found = target.select_all().related_with(&pending)?.get()?;
                assign_direct(&pending, name, foreign_key, &found)
            }
            RelationKind::Reverse { foreign_key } => {
                let found = target.select_all().related_with(&pending)?.get()?;
                let groups = group_by(&target, found.iter().map(|row| {
                    (row.value(foreign_key).and_then(|v| v.key()), row.clone())
                }));
                assign_many(&pending, name, &target, groups)
            }
            RelationKind::ManyToMany {
                join_table,
                local_key,
                remote_key,
            } => {
                let pairs = fetch_through(&target, join_table, local_key, remote_key, &pending)?;
                let groups = group_by(&target, pairs.into_iter());
                assign_many(&pending, name, &target, groups)
            }
        };
        log::debug!(
            target: "namesake::relation",
            "resolved `{}` -> `{name}` ({:?}) for {} row(s): {fetched} related row(s)",
            owner.name(),
            relationship.kind,
            pending.len(),
        );
    }

    let mut union = RowCollection::new(target);
    for row in rows.iter() {
        if let Some(related) = row.memo(name) {
            for related_row in related.rows() {
                union.insert(related_row);
            }
        }
    }
    Ok(union)
}

fn assign_direct(pending: &RowCollection, name: &str, foreign_key: &str, found: &RowCollection) -> usize {
    for row in pending.iter() {
        let target = row
            .value(foreign_key)
            .and_then(|v| v.key())
            .and_then(|key| found.get(&key).cloned());
        row.store_memo(name, Related::One(target));
    }
    found.len()
}

fn assign_many(
    pending: &RowCollection,
    name: &str,
    target: &Entity,
    mut groups: HashMap<Key, RowCollection>,
) -> usize {
    let fetched = groups.values().map(RowCollection::len).sum();
    for row in pending.iter() {
        let related = row
            .key()
            .and_then(|key| groups.remove(&key))
            .unwrap_or_else(|| RowCollection::new(target.clone()));
        row.store_memo(name, Related::Many(related));
    }
    fetched
}

fn group_by(
    target: &Entity,
    pairs: impl Iterator<Item = (Option<Key>, Row)>,
) -> HashMap<Key, RowCollection> {
    let mut groups: HashMap<Key, RowCollection> = HashMap::new();
    for (key, row) in pairs {
        if let Some(key) = key {
            groups
                .entry(key)
                .or_insert_with(|| RowCollection::new(target.clone()))
                .insert(row);
        }
    }
    groups
}

/// Fetch target rows through the join table, each paired with the key of
/// the owner it belongs to.
fn fetch_through(
    target: &Entity,
    join_table: &str,
    local_key: &str,
    remote_key: &str,
    owners: &RowCollection,
) -> Result<Vec<(Option<Key>, Row)>> {
    let table = quote_ident(target.name());
    let join = quote_ident(join_table);
    let local = format!("{join}.{}", quote_ident(local_key));

    let mut criteria = Criteria::default();
    criteria.filter_in_expr(
        &local,
        "__related",
        owners.iter().filter_map(Row::id).collect::<Vec<Value>>(),
    );
    let sql = format!(
        "SELECT {table}.*, {local} AS {} FROM {table} INNER JOIN {join} ON {join}.{} = {table}.{}{}",
        quote_ident(RELATION_KEY),
        quote_ident(remote_key),
        quote_ident("id"),
        criteria.where_sql(),
    );
    let statement = criteria.finish(target.name(), sql, Default::default())?;
    let result = target.database().execute_statement(&statement)?;

    // A target row reached through several owners is decoded once and shared.
    let mut shared: HashMap<Key, Row> = HashMap::new();
    let mut pairs = Vec::with_capacity(result.len());
    for raw in result.iter() {
        let key = raw.get(RELATION_KEY).and_then(Value::key);
        let row = target.decode_pairs(raw.iter().filter(|(column, _)| *column != RELATION_KEY))?;
        let row = match row.key() {
            Some(id) => shared.entry(id).or_insert(row).clone(),
            None => row,
        };
        pairs.push((key, row));
    }
    Ok(pairs)
}
