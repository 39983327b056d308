//! Ordered, id-keyed row collections.

use super::Row;
use crate::entity::Entity;
use crate::error::{NamesakeError, Result};
use crate::executor::ResultSet;
use crate::relation::eager;
use crate::value::{Key, Value};
use indexmap::IndexMap;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

/// Rows of one entity, in result order, keyed by primary key.
///
/// Relation access on a collection resolves every member in a single
/// query; see [`related`](Self::related).
#[derive(Clone)]
pub struct RowCollection {
    entity: Entity,
    rows: IndexMap<Key, Row>,
}

impl RowCollection {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            rows: IndexMap::new(),
        }
    }

    pub(crate) fn single(row: Row) -> Self {
        let mut rows = Self::new(row.entity().clone());
        rows.insert(row);
        rows
    }

    /// Decode every row of `result`.
    pub(crate) fn from_result(entity: &Entity, result: &ResultSet) -> Result<Self> {
        let mut rows = Self::new(entity.clone());
        for raw in result.iter() {
            rows.insert(entity.decode_row(raw)?);
        }
        Ok(rows)
    }

    /// Add `row` unless a row with the same key is already present. Rows
    /// without an id are keyed by position.
    pub(crate) fn insert(&mut self, row: Row) -> bool {
        let key = row
            .key()
            .unwrap_or_else(|| Key::Text(format!("#{}", self.rows.len())));
        if self.rows.contains_key(&key) {
            return false;
        }
        self.rows.insert(key, row);
        true
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.rows.keys()
    }

    pub fn get(&self, key: &Key) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.rows.contains_key(key)
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first().map(|(_, row)| row)
    }

    pub fn last(&self) -> Option<&Row> {
        self.rows.last().map(|(_, row)| row)
    }

    /// Value of `field` for every row (`Null` where absent).
    pub fn values(&self, field: &str) -> Vec<Value> {
        self.iter()
            .map(|row| row.value(field).unwrap_or_default())
            .collect()
    }

    /// Primary keys of the saved rows.
    pub fn ids(&self) -> Vec<Key> {
        self.iter().filter_map(Row::key).collect()
    }

    /// Rows matching `predicate`, sharing the same row objects.
    pub fn filter(&self, predicate: impl Fn(&Row) -> bool) -> Self {
        Self {
            entity: self.entity.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(_, row)| predicate(row))
                .map(|(key, row)| (key.clone(), row.clone()))
                .collect(),
        }
    }

    /// Append a saved row. A row already present (same id) is kept.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::MissingPrimaryKey`] for a row without id.
    pub fn push(&mut self, row: Row) -> Result<bool> {
        if row.key().is_none() {
            return Err(NamesakeError::MissingPrimaryKey {
                table: row.table().to_string(),
            });
        }
        Ok(self.insert(row))
    }

    /// Delete every saved row of the collection in one statement.
    pub fn delete(&self) -> Result<u64> {
        let ids: Vec<Value> = self.ids().into_iter().map(Value::from).collect();
        self.entity.delete().filter_in("id", ids).get()
    }

    /// Resolve relation `name` for every member with one query and return
    /// the related rows, deduplicated by id.
    ///
    /// Members that already resolved the relation are skipped; when all of
    /// them have, nothing is queried. Each member's result is memoized, so a
    /// later `row.get(name)` is free.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::RelationNotFound`] when the tables are not
    /// related, or any query error.
    pub fn related(&self, name: &str) -> Result<RowCollection> {
        eager::load(self, name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(Row::to_json).collect())
    }
}

impl fmt::Debug for RowCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCollection")
            .field("table", &self.entity.name())
            .field("keys", &self.rows.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> IntoIterator for &'a RowCollection {
    type Item = &'a Row;
    type IntoIter = indexmap::map::Values<'a, Key, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.values()
    }
}

impl IntoIterator for RowCollection {
    type Item = Row;
    type IntoIter = indexmap::map::IntoValues<Key, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_values()
    }
}

impl Serialize for RowCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for row in self.iter() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}
