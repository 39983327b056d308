//! Decoded rows.
//!
//! A [`Row`] is a cheap shared handle: cloning it clones an `Rc`, so the
//! same row can sit in several collections and relation memos. Field values
//! are held already decoded by the entity's codecs.
//!
//! Relations are resolved on first access and memoized on the row for its
//! whole lifetime. A fresh select yields fresh rows with empty memos.

pub mod collection;

pub use collection::RowCollection;

use crate::entity::Entity;
use crate::error::{NamesakeError, Result};
use crate::json_helpers::object_from_pairs;
use crate::params;
use crate::query::params::Params;
use crate::query::quote_ident;
use crate::relation::eager;
use crate::relation::lazy::{Related, Relation};
use crate::relation::resolver::{resolve, RelationKind};
use crate::value::{Key, Value};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Result of [`Row::get`]
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A stored field or a computed attribute
    Value(Value),
    /// A to-one relation
    One(Option<Row>),
    /// A to-many relation
    Many(RowCollection),
}

impl Attribute {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_one(&self) -> Option<&Row> {
        match self {
            Attribute::One(row) => row.as_ref(),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&RowCollection> {
        match self {
            Attribute::Many(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<Related> for Attribute {
    fn from(related: Related) -> Self {
        match related {
            Related::One(row) => Attribute::One(row),
            Related::Many(rows) => Attribute::Many(rows),
        }
    }
}

/// One record of an entity.
#[derive(Clone)]
pub struct Row(Rc<RowInner>);

struct RowInner {
    entity: Entity,
    values: RefCell<IndexMap<String, Value>>,
    memo: RefCell<HashMap<String, Related>>,
}

impl Row {
    pub(crate) fn new(entity: Entity, values: IndexMap<String, Value>) -> Self {
        Row(Rc::new(RowInner {
            entity,
            values: RefCell::new(values),
            memo: RefCell::new(HashMap::new()),
        }))
    }

    pub fn entity(&self) -> &Entity {
        &self.0.entity
    }

    /// Table the row belongs to.
    pub fn table(&self) -> &str {
        self.0.entity.name()
    }

    /// Decoded value of a stored field.
    pub fn value(&self, field: &str) -> Option<Value> {
        self.0.values.borrow().get(field).cloned()
    }

    /// Primary key value; `None` while unsaved.
    pub fn id(&self) -> Option<Value> {
        self.value("id").filter(|id| !id.is_null())
    }

    pub fn key(&self) -> Option<Key> {
        self.id().and_then(|id| id.key())
    }

    /// Names of the stored fields, in column order.
    pub fn fields(&self) -> Vec<String> {
        self.0.values.borrow().keys().cloned().collect()
    }

    /// Snapshot of every stored field.
    pub fn values(&self) -> IndexMap<String, Value> {
        self.0.values.borrow().clone()
    }

    /// Change a field locally. Nothing is written until [`save`](Self::save).
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.values.borrow_mut().insert(field.into(), value.into());
    }

    /// Shared attribute of the database context.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.0.entity.attribute(name)
    }

    /// Look up `name` as a field, then as a computed attribute, then as a
    /// relation (resolved once, then memoized).
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::RelationNotFound`] when `name` is neither a
    /// field, a computed attribute nor a related table.
    pub fn get(&self, name: &str) -> Result<Attribute> {
        if let Some(value) = self.value(name) {
            return Ok(Attribute::Value(value));
        }
        if let Some(computed) = self.0.entity.behavior().computed_attribute(name) {
            return computed(self).map(Attribute::Value);
        }
        self.related(name).map(Attribute::from)
    }

    /// Handle to relation `name`.
    pub fn relation(&self, name: impl Into<String>) -> Relation {
        Relation::new(self.clone(), name)
    }

    /// Resolve relation `name`, running one query the first time.
    ///
    /// # Errors
    ///
    /// See [`Relation::get`].
    pub fn related(&self, name: &str) -> Result<Related> {
        if let Some(related) = self.memo(name) {
            return Ok(related);
        }
        eager::load(&RowCollection::single(self.clone()), name)?;
        self.memo(name)
            .ok_or_else(|| NamesakeError::relation_not_found(self.table(), name))
    }

    /// Insert the row when it has no id (and take the generated one),
    /// update it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::EmptyPayload`] when there is nothing to
    /// write, or any codec or query error.
    pub fn save(&self) -> Result<()> {
        let entity = self.entity();
        let data: Params = self
            .0
            .values
            .borrow()
            .iter()
            .filter(|(field, _)| field.as_str() != "id")
            .map(|(field, value)| (field.as_str(), value.clone()))
            .collect();

        match self.id() {
            None => {
                if let Some(id) = entity.insert().data(data).get()? {
                    let id = entity.decode_field("id", id)?;
                    let mut values = self.0.values.borrow_mut();
                    if values.contains_key("id") {
                        values.insert("id".to_string(), id);
                    } else {
                        values.shift_insert(0, "id".to_string(), id);
                    }
                }
            }
            Some(id) => {
                entity.update().by_id(id).data(data).get()?;
            }
        }
        Ok(())
    }

    /// Delete the row by id.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::MissingPrimaryKey`] for an unsaved row.
    pub fn delete(&self) -> Result<u64> {
        let id = self.require_id()?;
        self.entity().delete().by_id(id).get()
    }

    /// Link this row to `other`.
    ///
    /// - many-to-many: one row is inserted into the join table,
    /// - direct: this row's foreign key is set and the row saved,
    /// - reverse: `other`'s foreign key is set and `other` saved.
    ///
    /// Relation memos already resolved are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::RelationNotFound`] for unrelated tables and
    /// [`NamesakeError::MissingPrimaryKey`] when a needed id is missing.
    pub fn relate(&self, other: &Row) -> Result<()> {
        let db = self.entity().database();
        match resolve(self.table(), other.table(), db)?.kind {
            RelationKind::ManyToMany {
                join_table,
                local_key,
                remote_key,
            } => {
                let data = params! {
                    local_key.as_str() => self.require_id()?,
                    remote_key.as_str() => other.require_id()?,
                };
                db.entity(&join_table)?.insert().data(data).get()?;
                Ok(())
            }
            RelationKind::Direct { foreign_key } => {
                self.set(foreign_key, other.require_id()?);
                self.save()
            }
            RelationKind::Reverse { foreign_key } => {
                other.set(foreign_key, self.require_id()?);
                other.save()
            }
        }
    }

    /// Undo [`relate`](Self::relate): delete the join row, or null the
    /// foreign key and save.
    ///
    /// # Errors
    ///
    /// As [`relate`](Self::relate).
    pub fn unrelate(&self, other: &Row) -> Result<()> {
        let db = self.entity().database();
        match resolve(self.table(), other.table(), db)?.kind {
            RelationKind::ManyToMany {
                join_table,
                local_key,
                remote_key,
            } => {
                let fragment = format!(
                    "{} = :local AND {} = :remote",
                    quote_ident(&local_key),
                    quote_ident(&remote_key)
                );
                db.entity(&join_table)?
                    .delete()
                    .filter(
                        fragment,
                        params! { "local" => self.require_id()?, "remote" => other.require_id()? },
                    )
                    .get()?;
                Ok(())
            }
            RelationKind::Direct { foreign_key } => {
                self.set(foreign_key, Value::Null);
                self.save()
            }
            RelationKind::Reverse { foreign_key } => {
                other.set(foreign_key, Value::Null);
                other.save()
            }
        }
    }

    /// The stored fields as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let values = self.0.values.borrow();
        object_from_pairs(values.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Whether both handles point at the same row object.
    pub fn ptr_eq(&self, other: &Row) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn memo(&self, name: &str) -> Option<Related> {
        self.0.memo.borrow().get(name).cloned()
    }

    pub(crate) fn store_memo(&self, name: &str, related: Related) {
        self.0.memo.borrow_mut().insert(name.to_string(), related);
    }

    fn require_id(&self) -> Result<Value> {
        self.id().ok_or_else(|| NamesakeError::MissingPrimaryKey {
            table: self.table().to_string(),
        })
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("table", &self.table())
            .field("values", &*self.0.values.borrow())
            .finish()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
