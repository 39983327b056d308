//! Entities: one table, its field descriptors and its query factories.

use crate::codec::{Codec, SharedCodec};
use crate::database::Database;
use crate::error::{NamesakeError, Result};
use crate::executor::RawRow;
use crate::query::{Count, Delete, Insert, IntoParams, SelectAll, SelectOne, Sum, Update};
use crate::row::Row;
use crate::schema::{FieldDescriptor, Fields};
use crate::value::Value;
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Attribute computed from a row instead of stored in it.
pub type ComputedAttribute = Rc<dyn Fn(&Row) -> Result<Value>>;

/// Per-table customisation handed out by entity resolvers.
///
/// # Examples
///
/// ```
/// use namesake::codec::FnCodec;
/// use namesake::{EntityBehavior, Value};
///
/// let behavior = EntityBehavior::new()
///     .codec("slug", FnCodec::new("slug", Ok, Ok))
///     .computed("excerpt", |row| {
///         let body = row.value("body").unwrap_or_default();
///         Ok(Value::from(body.as_str().unwrap_or_default().chars().take(40).collect::<String>()))
///     });
/// # let _ = behavior;
/// ```
#[derive(Clone, Default)]
pub struct EntityBehavior {
    codecs: HashMap<String, SharedCodec>,
    computed: HashMap<String, ComputedAttribute>,
}

impl EntityBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `codec` for `field`, ahead of every registry rule.
    pub fn codec(mut self, field: impl Into<String>, codec: impl Codec + 'static) -> Self {
        self.codecs.insert(field.into(), Arc::new(codec));
        self
    }

    /// Expose `name` on rows, computed on each access.
    pub fn computed(
        mut self,
        name: impl Into<String>,
        compute: impl Fn(&Row) -> Result<Value> + 'static,
    ) -> Self {
        self.computed.insert(name.into(), Rc::new(compute));
        self
    }

    pub(crate) fn field_codec(&self, field: &str) -> Option<SharedCodec> {
        self.codecs.get(field).cloned()
    }

    pub(crate) fn computed_attribute(&self, name: &str) -> Option<ComputedAttribute> {
        self.computed.get(name).cloned()
    }
}

impl fmt::Debug for EntityBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBehavior")
            .field("codecs", &self.codecs.keys().collect::<Vec<_>>())
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Cached definition of one table, shared by every handle to it.
pub(crate) struct EntityDef {
    name: String,
    behavior: EntityBehavior,
    fields: OnceCell<Rc<Fields>>,
}

impl EntityDef {
    pub(crate) fn new(name: impl Into<String>, behavior: EntityBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            fields: OnceCell::new(),
        }
    }
}

/// Handle to one table.
///
/// Obtained from [`Database::entity`]; cheap to clone. All handles to the
/// same table share one definition (and one field cache) until
/// [`Database::clear_cache`].
#[derive(Clone)]
pub struct Entity {
    db: Database,
    def: Rc<EntityDef>,
}

impl Entity {
    pub(crate) fn new(db: Database, def: Rc<EntityDef>) -> Self {
        Self { db, def }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn behavior(&self) -> &EntityBehavior {
        &self.def.behavior
    }

    /// Shared attribute of the database context (read-only here).
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.db.attribute(name)
    }

    /// Field descriptors, computed from introspection on first call.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::Introspection`] if the columns cannot be read.
    pub fn fields(&self) -> Result<Rc<Fields>> {
        self.def
            .fields
            .get_or_try_init(|| {
                let columns = self.db.columns(self.name())?;
                let fields: Fields = columns
                    .iter()
                    .map(|column| FieldDescriptor {
                        name: column.name.clone(),
                        raw_type: column.raw_type.clone(),
                        codec: self.codec_by_rules(&column.name, &column.raw_type),
                    })
                    .collect();
                log::debug!(
                    target: "namesake::cache",
                    "computed {} field descriptor(s) for `{}`",
                    fields.len(),
                    self.name()
                );
                Ok::<_, NamesakeError>(Rc::new(fields))
            })
            .map(Rc::clone)
    }

    pub fn select_one(&self) -> SelectOne {
        SelectOne::new(self.clone())
    }

    pub fn select_all(&self) -> SelectAll {
        SelectAll::new(self.clone())
    }

    pub fn insert(&self) -> Insert {
        Insert::new(self.clone())
    }

    pub fn update(&self) -> Update {
        Update::new(self.clone())
    }

    pub fn delete(&self) -> Delete {
        Delete::new(self.clone())
    }

    pub fn count(&self) -> Count {
        Count::new(self.clone())
    }

    pub fn sum(&self, field: impl Into<String>) -> Sum {
        Sum::new(self.clone(), field)
    }

    /// Fetch a row by id; `None` when it does not exist.
    pub fn get(&self, id: impl Into<Value>) -> Result<Option<Row>> {
        self.select_one().by_id(id).get()
    }

    pub fn has(&self, id: impl Into<Value>) -> Result<bool> {
        Ok(self.count().by_id(id).get()? > 0)
    }

    /// Write `data` under `id` and return the stored row.
    ///
    /// Inserts when `id` is null or no row has it (keeping `id` in the
    /// latter case), updates otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::MissingPrimaryKey`] when an insert without
    /// `id` yields no generated key, or any codec or query error.
    pub fn set(&self, id: impl Into<Value>, data: impl IntoParams) -> Result<Row> {
        let id = id.into();
        let mut data = data.into_params();

        let id = if !id.is_null() && self.has(id.clone())? {
            self.update().by_id(id.clone()).data(data).get()?;
            id
        } else {
            if !id.is_null() {
                data.insert("id", id.clone());
            }
            match self.insert().data(data).get()? {
                Some(generated) if id.is_null() => generated,
                None if id.is_null() => {
                    return Err(NamesakeError::MissingPrimaryKey {
                        table: self.name().to_string(),
                    })
                }
                _ => id,
            }
        };

        self.get(id.clone())?
            .ok_or_else(|| NamesakeError::UnexpectedResult {
                table: self.name().to_string(),
                operation: "set",
                detail: format!("row {id} not found after write"),
            })
    }

    /// Delete the row with `id`, returning the number of rows removed.
    pub fn unset(&self, id: impl Into<Value>) -> Result<u64> {
        self.delete().by_id(id).get()
    }

    /// Build an unsaved row from `data`.
    ///
    /// Values go through encode then decode, so the row holds exactly what a
    /// fetch of the same data would.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::Codec`] when a value is rejected.
    pub fn create(&self, data: impl IntoParams) -> Result<Row> {
        let mut values = IndexMap::new();
        for (field, value) in data.into_params() {
            let stored = self.encode_field(&field, value)?;
            let decoded = self.decode_field(&field, stored)?;
            values.insert(field, decoded);
        }
        Ok(Row::new(self.clone(), values))
    }

    /// Codec for `field`: its descriptor when it is a known column,
    /// otherwise the naming rules.
    pub fn codec_for(&self, field: &str) -> Result<SharedCodec> {
        let fields = self.fields()?;
        Ok(match fields.get(field) {
            Some(descriptor) => Arc::clone(&descriptor.codec),
            None => self.codec_by_rules(field, ""),
        })
    }

    pub(crate) fn encode_field(&self, field: &str, value: Value) -> Result<Value> {
        self.codec_for(field)?
            .encode(value)
            .map_err(|source| NamesakeError::Codec {
                field: field.to_string(),
                source,
            })
    }

    pub(crate) fn decode_field(&self, field: &str, value: Value) -> Result<Value> {
        self.codec_for(field)?
            .decode(value)
            .map_err(|source| NamesakeError::Codec {
                field: field.to_string(),
                source,
            })
    }

    pub(crate) fn decode_row(&self, raw: RawRow<'_>) -> Result<Row> {
        self.decode_pairs(raw.iter())
    }

    pub(crate) fn decode_pairs<'a>(
        &self,
        pairs: impl Iterator<Item = (&'a str, &'a Value)>,
    ) -> Result<Row> {
        let mut values = IndexMap::new();
        for (column, value) in pairs {
            values.insert(column.to_string(), self.decode_field(column, value.clone())?);
        }
        Ok(Row::new(self.clone(), values))
    }

    fn codec_by_rules(&self, field: &str, raw_type: &str) -> SharedCodec {
        self.def
            .behavior
            .field_codec(field)
            .unwrap_or_else(|| self.db.codecs().resolve(field, raw_type))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("name", &self.name()).finish()
    }
}
