//! Schema metadata: the view the relationship resolver reads, and the
//! per-entity field descriptors.

use crate::codec::SharedCodec;
use crate::error::Result;
use crate::executor::{ColumnInfo, ExecutionError, Introspector};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// Table and field names, as far as relationship inference needs them.
///
/// Implemented by [`Database`](crate::Database) (over cached introspection
/// results) and by [`StaticSchema`].
pub trait SchemaView {
    /// Whether `table` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be read.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Field names of `table`; empty when the table does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be read.
    fn field_names(&self, table: &str) -> Result<Vec<String>>;
}

impl<T: SchemaView + ?Sized> SchemaView for &T {
    fn table_exists(&self, table: &str) -> Result<bool> {
        (**self).table_exists(table)
    }

    fn field_names(&self, table: &str) -> Result<Vec<String>> {
        (**self).field_names(table)
    }
}

/// In-memory schema.
///
/// Handy for reasoning about relationships without a connection, and usable
/// as the [`Introspector`] of a [`Database`](crate::Database) whose driver
/// cannot describe itself.
///
/// # Examples
///
/// ```
/// use namesake::relation::{resolve, RelationKind};
/// use namesake::StaticSchema;
///
/// let schema = StaticSchema::new()
///     .table("category", ["id", "name"])
///     .table("post", ["id", "category_id", "title"]);
///
/// let relationship = resolve("post", "category", &schema).unwrap();
/// assert!(matches!(relationship.kind, RelationKind::Direct { .. }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    tables: BTreeMap<String, Vec<ColumnInfo>>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table whose columns have no declared type.
    pub fn table<I, S>(self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = fields
            .into_iter()
            .map(|field| ColumnInfo::new(field, ""))
            .collect();
        self.table_with_types(name, columns)
    }

    /// Add a table with typed columns.
    pub fn table_with_types(mut self, name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        self.tables.insert(name.into(), columns);
        self
    }
}

impl SchemaView for StaticSchema {
    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains_key(table))
    }

    fn field_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .tables
            .get(table)
            .map(|columns| columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default())
    }
}

impl Introspector for StaticSchema {
    fn list_tables(&self) -> Result<BTreeSet<String>, ExecutionError> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }
}

/// One field of an entity and the codec its values pass through.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub raw_type: String,
    pub codec: SharedCodec,
}

impl FieldDescriptor {
    /// Name of the codec (`integer`, `datetime`, `identity`, ...).
    pub fn kind(&self) -> &'static str {
        self.codec.name()
    }
}

/// Field descriptors of an entity, in column order.
#[derive(Debug, Clone, Default)]
pub struct Fields(IndexMap<String, FieldDescriptor>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.0.values()
    }
}

impl FromIterator<FieldDescriptor> for Fields {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        Fields(iter.into_iter().map(|f| (f.name.clone(), f)).collect())
    }
}
