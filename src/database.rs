//! The database context.
//!
//! A [`Database`] owns everything the other layers share: the executor, the
//! introspector, the codec registry, the entity resolvers, the shared
//! attributes, and the entity/schema caches. It is a cheap `Rc` handle;
//! entities and rows keep a clone, so the context lives as long as anything
//! derived from it.
//!
//! # Example
//!
//! ```
//! use namesake::{params, Database, SqliteExecutor};
//!
//! let sqlite = SqliteExecutor::open_in_memory().unwrap();
//! sqlite
//!     .execute_batch(
//!         "CREATE TABLE category (id INTEGER PRIMARY KEY, name TEXT);
//!          CREATE TABLE post (id INTEGER PRIMARY KEY, category_id INTEGER, title TEXT);
//!          INSERT INTO category (id, name) VALUES (1, 'news');
//!          INSERT INTO post (category_id, title) VALUES (1, 'a'), (1, 'b');",
//!     )
//!     .unwrap();
//!
//! let db = Database::new(sqlite);
//! let category = db.entity("category").unwrap().get(1).unwrap().unwrap();
//! let posts = category.get("post").unwrap();
//! assert_eq!(posts.as_many().map(|p| p.len()), Some(2));
//! ```

use crate::codec::{Codec, CodecRegistry};
use crate::entity::{Entity, EntityBehavior, EntityDef};
use crate::error::{NamesakeError, Result};
use crate::executor::{ColumnInfo, Executor, Introspector, ResultSet};
use crate::query::params::Params;
use crate::query::Statement;
use crate::relation::resolver::{resolve, Relationship};
use crate::schema::{SchemaView, StaticSchema};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

#[cfg(feature = "sqlite")]
use crate::config::Settings;
#[cfg(feature = "sqlite")]
use crate::executor::SqliteExecutor;
#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Picks the behaviour of an entity by table name; `None` defers to the
/// next resolver.
pub type EntityResolver = Box<dyn Fn(&str) -> Option<EntityBehavior>>;

/// Handle to a database context
#[derive(Clone)]
pub struct Database {
    shared: Rc<Shared>,
}

struct Shared {
    executor: Box<dyn Executor>,
    introspector: Box<dyn Introspector>,
    codecs: CodecRegistry,
    resolvers: Vec<EntityResolver>,
    log_queries: bool,
    attributes: RefCell<HashMap<String, Value>>,
    entities: RefCell<HashMap<String, Rc<EntityDef>>>,
    tables: RefCell<Option<Rc<BTreeSet<String>>>>,
    columns: RefCell<HashMap<String, Rc<Vec<ColumnInfo>>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        log::debug!(
            target: "namesake::cache",
            "dropping database context ({} cached entity definition(s))",
            self.entities.get_mut().len()
        );
    }
}

impl Database {
    /// Context over one connection that both executes and introspects.
    pub fn new<C>(connection: C) -> Self
    where
        C: Executor + Introspector + 'static,
    {
        let connection = Rc::new(connection);
        DatabaseBuilder::new(Rc::clone(&connection))
            .introspector(connection)
            .build()
    }

    pub fn builder(executor: impl Executor + 'static) -> DatabaseBuilder {
        DatabaseBuilder::new(executor)
    }

    /// Open the SQLite database named by `settings.database.url` and seed
    /// the shared attributes.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::Connection`] if the database cannot be opened.
    #[cfg(feature = "sqlite")]
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings.database.url.as_str();
        let sqlite = if url.is_empty() || url == ":memory:" {
            SqliteExecutor::open_in_memory()
        } else {
            SqliteExecutor::open(url.strip_prefix("sqlite://").unwrap_or(url))
        }
        .map_err(|source| NamesakeError::Connection {
            url: url.to_string(),
            source,
        })?;
        log::info!(target: "namesake::database", "opened sqlite database `{url}`");

        let sqlite = Rc::new(sqlite);
        let mut builder = DatabaseBuilder::new(Rc::clone(&sqlite))
            .introspector(sqlite)
            .log_queries(settings.database.log_queries);
        for (name, value) in settings.attribute_values() {
            builder = builder.attribute(name, value);
        }
        Ok(builder.build())
    }

    /// Handle to the entity for `name`.
    ///
    /// The first resolver returning a behaviour wins; without one the table
    /// must exist. The definition is cached until [`clear_cache`](Self::clear_cache).
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::EntityNotFound`] for an unknown table.
    pub fn entity(&self, name: &str) -> Result<Entity> {
        if let Some(def) = self.shared.entities.borrow().get(name) {
            return Ok(Entity::new(self.clone(), Rc::clone(def)));
        }

        let behavior = match self.shared.resolvers.iter().find_map(|resolver| resolver(name)) {
            Some(behavior) => behavior,
            None if self.table_exists(name)? => EntityBehavior::default(),
            None => return Err(NamesakeError::EntityNotFound(name.to_string())),
        };

        let def = Rc::new(EntityDef::new(name, behavior));
        self.shared
            .entities
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&def));
        log::debug!(target: "namesake::cache", "created entity definition for `{name}`");
        Ok(Entity::new(self.clone(), def))
    }

    /// Relationship inferred from `from` to `to`.
    pub fn relationship(&self, from: &str, to: &str) -> Result<Relationship> {
        resolve(from, to, self)
    }

    /// Every table, read once from the introspector.
    pub fn tables(&self) -> Result<Rc<BTreeSet<String>>> {
        if let Some(tables) = self.shared.tables.borrow().as_ref() {
            return Ok(Rc::clone(tables));
        }
        let tables = Rc::new(
            self.shared
                .introspector
                .list_tables()
                .map_err(NamesakeError::Introspection)?,
        );
        log::debug!(target: "namesake::cache", "cached {} table name(s)", tables.len());
        *self.shared.tables.borrow_mut() = Some(Rc::clone(&tables));
        Ok(tables)
    }

    /// Columns of `table`, read once from the introspector.
    pub fn columns(&self, table: &str) -> Result<Rc<Vec<ColumnInfo>>> {
        if let Some(columns) = self.shared.columns.borrow().get(table) {
            return Ok(Rc::clone(columns));
        }
        let columns = Rc::new(
            self.shared
                .introspector
                .list_columns(table)
                .map_err(NamesakeError::Introspection)?,
        );
        self.shared
            .columns
            .borrow_mut()
            .insert(table.to_string(), Rc::clone(&columns));
        Ok(columns)
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.shared.codecs
    }

    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.shared.attributes.borrow().get(name).cloned()
    }

    /// Set a shared attribute, visible through every entity and row of this
    /// context.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.shared
            .attributes
            .borrow_mut()
            .insert(name.into(), value.into());
    }

    /// Drop the entity, table and column caches. Results are unaffected;
    /// the next access recomputes them.
    pub fn clear_cache(&self) {
        let entities = self.shared.entities.borrow_mut().drain().count();
        self.shared.tables.borrow_mut().take();
        self.shared.columns.borrow_mut().clear();
        log::debug!(target: "namesake::cache", "cleared {entities} cached entity definition(s)");
    }

    /// Run `sql` through the executor.
    ///
    /// # Errors
    ///
    /// Returns [`NamesakeError::Execution`] carrying the statement.
    pub fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();

        let start = Instant::now();
        let result = self.shared.executor.execute(sql, params);
        let elapsed = start.elapsed();

        if self.shared.log_queries {
            log::info!(target: "namesake::sql", "{sql} ({elapsed:?})");
        } else {
            log::debug!(target: "namesake::sql", "{sql} ({elapsed:?})");
        }
        if !params.is_empty() {
            log::trace!(target: "namesake::sql", "params: {params:?}");
        }

        result.map_err(|source| {
            log::debug!(target: "namesake::sql", "statement failed: {source}");
            NamesakeError::Execution {
                sql: sql.to_string(),
                source,
            }
        })
    }

    pub fn execute_statement(&self, statement: &Statement) -> Result<ResultSet> {
        self.execute(&statement.sql, &statement.params)
    }

    /// Whether two handles share the same context.
    pub fn ptr_eq(&self, other: &Database) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl SchemaView for Database {
    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables()?.contains(table))
    }

    fn field_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.columns(table)?.iter().map(|c| c.name.clone()).collect())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("entities", &self.shared.entities.borrow().keys().collect::<Vec<_>>())
            .field("log_queries", &self.shared.log_queries)
            .finish()
    }
}

/// Builder for [`Database`]
///
/// ```
/// use namesake::codec::FnCodec;
/// use namesake::executor::{ExecutionError, Executor, ResultSet};
/// use namesake::{Database, EntityBehavior, Params, StaticSchema};
///
/// struct Offline;
/// impl Executor for Offline {
///     fn execute(&self, _: &str, _: &Params) -> Result<ResultSet, ExecutionError> {
///         Err(ExecutionError::Other("offline".into()))
///     }
/// }
///
/// let db = Database::builder(Offline)
///     .introspector(StaticSchema::new().table("post", ["id", "title"]))
///     .codec_for_field("title", FnCodec::new("title", Ok, Ok))
///     .resolver(|name| (name == "post").then(EntityBehavior::new))
///     .attribute("locale", "en")
///     .build();
///
/// assert!(db.entity("post").is_ok());
/// assert!(db.entity("ghost").is_err());
/// ```
pub struct DatabaseBuilder {
    executor: Box<dyn Executor>,
    introspector: Option<Box<dyn Introspector>>,
    codecs: CodecRegistry,
    resolvers: Vec<EntityResolver>,
    attributes: HashMap<String, Value>,
    log_queries: bool,
}

impl DatabaseBuilder {
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self {
            executor: Box::new(executor),
            introspector: None,
            codecs: CodecRegistry::new(),
            resolvers: Vec::new(),
            attributes: HashMap::new(),
            log_queries: false,
        }
    }

    /// Schema source. Defaults to an empty [`StaticSchema`].
    pub fn introspector(mut self, introspector: impl Introspector + 'static) -> Self {
        self.introspector = Some(Box::new(introspector));
        self
    }

    pub fn codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Register a codec for every field named `field`.
    pub fn codec_for_field(mut self, field: impl Into<String>, codec: impl Codec + 'static) -> Self {
        self.codecs.register_field(field, codec);
        self
    }

    /// Append an entity resolver; resolvers are consulted in order.
    pub fn resolver(mut self, resolver: impl Fn(&str) -> Option<EntityBehavior> + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Log every statement at `info` instead of `debug`.
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub fn build(self) -> Database {
        log::debug!(
            target: "namesake::database",
            "building database context with {} entity resolver(s)",
            self.resolvers.len()
        );
        Database {
            shared: Rc::new(Shared {
                executor: self.executor,
                introspector: self
                    .introspector
                    .unwrap_or_else(|| Box::new(StaticSchema::new())),
                codecs: self.codecs,
                resolvers: self.resolvers,
                log_queries: self.log_queries,
                attributes: RefCell::new(self.attributes),
                entities: RefCell::new(HashMap::new()),
                tables: RefCell::new(None),
                columns: RefCell::new(HashMap::new()),
            }),
        }
    }
}
