//! # namesake
//!
//! A convention-driven ORM layer over plain SQL tables.
//!
//! Relationships are never declared: they are inferred from table and field
//! names. `post.category_id` makes every post belong to a category (and
//! every category have many posts); a `post_tag` table holding `post_id` and
//! `tag_id` links posts and tags many-to-many.
//!
//! - [`Database`] is the context: executor, introspector, codecs, entity
//!   resolvers, shared attributes and caches.
//! - [`Entity`] is one table and the factory for its
//!   [query builders](query).
//! - [`Row`] and [`RowCollection`] hold decoded records. Related rows load
//!   lazily on first access and are memoized; a collection loads a relation
//!   for all its members in one query.
//!
//! ```
//! use namesake::{params, Database, SqliteExecutor, Value};
//!
//! # fn main() -> namesake::Result<()> {
//! let sqlite = SqliteExecutor::open_in_memory().unwrap();
//! sqlite
//!     .execute_batch(
//!         "CREATE TABLE category (id INTEGER PRIMARY KEY, name TEXT);
//!          CREATE TABLE post (id INTEGER PRIMARY KEY, category_id INTEGER, title TEXT, isDraft INTEGER);
//!          INSERT INTO category (id, name) VALUES (1, 'news'), (2, 'tech');
//!          INSERT INTO post (category_id, title, isDraft) VALUES (1, 'a', 0), (2, 'b', 1), (1, 'c', 0);",
//!     )
//!     .unwrap();
//! let db = Database::new(sqlite);
//!
//! let posts = db
//!     .entity("post")?
//!     .select_all()
//!     .filter("isDraft = :draft", params! { "draft" => false })
//!     .order_by("id")
//!     .get()?;
//! assert_eq!(posts.len(), 2);
//!
//! // One query for the categories of every post
//! let categories = posts.related("category")?;
//! assert_eq!(categories.len(), 1);
//!
//! // Already memoized on each post
//! let first = posts.first().unwrap();
//! let category = first.get("category")?;
//! assert_eq!(category.as_one().and_then(|c| c.value("name")), Some(Value::from("news")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `sqlite` (default): [`SqliteExecutor`] and [`Database::from_settings`].
//! - `tracing`: a `namesake.execute` span around every statement.

pub mod codec;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod executor;
pub mod json_helpers;
mod macros;
pub mod query;
pub mod raw_sql;
pub mod relation;
pub mod row;
pub mod schema;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;
pub mod value;

#[cfg(all(test, feature = "sqlite"))]
mod test_helpers;

pub use codec::{Codec, CodecError, CodecRegistry, SharedCodec};
pub use config::{DatabaseSettings, Settings};
pub use database::{Database, DatabaseBuilder, EntityResolver};
pub use entity::{ComputedAttribute, Entity, EntityBehavior};
pub use error::{NamesakeError, Result};
pub use executor::{
    ColumnInfo, ExecutionError, Executor, Introspector, RawRow, RecordingExecutor, ResultSet,
};
#[cfg(feature = "sqlite")]
pub use executor::SqliteExecutor;
pub use query::{
    Count, Delete, Insert, IntoParams, Params, SelectAll, SelectOne, Statement, Sum, Update,
};
pub use relation::{Related, Relation, RelationKind, RelationSource, Relationship};
pub use row::{Attribute, Row, RowCollection};
pub use schema::{FieldDescriptor, Fields, SchemaView, StaticSchema};
pub use value::{Key, Value};
