//! Fluent SQL builders.
//!
//! Every builder targets one [`Entity`](crate::Entity) and shares the same
//! clause/parameter core. Builders are chained by value and rendered on
//! demand:
//!
//! | builder        | SQL                                  | `get()` returns        |
//! |----------------|--------------------------------------|------------------------|
//! | [`SelectOne`]  | `SELECT … LIMIT 1`                   | `Option<Row>`          |
//! | [`SelectAll`]  | `SELECT …`                           | `RowCollection`        |
//! | [`Insert`]     | `INSERT INTO …`                      | inserted id            |
//! | [`Update`]     | `UPDATE … SET …`                     | rows affected          |
//! | [`Delete`]     | `DELETE FROM …`                      | rows affected          |
//! | [`Count`]      | `SELECT COUNT(*) …`                  | `i64`                  |
//! | [`Sum`]        | `SELECT SUM(…) …`                    | `Value`                |
//!
//! Filter fragments are opaque SQL with `:name` placeholders. Placeholders
//! and bound parameters are checked against each other when the statement
//! is rendered, before anything reaches the executor.
//!
//! ```
//! use namesake::query::Statement;
//! use namesake::params;
//!
//! let stmt = Statement::new("SELECT * FROM `post` WHERE (id = :id)", params! { "id" => 3 });
//! assert_eq!(stmt.placeholders(), vec!["id"]);
//! ```

pub mod aggregate;
pub mod binding;
pub(crate) mod criteria;
pub mod params;
pub mod select;
pub mod write;

pub use aggregate::{Count, Sum};
pub use params::{IntoParams, Params};
pub use select::{SelectAll, SelectOne};
pub use write::{Delete, Insert, Update};

use std::fmt;

/// Rendered SQL together with the parameters it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Placeholder names referenced by the SQL, in order of appearance.
    pub fn placeholders(&self) -> Vec<String> {
        binding::placeholders(&self.sql)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Backtick-quote an identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
