//! Error types for namesake operations.
//!
//! Inference and rendering errors (`RelationNotFound`, `QueryBinding`,
//! `EmptyPayload`) are raised before anything reaches the executor.
//! Executor failures are wrapped in [`NamesakeError::Execution`] together with
//! the statement that failed, keeping the driver error as the source.
//!
//! A missing row is not an error: keyed fetches and `SelectOne` return `None`.

use crate::codec::CodecError;
use crate::executor::ExecutionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamesakeError {
    /// No naming convention links the two tables
    #[error("no relationship between `{from}` and `{to}` can be inferred from their names")]
    RelationNotFound { from: String, to: String },

    /// Placeholders and bound parameters do not line up
    #[error(
        "parameter binding mismatch on `{table}`: missing {missing:?}, unused {unused:?}, conflicting {conflicting:?}"
    )]
    QueryBinding {
        table: String,
        /// Placeholders referenced by a fragment but never bound
        missing: Vec<String>,
        /// Parameters bound but never referenced
        unused: Vec<String>,
        /// Names bound more than once with different values
        conflicting: Vec<String>,
    },

    /// The table exists neither in the schema nor in any entity resolver
    #[error("entity `{0}` not found")]
    EntityNotFound(String),

    /// The executor failed
    #[error("failed to execute `{sql}`")]
    Execution {
        sql: String,
        #[source]
        source: ExecutionError,
    },

    /// The introspector could not read the schema
    #[error("failed to read the database schema")]
    Introspection(#[source] ExecutionError),

    /// The connection named in the settings could not be opened
    #[error("failed to open database `{url}`")]
    Connection {
        url: String,
        #[source]
        source: ExecutionError,
    },

    /// INSERT/UPDATE without a data payload
    #[error("{operation} on `{table}` has no data")]
    EmptyPayload {
        table: String,
        operation: &'static str,
    },

    /// A field value could not be encoded or decoded
    #[error("codec failure on field `{field}`")]
    Codec {
        field: String,
        #[source]
        source: CodecError,
    },

    /// The executor returned a result of the wrong shape
    #[error("unexpected result for {operation} on `{table}`: {detail}")]
    UnexpectedResult {
        table: String,
        operation: &'static str,
        detail: String,
    },

    /// Row operation that needs an `id` on a row without one
    #[error("row of `{table}` has no primary key")]
    MissingPrimaryKey { table: String },

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl NamesakeError {
    pub(crate) fn relation_not_found(from: &str, to: &str) -> Self {
        NamesakeError::RelationNotFound {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Whether this error came out of the executor (as opposed to being raised
    /// by inference, rendering or codecs before any round trip).
    pub fn is_execution(&self) -> bool {
        matches!(self, NamesakeError::Execution { .. })
    }
}

/// Result type for namesake operations
pub type Result<T, E = NamesakeError> = std::result::Result<T, E>;
