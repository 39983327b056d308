//! `tracing` spans around executed statements (feature `tracing`).

use tracing::Span;

/// Span wrapping one executor call; `sql` is recorded as a field.
pub fn execute_query_span(sql: &str) -> Span {
    tracing::debug_span!("namesake.execute", sql = %sql)
}
