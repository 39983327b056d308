//! Render-time validation of `:name` placeholders against bound parameters.

use crate::error::{NamesakeError, Result};
use crate::query::params::Params;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").expect("string literal pattern is valid"));

// `::` casts and `a:b` inside words are not placeholders.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^:\w]):([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
});

/// Placeholder names referenced by `sql`, in order of first appearance,
/// ignoring anything inside single-quoted literals.
pub fn placeholders(sql: &str) -> Vec<String> {
    let stripped = STRING_LITERAL.replace_all(sql, "''");
    let mut seen = BTreeSet::new();
    PLACEHOLDER
        .captures_iter(&stripped)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Check that `sql` and `params` agree exactly.
///
/// # Errors
///
/// Returns [`NamesakeError::QueryBinding`] when a placeholder is unbound, a
/// parameter is unreferenced, or `conflicts` is non-empty.
pub(crate) fn check(table: &str, sql: &str, params: &Params, conflicts: &[String]) -> Result<()> {
    let referenced = placeholders(sql);

    let missing: Vec<String> = referenced
        .iter()
        .filter(|name| !params.contains(name))
        .cloned()
        .collect();
    let unused: Vec<String> = params
        .names()
        .filter(|name| !referenced.iter().any(|r| r == name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() && unused.is_empty() && conflicts.is_empty() {
        return Ok(());
    }

    Err(NamesakeError::QueryBinding {
        table: table.to_string(),
        missing,
        unused,
        conflicting: conflicts.to_vec(),
    })
}
