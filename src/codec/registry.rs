//! Codec lookup by field name and raw column type.

use super::builtin::{
    BooleanCodec, DateCodec, DateTimeCodec, FloatCodec, IdentityCodec, IntegerCodec, JsonCodec,
};
use super::{Codec, SharedCodec};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

static IDENTITY: Lazy<SharedCodec> = Lazy::new(|| Arc::new(IdentityCodec));
static INTEGER: Lazy<SharedCodec> = Lazy::new(|| Arc::new(IntegerCodec));
static FLOAT: Lazy<SharedCodec> = Lazy::new(|| Arc::new(FloatCodec));
static BOOLEAN: Lazy<SharedCodec> = Lazy::new(|| Arc::new(BooleanCodec));
static DATETIME: Lazy<SharedCodec> = Lazy::new(|| Arc::new(DateTimeCodec));
static DATE: Lazy<SharedCodec> = Lazy::new(|| Arc::new(DateCodec));
static JSON: Lazy<SharedCodec> = Lazy::new(|| Arc::new(JsonCodec));

/// Registered codecs for a database context.
///
/// Lookup order in [`resolve`](Self::resolve):
///
/// 1. a codec registered for the exact field name,
/// 2. the naming conventions ([`by_convention`](Self::by_convention)),
/// 3. a codec registered for the raw column type (case-insensitive),
/// 4. the raw type family (`int*`, `real`, `json`, ...),
/// 5. identity.
///
/// Per-entity overrides live in [`EntityBehavior`](crate::EntityBehavior)
/// and are consulted before the registry.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    by_field: HashMap<String, SharedCodec>,
    by_raw_type: HashMap<String, SharedCodec>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `codec` for every field called `field`, in every table.
    pub fn register_field(&mut self, field: impl Into<String>, codec: impl Codec + 'static) -> &mut Self {
        self.by_field.insert(field.into(), Arc::new(codec));
        self
    }

    /// Use `codec` for columns declared with `raw_type` when no naming
    /// convention applies.
    pub fn register_raw_type(
        &mut self,
        raw_type: impl AsRef<str>,
        codec: impl Codec + 'static,
    ) -> &mut Self {
        self.by_raw_type
            .insert(raw_type.as_ref().to_ascii_lowercase(), Arc::new(codec));
        self
    }

    /// Pick the codec for a column.
    pub fn resolve(&self, field: &str, raw_type: &str) -> SharedCodec {
        if let Some(codec) = self.by_field.get(field) {
            return Arc::clone(codec);
        }
        if let Some(codec) = Self::by_convention(field) {
            return codec;
        }
        let raw_type = raw_type.trim().to_ascii_lowercase();
        if let Some(codec) = self.by_raw_type.get(&raw_type) {
            return Arc::clone(codec);
        }
        Self::by_type_family(&raw_type).unwrap_or_else(Self::identity)
    }

    /// Codec implied by the field name alone:
    ///
    /// - `id`, `*_id` → integer
    /// - `pubdate`, `*At` → datetime
    /// - `active`, `isX`, `inX`, `hasX` (prefix followed by an uppercase
    ///   letter or `_`) → boolean
    pub fn by_convention(field: &str) -> Option<SharedCodec> {
        if field == "id" || field.ends_with("_id") {
            return Some(Arc::clone(&INTEGER));
        }
        if field == "pubdate" || (field.len() > 2 && field.ends_with("At")) {
            return Some(Arc::clone(&DATETIME));
        }
        if field == "active" || ["is", "in", "has"].iter().any(|p| is_flag(field, p)) {
            return Some(Arc::clone(&BOOLEAN));
        }
        None
    }

    pub fn identity() -> SharedCodec {
        Arc::clone(&IDENTITY)
    }

    fn by_type_family(raw_type: &str) -> Option<SharedCodec> {
        // Strip size/precision: `varchar(255)`, `decimal(10,2)`
        let base = raw_type.split('(').next().unwrap_or(raw_type).trim();
        let codec = match base {
            "tinyint" if raw_type.starts_with("tinyint(1)") => &BOOLEAN,
            "bool" | "boolean" => &BOOLEAN,
            "datetime" | "timestamp" => &DATETIME,
            "date" => &DATE,
            "json" | "jsonb" => &JSON,
            "real" | "float" | "double" | "double precision" | "decimal" | "numeric" => &FLOAT,
            b if b.contains("int") => &INTEGER,
            _ => return None,
        };
        Some(Arc::clone(codec))
    }
}

fn is_flag(field: &str, prefix: &str) -> bool {
    field
        .strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
}
