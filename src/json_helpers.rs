//! JSON conversion helpers for [`Value`]s
//!
//! Rows serialize to JSON objects (see `Row::to_json`), and `data` payloads
//! can be built from JSON objects. These helpers define the mapping:
//!
//! | `Value`    | JSON                               |
//! |------------|------------------------------------|
//! | `Null`     | `null`                             |
//! | `Bool`     | boolean                            |
//! | `Int`      | number                             |
//! | `Float`    | number, or `"NaN"`/`"Infinity"`    |
//! | `Text`     | string                             |
//! | `Bytes`    | array of numbers                   |
//! | `Date`     | `"YYYY-MM-DD"`                     |
//! | `DateTime` | `"YYYY-MM-DD HH:MM:SS"`            |
//! | `Json`     | embedded as-is                     |

use crate::query::params::Params;
use crate::value::Value;
use serde_json::{Map, Number};

/// Convert a [`Value`] into a `serde_json::Value`.
///
/// Non-finite floats have no JSON number representation and are written as
/// strings (`"NaN"`, `"Infinity"`, `"-Infinity"`).
///
/// # Examples
///
/// ```
/// use namesake::json_helpers::value_to_json;
/// use namesake::Value;
/// use serde_json::json;
///
/// assert_eq!(value_to_json(&Value::Int(3)), json!(3));
/// assert_eq!(value_to_json(&Value::Float(f64::NAN)), json!("NaN"));
/// ```
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or_else(
            || {
                let special = if f.is_nan() {
                    "NaN"
                } else if f.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                serde_json::Value::String(special.to_string())
            },
            serde_json::Value::Number,
        ),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::Array(
            b.iter()
                .map(|byte| serde_json::Value::Number((*byte).into()))
                .collect(),
        ),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => {
            serde_json::Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        Value::Json(j) => j.clone(),
    }
}

/// Convert a JSON scalar into a [`Value`].
///
/// Arrays and objects become [`Value::Json`]; strings stay text, leaving
/// date parsing to the field's codec.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Json(other.clone()),
    }
}

/// Build a `data` payload from a JSON object. Returns `None` when `json` is
/// not an object.
///
/// # Examples
///
/// ```
/// use namesake::json_helpers::params_from_json;
/// use serde_json::json;
///
/// let data = params_from_json(&json!({"title": "Hello", "views": 3})).unwrap();
/// assert_eq!(data.len(), 2);
/// assert!(params_from_json(&json!([1, 2])).is_none());
/// ```
pub fn params_from_json(json: &serde_json::Value) -> Option<Params> {
    json.as_object().map(|object| {
        object
            .iter()
            .map(|(name, value)| (name.as_str(), json_to_value(value)))
            .collect()
    })
}

/// Serialize ordered `(field, value)` pairs as a JSON object.
pub(crate) fn object_from_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a Value)>,
) -> serde_json::Value {
    let map: Map<String, serde_json::Value> = pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value_to_json(value)))
        .collect();
    serde_json::Value::Object(map)
}
