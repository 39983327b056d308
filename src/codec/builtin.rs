//! Built-in codecs.

use super::{Codec, CodecError};
use crate::json_helpers::value_to_json;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn unsupported(codec: &'static str, value: &Value) -> CodecError {
    CodecError::Unsupported {
        codec,
        value: value.type_name(),
    }
}

fn parse_error(codec: &'static str, input: &str, message: impl ToString) -> CodecError {
    CodecError::Parse {
        codec,
        input: input.to_string(),
        message: message.to_string(),
    }
}

/// Passthrough codec for fields without a convention or registration.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }
}

/// `id` and `*_id` fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerCodec;

impl IntegerCodec {
    fn convert(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null | Value::Int(_) => Ok(value),
            Value::Text(ref s) if s.trim().is_empty() => Ok(Value::Null),
            Value::Text(ref s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| parse_error(self.name(), s, e)),
            ref other => other
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| unsupported(self.name(), other)),
        }
    }
}

impl Codec for IntegerCodec {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        self.convert(value)
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        self.convert(value)
    }
}

/// `real`/`float`/`double`/`decimal` columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatCodec;

impl FloatCodec {
    fn convert(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null | Value::Float(_) => Ok(value),
            Value::Text(ref s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| parse_error(self.name(), s, e)),
            ref other => other
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| unsupported(self.name(), other)),
        }
    }
}

impl Codec for FloatCodec {
    fn name(&self) -> &'static str {
        "float"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        self.convert(value)
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        self.convert(value)
    }
}

/// `active`, `isX`, `inX`, `hasX` fields. Stored as `0`/`1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BooleanCodec;

impl BooleanCodec {
    fn to_bool(&self, value: &Value) -> Result<Option<bool>, CodecError> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            Value::Int(i) => Ok(Some(*i != 0)),
            Value::Float(f) => Ok(Some(*f != 0.0)),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" | "on" => Ok(Some(true)),
                "" | "0" | "false" | "f" | "no" | "off" => Ok(Some(false)),
                _ => Err(parse_error(self.name(), s, "not a boolean")),
            },
            other => Err(unsupported(self.name(), other)),
        }
    }
}

impl Codec for BooleanCodec {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(self
            .to_bool(&value)?
            .map_or(Value::Null, |b| Value::Int(i64::from(b))))
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(self.to_bool(&value)?.map_or(Value::Null, Value::Bool))
    }
}

/// `pubdate` and `*At` fields.
///
/// Stored as `YYYY-MM-DD HH:MM:SS` text. Sub-second precision is truncated on
/// encode, so `decode(encode(v)) == v` holds for whole-second values only.
/// Integers decode as Unix timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateTimeCodec;

impl DateTimeCodec {
    fn parse(&self, value: &Value) -> Result<Option<NaiveDateTime>, CodecError> {
        match value {
            Value::Null => Ok(None),
            Value::DateTime(dt) => Ok(Some(*dt)),
            Value::Date(d) => Ok(d.and_hms_opt(0, 0, 0)),
            Value::Int(secs) => DateTime::<Utc>::from_timestamp(*secs, 0)
                .map(|dt| Some(dt.naive_utc()))
                .ok_or_else(|| parse_error(self.name(), &secs.to_string(), "timestamp out of range")),
            Value::Text(s) if s.trim().is_empty() => Ok(None),
            Value::Text(s) => {
                let s = s.trim();
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                    .or_else(|_| {
                        NaiveDate::parse_from_str(s, DATE_FORMAT)
                            .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
                    })
                    .map(Some)
                    .map_err(|e| parse_error(self.name(), s, e))
            }
            other => Err(unsupported(self.name(), other)),
        }
    }
}

impl Codec for DateTimeCodec {
    fn name(&self) -> &'static str {
        "datetime"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(self.parse(&value)?.map_or(Value::Null, |dt| {
            Value::Text(dt.format(DATETIME_FORMAT).to_string())
        }))
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(self.parse(&value)?.map_or(Value::Null, Value::DateTime))
    }
}

/// `date` columns, stored as `YYYY-MM-DD`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateCodec;

impl DateCodec {
    fn parse(&self, value: &Value) -> Result<Option<NaiveDate>, CodecError> {
        match value {
            Value::Null => Ok(None),
            Value::Date(d) => Ok(Some(*d)),
            Value::DateTime(dt) => Ok(Some(dt.date())),
            Value::Text(s) if s.trim().is_empty() => Ok(None),
            Value::Text(s) => {
                let s = s.trim();
                // Accept a full datetime and keep the date part
                let date_part = s.get(..10).unwrap_or(s);
                NaiveDate::parse_from_str(date_part, DATE_FORMAT)
                    .map(Some)
                    .map_err(|e| parse_error(self.name(), s, e))
            }
            other => Err(unsupported(self.name(), other)),
        }
    }
}

impl Codec for DateCodec {
    fn name(&self) -> &'static str {
        "date"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(self
            .parse(&value)?
            .map_or(Value::Null, |d| Value::Text(d.format(DATE_FORMAT).to_string())))
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(self.parse(&value)?.map_or(Value::Null, Value::Date))
    }
}

/// `json` columns, stored as serialized text.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::Text(value_to_json(&other).to_string())),
        }
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null | Value::Json(_) => Ok(value),
            Value::Text(s) => serde_json::from_str(&s)
                .map(Value::Json)
                .map_err(|e| parse_error(self.name(), &s, e)),
            Value::Bytes(b) => serde_json::from_slice(&b)
                .map(Value::Json)
                .map_err(|e| parse_error(self.name(), &String::from_utf8_lossy(&b), e)),
            other => Ok(Value::Json(value_to_json(&other))),
        }
    }
}

type Transform = Box<dyn Fn(Value) -> Result<Value, CodecError> + Send + Sync>;

/// Codec built from a pair of closures, for one-off custom fields.
///
/// # Examples
///
/// ```
/// use namesake::codec::{Codec, FnCodec};
/// use namesake::Value;
///
/// let upper = FnCodec::new(
///     "upper",
///     |v| Ok(v),
///     |v| Ok(match v {
///         Value::Text(s) => Value::Text(s.to_uppercase()),
///         other => other,
///     }),
/// );
/// assert_eq!(upper.decode(Value::from("ab")).unwrap(), Value::from("AB"));
/// ```
pub struct FnCodec {
    name: &'static str,
    encode: Transform,
    decode: Transform,
}

impl FnCodec {
    pub fn new<E, D>(name: &'static str, encode: E, decode: D) -> Self
    where
        E: Fn(Value) -> Result<Value, CodecError> + Send + Sync + 'static,
        D: Fn(Value) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        Self {
            name,
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl Codec for FnCodec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        (self.decode)(value)
    }
}
