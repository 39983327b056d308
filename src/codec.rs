//! Field codecs: bidirectional transformers between the stored and in-memory
//! shape of a value.
//!
//! Every field of an entity is paired with one codec when its descriptors are
//! computed (see [`CodecRegistry::resolve`]). Rows fetched from the database
//! pass through [`Codec::decode`]; payloads handed to `insert`/`update` pass
//! through [`Codec::encode`].
//!
//! `Null` passes through every built-in codec unchanged.

pub mod builtin;
pub mod registry;

pub use builtin::{
    BooleanCodec, DateCodec, DateTimeCodec, FloatCodec, FnCodec, IdentityCodec, IntegerCodec,
    JsonCodec,
};
pub use registry::CodecRegistry;

use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error raised by a codec for a value it cannot represent
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("{codec} codec cannot convert a {value} value")]
    Unsupported {
        codec: &'static str,
        value: &'static str,
    },

    #[error("{codec} codec cannot parse {input:?}: {message}")]
    Parse {
        codec: &'static str,
        input: String,
        message: String,
    },
}

/// A bidirectional value transformer.
///
/// Implementations must be pure: the same input always produces the same
/// output, and for every value `v` a codec accepts,
/// `decode(encode(v)) == v` up to a documented loss (see
/// [`DateTimeCodec`]).
pub trait Codec: Send + Sync {
    /// Short name used in errors and `Debug` output.
    fn name(&self) -> &'static str;

    /// In-memory → database representation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the value has no database representation.
    fn encode(&self, value: Value) -> Result<Value, CodecError>;

    /// Database → in-memory representation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the stored value cannot be interpreted.
    fn decode(&self, value: Value) -> Result<Value, CodecError>;
}

/// Shared handle to a codec.
pub type SharedCodec = Arc<dyn Codec>;

impl fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Codec({})", self.name())
    }
}
