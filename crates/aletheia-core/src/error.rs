use thiserror::Error;

use crate::datum::TypeVersion;

/// The byte sequence is not a valid envelope encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Truncated envelope while reading {0}")]
    Truncated(&'static str),

    #[error("Invalid varint in {0}")]
    InvalidVarint(&'static str),

    #[error("Value {value} of {field} does not fit in an int")]
    IntOverflow { field: &'static str, value: i64 },

    #[error("Negative length {length} for {field}")]
    NegativeLength { field: &'static str, length: i64 },

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("Invalid union branch {index} for {field}")]
    InvalidUnionBranch { field: &'static str, index: i64 },

    #[error("Invalid datum unique id: {0}")]
    InvalidUniqueId(String),

    #[error("{0} trailing bytes after envelope")]
    TrailingBytes(usize),
}

/// Failure of a datum serialization strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerDeError {
    #[error("Unsupported datum type version: {0}")]
    UnsupportedTypeVersion(TypeVersion),

    #[error("Invalid payload for {type_version}: {reason}")]
    InvalidPayload {
        type_version: TypeVersion,
        reason: String,
    },

    #[error("No writer registered for datum type {0}")]
    NoWriter(String),
}

/// Failure to turn envelope bytes into a typed datum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeserializeError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),

    #[error("Unsupported datum type version: {0}")]
    UnsupportedTypeVersion(TypeVersion),

    #[error("Invalid payload for {type_version}: {reason}")]
    InvalidPayload {
        type_version: TypeVersion,
        reason: String,
    },

    #[error(transparent)]
    Strategy(SerDeError),
}

impl From<SerDeError> for DeserializeError {
    fn from(e: SerDeError) -> Self {
        match e {
            SerDeError::UnsupportedTypeVersion(tv) => DeserializeError::UnsupportedTypeVersion(tv),
            SerDeError::InvalidPayload {
                type_version,
                reason,
            } => DeserializeError::InvalidPayload {
                type_version,
                reason,
            },
            other => DeserializeError::Strategy(other),
        }
    }
}
