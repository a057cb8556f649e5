use std::borrow::Cow;
use std::fmt;
use std::io;

use crate::promote::ChannelTypes;
use crate::scalar::ScalarType;

/// Result type used across the channeled column implementation.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type surfaced by decoding, promotion and dispatch.
///
/// Per-cell parse problems are never reported through this type; they are
/// collected into a [`crate::decode::DecodeReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure while reading or writing delimited text.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The delimited-text tokenizer rejected the input or output.
    #[error("csv error: {details}")]
    Csv { details: Cow<'static, str> },

    /// A JSON configuration could not be read.
    #[error("invalid JSON configuration: {details}")]
    Json { details: Cow<'static, str> },

    /// Failure to convert bytes between character encodings.
    #[error("encoding conversion from {encoding} failed: {details}")]
    Encoding {
        encoding: Cow<'static, str>,
        details: Cow<'static, str>,
    },

    /// Position outside of a vector's bounds.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Accessor invoked against the wrong variant of a channeled element.
    #[error("element has no {expected} channel payload")]
    ChannelMismatch { expected: Channel },

    /// Two columns with different channel types were combined without promotion.
    #[error("channel types {left} and {right} do not match")]
    TypeMismatch {
        left: ChannelTypes,
        right: ChannelTypes,
    },

    /// No promotion or cast path exists between two types on one channel.
    #[error("{channel} channel types {left} and {right} are incompatible")]
    IncompatibleChannelTypes {
        channel: Channel,
        left: ScalarType,
        right: ScalarType,
    },

    /// Elementwise operands (or masks) disagree on length.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// The requested operation is not defined for the value type.
    #[error("{operation} is not supported for {value_type} values")]
    UnsupportedOperation {
        operation: Cow<'static, str>,
        value_type: ScalarType,
    },

    /// Checked integer arithmetic overflowed.
    #[error("integer overflow at index {index}")]
    ArithmeticOverflow { index: usize },

    /// One token was configured twice with different reasons for one column.
    #[error("missing token '{token}' for {column} maps to conflicting reasons")]
    AmbiguousTokens {
        column: Cow<'static, str>,
        token: String,
    },

    /// A column referenced by name does not exist.
    #[error("column '{name}' not found")]
    UnknownColumn { name: String },

    /// A column loaded without channels was asked for its channeled form.
    #[error("column '{name}' has no channels")]
    NotChanneled { name: String },

    /// Load options or token configuration could not be interpreted.
    #[error("invalid configuration: {details}")]
    InvalidConfig { details: Cow<'static, str> },
}

/// One of the two channels carried per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Value,
    Reason,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Reason => write!(f, "reason"),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv {
            details: Cow::Owned(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            details: Cow::Owned(err.to_string()),
        }
    }
}
