use std::cmp::Ordering;
use std::fmt;

use crate::error::{Channel, Error, Result};
use crate::scalar::Scalar;

/// A single cell carrying either a real value or the reason it is absent.
///
/// Equality is structural: two elements are equal only when they share a
/// variant and their payloads are equal, so a `Present` value never equals an
/// `Absent` reason. Ordering is only defined between two `Present` values; see
/// [`Channeled::compare`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channeled<V, R> {
    Present(V),
    Absent(R),
}

impl<V, R> Channeled<V, R> {
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }

    /// Returns the value payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelMismatch`] when the element is absent.
    pub fn value(&self) -> Result<&V> {
        match self {
            Self::Present(value) => Ok(value),
            Self::Absent(_) => Err(Error::ChannelMismatch {
                expected: Channel::Value,
            }),
        }
    }

    /// Returns the reason payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelMismatch`] when the element is present.
    pub fn reason(&self) -> Result<&R> {
        match self {
            Self::Absent(reason) => Ok(reason),
            Self::Present(_) => Err(Error::ChannelMismatch {
                expected: Channel::Reason,
            }),
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&V> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent(_) => None,
        }
    }

    #[must_use]
    pub const fn as_reason(&self) -> Option<&R> {
        match self {
            Self::Absent(reason) => Some(reason),
            Self::Present(_) => None,
        }
    }

    pub fn map_value<V2>(self, f: impl FnOnce(V) -> V2) -> Channeled<V2, R> {
        match self {
            Self::Present(value) => Channeled::Present(f(value)),
            Self::Absent(reason) => Channeled::Absent(reason),
        }
    }

    pub fn map_reason<R2>(self, f: impl FnOnce(R) -> R2) -> Channeled<V, R2> {
        match self {
            Self::Present(value) => Channeled::Present(value),
            Self::Absent(reason) => Channeled::Absent(f(reason)),
        }
    }
}

impl<V: PartialOrd, R> Channeled<V, R> {
    /// Orders two present values; `None` (indeterminate) if either side is
    /// absent or the values are unordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Present(a), Self::Present(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn lt(&self, other: &Self) -> Option<bool> {
        self.compare(other).map(Ordering::is_lt)
    }

    #[must_use]
    pub fn le(&self, other: &Self) -> Option<bool> {
        self.compare(other).map(Ordering::is_le)
    }

    #[must_use]
    pub fn gt(&self, other: &Self) -> Option<bool> {
        self.compare(other).map(Ordering::is_gt)
    }

    #[must_use]
    pub fn ge(&self, other: &Self) -> Option<bool> {
        self.compare(other).map(Ordering::is_ge)
    }
}

impl<V: fmt::Display, R: fmt::Display> fmt::Display for Channeled<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(value) => write!(f, "{value}"),
            Self::Absent(reason) => write!(f, "<{reason}>"),
        }
    }
}

/// Reason payload carried by the reason channel of decoded columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// Payload of a configured missing token.
    Code(Scalar),
    /// Raw text matched neither a missing token nor the value parser.
    ParseFailure,
    /// A narrowing cast could not represent the element.
    CastFailure,
}

impl Reason {
    #[must_use]
    pub const fn code(&self) -> Option<&Scalar> {
        match self {
            Self::Code(code) => Some(code),
            Self::ParseFailure | Self::CastFailure => None,
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Code(_))
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::ParseFailure => f.write_str("parse failure"),
            Self::CastFailure => f.write_str("cast failure"),
        }
    }
}

impl From<Scalar> for Reason {
    fn from(value: Scalar) -> Self {
        Self::Code(value)
    }
}

impl From<&str> for Reason {
    fn from(value: &str) -> Self {
        Self::Code(Scalar::from(value))
    }
}

impl From<String> for Reason {
    fn from(value: String) -> Self {
        Self::Code(Scalar::Text(value))
    }
}

impl From<i64> for Reason {
    fn from(value: i64) -> Self {
        Self::Code(Scalar::Int(value))
    }
}

/// Element type of dynamically typed columns.
pub type Cell = Channeled<Scalar, Reason>;
