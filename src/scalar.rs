use std::cmp::Ordering;
use std::fmt;

use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;
use serde::{Deserialize, Serialize};
use time::Date;

/// Runtime type of a [`Scalar`]; one half of a promotion key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Text,
    Date,
}

impl ScalarType {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single dynamically typed payload stored in either channel of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Calendar date without time zone.
    Date(Date),
}

impl Scalar {
    #[must_use]
    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) => ScalarType::Bool,
            Self::Int(_) => ScalarType::Int,
            Self::Float(_) => ScalarType::Float,
            Self::Text(_) => ScalarType::Text,
            Self::Date(_) => ScalarType::Date,
        }
    }

    /// Numeric view used by reductions; `Bool` counts as 0/1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) | Self::Date(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Orders two scalars of the same type. Numeric types compare across
    /// each other; any other mix is unordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Appends the text encoding used when writing cells back out.
    pub fn encode_into(&self, out: &mut String, ryu: &mut RyuBuffer, itoa: &mut ItoaBuffer) {
        match self {
            Self::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Self::Int(v) => out.push_str(itoa.format(*v)),
            Self::Float(v) => {
                let text = ryu.format(*v);
                out.push_str(text.strip_suffix(".0").unwrap_or(text));
            }
            Self::Text(text) => out.push_str(text),
            Self::Date(date) => out.push_str(&date.to_string()),
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.encode_into(&mut out, &mut RyuBuffer::new(), &mut ItoaBuffer::new());
        out
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            other => f.write_str(&other.encode()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Date> for Scalar {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn floats_encode_without_trailing_zero() {
        assert_eq!(Scalar::Float(20.0).encode(), "20");
        assert_eq!(Scalar::Float(20.5).encode(), "20.5");
        assert_eq!(Scalar::Int(-7).encode(), "-7");
    }

    #[test]
    fn dates_encode_as_iso() {
        let date = Date::from_calendar_date(2024, Month::March, 9).unwrap();
        assert_eq!(Scalar::Date(date).encode(), "2024-03-09");
    }

    #[test]
    fn numeric_types_compare_across_each_other() {
        assert_eq!(
            Scalar::Int(2).compare(&Scalar::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Scalar::Text("a".into()).compare(&Scalar::Int(1)), None);
    }
}
