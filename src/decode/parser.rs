use std::borrow::Cow;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use time::Date;
use time::format_description::{self, OwnedFormatItem};

use crate::error::{Error, Result};
use crate::scalar::{Scalar, ScalarType};

const ISO_DATE_FORMAT: &str = "[year]-[month]-[day]";

/// Raw text could not be turned into a value of the expected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("text does not parse as {expected}")]
pub struct ParseFailure {
    pub expected: ScalarType,
}

/// Pluggable `text -> value` conversion used by the column decoder.
pub trait ValueParser: Send + Sync {
    type Output;

    fn value_type(&self) -> ScalarType;

    /// Parses one cell that did not match a missing token.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailure`] when the text is not a valid value.
    fn parse(&self, text: &str) -> std::result::Result<Self::Output, ParseFailure>;
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "TRUE" | "True" | "T" => Some(true),
        "false" | "FALSE" | "False" | "F" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

fn iso_date_format() -> &'static OwnedFormatItem {
    static FORMAT: OnceLock<OwnedFormatItem> = OnceLock::new();
    FORMAT.get_or_init(|| {
        format_description::parse_owned::<2>(ISO_DATE_FORMAT).expect("ISO date format is valid")
    })
}

pub(crate) fn parse_iso_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), iso_date_format()).ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolParser;

impl ValueParser for BoolParser {
    type Output = bool;

    fn value_type(&self) -> ScalarType {
        ScalarType::Bool
    }

    fn parse(&self, text: &str) -> std::result::Result<bool, ParseFailure> {
        parse_bool(text).ok_or(ParseFailure {
            expected: ScalarType::Bool,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntParser;

impl ValueParser for IntParser {
    type Output = i64;

    fn value_type(&self) -> ScalarType {
        ScalarType::Int
    }

    fn parse(&self, text: &str) -> std::result::Result<i64, ParseFailure> {
        parse_int(text).ok_or(ParseFailure {
            expected: ScalarType::Int,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatParser;

impl ValueParser for FloatParser {
    type Output = f64;

    fn value_type(&self) -> ScalarType {
        ScalarType::Float
    }

    fn parse(&self, text: &str) -> std::result::Result<f64, ParseFailure> {
        parse_float(text).ok_or(ParseFailure {
            expected: ScalarType::Float,
        })
    }
}

/// Accepts any text verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl ValueParser for TextParser {
    type Output = String;

    fn value_type(&self) -> ScalarType {
        ScalarType::Text
    }

    fn parse(&self, text: &str) -> std::result::Result<String, ParseFailure> {
        Ok(text.to_owned())
    }
}

/// Parses dates with a `time` format description.
#[derive(Debug, Clone)]
pub struct DateParser {
    format: OwnedFormatItem,
}

impl DateParser {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `format` is not a valid format
    /// description.
    pub fn new(format: &str) -> Result<Self> {
        let format =
            format_description::parse_owned::<2>(format).map_err(|err| Error::InvalidConfig {
                details: Cow::Owned(format!("invalid date format '{format}': {err}")),
            })?;
        Ok(Self { format })
    }

    #[must_use]
    pub fn iso() -> Self {
        Self {
            format: iso_date_format().clone(),
        }
    }
}

impl ValueParser for DateParser {
    type Output = Date;

    fn value_type(&self) -> ScalarType {
        ScalarType::Date
    }

    fn parse(&self, text: &str) -> std::result::Result<Date, ParseFailure> {
        Date::parse(text.trim(), &self.format).map_err(|_| ParseFailure {
            expected: ScalarType::Date,
        })
    }
}

/// Accepts only a fixed set of levels.
#[derive(Debug, Clone)]
pub struct CategoricalParser {
    levels: Vec<String>,
}

impl CategoricalParser {
    #[must_use]
    pub const fn new(levels: Vec<String>) -> Self {
        Self { levels }
    }

    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }
}

impl ValueParser for CategoricalParser {
    type Output = String;

    fn value_type(&self) -> ScalarType {
        ScalarType::Text
    }

    fn parse(&self, text: &str) -> std::result::Result<String, ParseFailure> {
        self.levels
            .iter()
            .find(|level| level.as_str() == text)
            .cloned()
            .ok_or(ParseFailure {
                expected: ScalarType::Text,
            })
    }
}

/// Requested value type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    Text,
    /// ISO `YYYY-MM-DD` dates.
    Date,
    /// Dates in a custom `time` format description.
    DateFormat(String),
    Categorical(Vec<String>),
    /// Delegate to a [`TypeGuesser`].
    #[default]
    Infer,
}

/// Runtime-selected parser producing [`Scalar`] values.
#[derive(Debug, Clone)]
pub enum ScalarParser {
    Bool(BoolParser),
    Int(IntParser),
    Float(FloatParser),
    Text(TextParser),
    Date(DateParser),
    Categorical(CategoricalParser),
}

impl ScalarParser {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unresolved `Infer` type or an
    /// invalid date format.
    pub fn for_type(column_type: &ColumnType) -> Result<Self> {
        Ok(match column_type {
            ColumnType::Bool => Self::Bool(BoolParser),
            ColumnType::Int => Self::Int(IntParser),
            ColumnType::Float => Self::Float(FloatParser),
            ColumnType::Text => Self::Text(TextParser),
            ColumnType::Date => Self::Date(DateParser::iso()),
            ColumnType::DateFormat(format) => Self::Date(DateParser::new(format)?),
            ColumnType::Categorical(levels) => {
                Self::Categorical(CategoricalParser::new(levels.clone()))
            }
            ColumnType::Infer => {
                return Err(Error::InvalidConfig {
                    details: Cow::from("column type must be resolved before parsing"),
                });
            }
        })
    }
}

impl ValueParser for ScalarParser {
    type Output = Scalar;

    fn value_type(&self) -> ScalarType {
        match self {
            Self::Bool(p) => p.value_type(),
            Self::Int(p) => p.value_type(),
            Self::Float(p) => p.value_type(),
            Self::Text(p) => p.value_type(),
            Self::Date(p) => p.value_type(),
            Self::Categorical(p) => p.value_type(),
        }
    }

    fn parse(&self, text: &str) -> std::result::Result<Scalar, ParseFailure> {
        match self {
            Self::Bool(p) => p.parse(text).map(Scalar::Bool),
            Self::Int(p) => p.parse(text).map(Scalar::Int),
            Self::Float(p) => p.parse(text).map(Scalar::Float),
            Self::Text(p) => p.parse(text).map(Scalar::Text),
            Self::Date(p) => p.parse(text).map(Scalar::Date),
            Self::Categorical(p) => p.parse(text).map(Scalar::Text),
        }
    }
}

/// Chooses a value type from the cells left after missing-token matching.
pub trait TypeGuesser: Send + Sync {
    fn guess(&self, cells: &[&str]) -> ColumnType;
}

/// Picks the narrowest of bool, int, float, date and text that accepts every
/// cell. An empty candidate set guesses bool, the bottom of the value chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGuesser;

impl TypeGuesser for StandardGuesser {
    fn guess(&self, cells: &[&str]) -> ColumnType {
        let all = |accepts: fn(&str) -> bool| cells.iter().all(|cell| accepts(cell));
        if all(|cell| parse_bool(cell).is_some()) {
            ColumnType::Bool
        } else if all(|cell| parse_int(cell).is_some()) {
            ColumnType::Int
        } else if all(|cell| parse_float(cell).is_some()) {
            ColumnType::Float
        } else if all(|cell| parse_iso_date(cell).is_some()) {
            ColumnType::Date
        } else {
            ColumnType::Text
        }
    }
}
