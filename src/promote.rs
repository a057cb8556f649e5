use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::decode::parser::{parse_bool, parse_float, parse_int, parse_iso_date};
use crate::element::{Channeled, Reason};
use crate::error::{Channel, Error, Result};
use crate::scalar::{Scalar, ScalarType};

/// Promotion key of a column: the type of each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelTypes {
    pub value: ScalarType,
    pub reason: ScalarType,
}

impl ChannelTypes {
    #[must_use]
    pub const fn new(value: ScalarType, reason: ScalarType) -> Self {
        Self { value, reason }
    }
}

impl fmt::Display for ChannelTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.value, self.reason)
    }
}

/// Position in the `bool < int < float < text` chain. Dates sit outside it.
const fn chain_rank(ty: ScalarType) -> Option<u8> {
    match ty {
        ScalarType::Bool => Some(0),
        ScalarType::Int => Some(1),
        ScalarType::Float => Some(2),
        ScalarType::Text => Some(3),
        ScalarType::Date => None,
    }
}

/// Common value-channel type of two columns, if any.
#[must_use]
pub fn value_supertype(left: ScalarType, right: ScalarType) -> Option<ScalarType> {
    if left == right {
        return Some(left);
    }
    let (a, b) = (chain_rank(left)?, chain_rank(right)?);
    Some(if a >= b { left } else { right })
}

/// Common reason-channel type; text absorbs every type.
#[must_use]
pub fn reason_supertype(left: ScalarType, right: ScalarType) -> ScalarType {
    value_supertype(left, right).unwrap_or(ScalarType::Text)
}

/// Resolves the pair of types two columns must be cast to before combining.
///
/// # Errors
///
/// Returns [`Error::IncompatibleChannelTypes`] naming the value channel when
/// the value types have no common supertype.
pub fn common_types(left: ChannelTypes, right: ChannelTypes) -> Result<ChannelTypes> {
    let value =
        value_supertype(left.value, right.value).ok_or(Error::IncompatibleChannelTypes {
            channel: Channel::Value,
            left: left.value,
            right: right.value,
        })?;
    Ok(ChannelTypes {
        value,
        reason: reason_supertype(left.reason, right.reason),
    })
}

/// Whether any conversion (widening or narrowing) exists between two types.
#[must_use]
pub fn can_cast(from: ScalarType, to: ScalarType) -> bool {
    from == to
        || (chain_rank(from).is_some() && chain_rank(to).is_some())
        || matches!(
            (from, to),
            (ScalarType::Date, ScalarType::Text) | (ScalarType::Text, ScalarType::Date)
        )
}

/// Converts one scalar; `None` when the target cannot represent it.
#[must_use]
pub fn cast_scalar(value: &Scalar, target: ScalarType) -> Option<Scalar> {
    if value.scalar_type() == target {
        return Some(value.clone());
    }
    match (value, target) {
        (Scalar::Bool(v), ScalarType::Int) => Some(Scalar::Int(i64::from(*v))),
        (Scalar::Bool(v), ScalarType::Float) => Some(Scalar::Float(if *v { 1.0 } else { 0.0 })),
        (Scalar::Int(v), ScalarType::Bool) => match v {
            0 => Some(Scalar::Bool(false)),
            1 => Some(Scalar::Bool(true)),
            _ => None,
        },
        (Scalar::Int(_), ScalarType::Float) => value.as_f64().map(Scalar::Float),
        (Scalar::Float(v), ScalarType::Int) => float_to_int(*v).map(Scalar::Int),
        (Scalar::Float(v), ScalarType::Bool) => match float_to_int(*v) {
            Some(0) => Some(Scalar::Bool(false)),
            Some(1) => Some(Scalar::Bool(true)),
            _ => None,
        },
        (Scalar::Text(text), ScalarType::Bool) => parse_bool(text).map(Scalar::Bool),
        (Scalar::Text(text), ScalarType::Int) => parse_int(text).map(Scalar::Int),
        (Scalar::Text(text), ScalarType::Float) => parse_float(text).map(Scalar::Float),
        (Scalar::Text(text), ScalarType::Date) => parse_iso_date(text).map(Scalar::Date),
        (_, ScalarType::Text) => Some(Scalar::Text(value.encode())),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn float_to_int(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then(|| value as i64)
}

fn ensure_castable(channel: Channel, from: ScalarType, to: ScalarType) -> Result<()> {
    if can_cast(from, to) {
        Ok(())
    } else {
        Err(Error::IncompatibleChannelTypes {
            channel,
            left: from,
            right: to,
        })
    }
}

/// Casts the value channel; unrepresentable values become
/// `Absent(CastFailure)`.
///
/// # Errors
///
/// Returns [`Error::IncompatibleChannelTypes`] when no conversion exists.
pub fn cast_value_channel(column: &Column, target: ScalarType) -> Result<Column> {
    let types = column.types();
    if types.value == target {
        return Ok(column.clone());
    }
    ensure_castable(Channel::Value, types.value, target)?;
    let data = column
        .data()
        .iter()
        .map(|cell| match cell {
            Channeled::Present(value) => cast_scalar(value, target)
                .map_or(Channeled::Absent(Reason::CastFailure), Channeled::Present),
            Channeled::Absent(reason) => Channeled::Absent(reason.clone()),
        })
        .collect();
    Ok(Column::from_parts(
        ChannelTypes::new(target, types.reason),
        data,
    ))
}

/// Casts the codes in the reason channel; unrepresentable codes become
/// [`Reason::CastFailure`]. Failure markers pass through.
///
/// # Errors
///
/// Returns [`Error::IncompatibleChannelTypes`] when no conversion exists.
pub fn cast_reason_channel(column: &Column, target: ScalarType) -> Result<Column> {
    let types = column.types();
    if types.reason == target {
        return Ok(column.clone());
    }
    ensure_castable(Channel::Reason, types.reason, target)?;
    let data = column.data().map_reason_channel(|reason| match reason {
        Reason::Code(code) => cast_scalar(code, target).map_or(Reason::CastFailure, Reason::Code),
        failure => failure.clone(),
    });
    Ok(Column::from_parts(
        ChannelTypes::new(types.value, target),
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Cell;

    #[test]
    fn value_channel_follows_numeric_chain() {
        assert_eq!(
            value_supertype(ScalarType::Int, ScalarType::Float),
            Some(ScalarType::Float)
        );
        assert_eq!(
            value_supertype(ScalarType::Bool, ScalarType::Text),
            Some(ScalarType::Text)
        );
        assert_eq!(value_supertype(ScalarType::Date, ScalarType::Int), None);
        assert_eq!(
            value_supertype(ScalarType::Date, ScalarType::Date),
            Some(ScalarType::Date)
        );
    }

    #[test]
    fn reason_channel_falls_back_to_text() {
        assert_eq!(
            reason_supertype(ScalarType::Date, ScalarType::Int),
            ScalarType::Text
        );
        assert_eq!(
            reason_supertype(ScalarType::Int, ScalarType::Int),
            ScalarType::Int
        );
    }

    #[test]
    fn common_types_names_the_blocking_channel() {
        let dates = ChannelTypes::new(ScalarType::Date, ScalarType::Text);
        let ints = ChannelTypes::new(ScalarType::Int, ScalarType::Int);
        let err = common_types(dates, ints).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompatibleChannelTypes {
                channel: Channel::Value,
                left: ScalarType::Date,
                right: ScalarType::Int
            }
        ));
        let floats = ChannelTypes::new(ScalarType::Float, ScalarType::Text);
        assert_eq!(
            common_types(ints, floats).unwrap(),
            ChannelTypes::new(ScalarType::Float, ScalarType::Text)
        );
    }

    #[test]
    fn narrowing_casts_report_unrepresentable_values() {
        assert_eq!(
            cast_scalar(&Scalar::from("abc"), ScalarType::Int),
            None
        );
        assert_eq!(
            cast_scalar(&Scalar::from("42"), ScalarType::Int),
            Some(Scalar::Int(42))
        );
        assert_eq!(cast_scalar(&Scalar::Float(2.5), ScalarType::Int), None);
        assert_eq!(
            cast_scalar(&Scalar::Float(3.0), ScalarType::Int),
            Some(Scalar::Int(3))
        );
        assert_eq!(
            cast_scalar(&Scalar::Int(7), ScalarType::Text),
            Some(Scalar::from("7"))
        );
        assert!(!can_cast(ScalarType::Date, ScalarType::Float));
    }

    #[test]
    fn reason_casts_mark_unrepresentable_codes() {
        let cells: Vec<Cell> = vec![
            Channeled::Present(Scalar::Int(20)),
            Channeled::Absent(Reason::from("REFUSED")),
            Channeled::Absent(Reason::from("-99")),
            Channeled::Absent(Reason::ParseFailure),
        ];
        let column =
            Column::new(ChannelTypes::new(ScalarType::Int, ScalarType::Text), cells.into())
                .unwrap();

        let narrowed = cast_reason_channel(&column, ScalarType::Int).unwrap();
        assert_eq!(
            narrowed.types(),
            ChannelTypes::new(ScalarType::Int, ScalarType::Int)
        );
        assert_eq!(
            narrowed.data().as_slice(),
            &[
                Channeled::Present(Scalar::Int(20)),
                Channeled::Absent(Reason::CastFailure),
                Channeled::Absent(Reason::from(-99_i64)),
                Channeled::Absent(Reason::ParseFailure),
            ]
        );
    }

    #[test]
    fn impossible_reason_cast_names_the_reason_channel() {
        let visit = time::Date::from_calendar_date(2024, time::Month::January, 5).unwrap();
        let cells: Vec<Cell> = vec![
            Channeled::Present(Scalar::Int(1)),
            Channeled::Absent(Reason::Code(Scalar::Date(visit))),
        ];
        let column =
            Column::new(ChannelTypes::new(ScalarType::Int, ScalarType::Date), cells.into())
                .unwrap();

        let err = cast_reason_channel(&column, ScalarType::Int).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompatibleChannelTypes {
                channel: Channel::Reason,
                left: ScalarType::Date,
                right: ScalarType::Int
            }
        ));
        assert!(cast_value_channel(&column, ScalarType::Int).is_ok());
    }
}
