use std::borrow::Cow;
use std::fmt;

use crate::column::Column;
use crate::element::Channeled;
use crate::error::{Channel, Error, Result};
use crate::promote::{ChannelTypes, cast_scalar, cast_value_channel, common_types, value_supertype};
use crate::scalar::{Scalar, ScalarType};
use crate::vector::ChanneledVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Always produces floats.
    Div,
}

impl BinaryOp {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    /// Value type of the result for operands promoted to `operand`.
    fn output_type(self, operand: ScalarType) -> Result<ScalarType> {
        match (self, operand) {
            (Self::Div, ScalarType::Bool | ScalarType::Int | ScalarType::Float)
            | (_, ScalarType::Float) => Ok(ScalarType::Float),
            (_, ScalarType::Bool | ScalarType::Int) => Ok(ScalarType::Int),
            (_, ScalarType::Text | ScalarType::Date) => Err(Error::UnsupportedOperation {
                operation: Cow::Borrowed(self.name()),
                value_type: operand,
            }),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn int_operand(value: &Scalar) -> Option<i64> {
    match value {
        Scalar::Bool(v) => Some(i64::from(*v)),
        Scalar::Int(v) => Some(*v),
        _ => None,
    }
}

fn apply(op: BinaryOp, index: usize, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    let unsupported = || Error::UnsupportedOperation {
        operation: Cow::Borrowed(op.name()),
        value_type: left.scalar_type(),
    };

    let checked: fn(i64, i64) -> Option<i64> = match op {
        BinaryOp::Add => i64::checked_add,
        BinaryOp::Sub => i64::checked_sub,
        BinaryOp::Mul => i64::checked_mul,
        BinaryOp::Div => return apply_float(op, left, right).ok_or_else(unsupported),
    };
    if matches!(left, Scalar::Float(_)) || matches!(right, Scalar::Float(_)) {
        return apply_float(op, left, right).ok_or_else(unsupported);
    }

    let (a, b) = (
        int_operand(left).ok_or_else(unsupported)?,
        int_operand(right).ok_or_else(unsupported)?,
    );
    checked(a, b)
        .map(Scalar::Int)
        .ok_or(Error::ArithmeticOverflow { index })
}

fn apply_float(op: BinaryOp, left: &Scalar, right: &Scalar) -> Option<Scalar> {
    let (a, b) = (left.as_f64()?, right.as_f64()?);
    Some(Scalar::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
    }))
}

/// Elementwise arithmetic between two columns of equal length.
///
/// Both operands are promoted to their common channel types first. Where
/// either side is absent the result is absent: the left reason wins when the
/// left operand is absent, otherwise the right operand's reason is kept.
///
/// # Errors
///
/// Returns [`Error::IncompatibleChannelTypes`], [`Error::UnsupportedOperation`]
/// for non-numeric values, [`Error::LengthMismatch`], or
/// [`Error::ArithmeticOverflow`] for the first overflowing integer position.
pub fn binary(left: &Column, op: BinaryOp, right: &Column) -> Result<Column> {
    let target = common_types(left.types(), right.types())?;
    let output = op.output_type(target.value)?;
    let (left, right) = (left.cast(target)?, right.cast(target)?);
    let data = left
        .data()
        .try_zip_with(right.data(), |index, a, b| apply(op, index, a, b))?;
    Ok(Column::from_parts(
        ChannelTypes::new(output, target.reason),
        data,
    ))
}

/// Applies `op` between every element of `left` and one plain value.
///
/// # Errors
///
/// Same as [`binary`], minus the length check.
pub fn binary_scalar(left: &Column, op: BinaryOp, right: &Scalar) -> Result<Column> {
    let types = left.types();
    let operand = value_supertype(types.value, right.scalar_type()).ok_or(
        Error::IncompatibleChannelTypes {
            channel: Channel::Value,
            left: types.value,
            right: right.scalar_type(),
        },
    )?;
    let output = op.output_type(operand)?;
    let left = cast_value_channel(left, operand)?;
    let right = cast_scalar(right, operand).ok_or(Error::IncompatibleChannelTypes {
        channel: Channel::Value,
        left: right.scalar_type(),
        right: operand,
    })?;
    let data = left
        .data()
        .iter()
        .enumerate()
        .map(|(index, cell)| match cell {
            Channeled::Present(value) => apply(op, index, value, &right).map(Channeled::Present),
            Channeled::Absent(reason) => Ok(Channeled::Absent(reason.clone())),
        })
        .collect::<Result<ChanneledVec<_, _>>>()?;
    Ok(Column::from_parts(
        ChannelTypes::new(output, types.reason),
        data,
    ))
}

/// # Errors
///
/// See [`binary`].
pub fn add(left: &Column, right: &Column) -> Result<Column> {
    binary(left, BinaryOp::Add, right)
}

/// # Errors
///
/// See [`binary`].
pub fn sub(left: &Column, right: &Column) -> Result<Column> {
    binary(left, BinaryOp::Sub, right)
}

/// # Errors
///
/// See [`binary`].
pub fn mul(left: &Column, right: &Column) -> Result<Column> {
    binary(left, BinaryOp::Mul, right)
}

/// # Errors
///
/// See [`binary`].
pub fn div(left: &Column, right: &Column) -> Result<Column> {
    binary(left, BinaryOp::Div, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Cell, Reason};

    fn column(value: ScalarType, cells: Vec<Cell>) -> Column {
        Column::new(ChannelTypes::new(value, ScalarType::Text), cells.into()).unwrap()
    }

    #[test]
    fn absent_reason_tie_break() {
        let left = column(
            ScalarType::Int,
            vec![
                Channeled::Present(Scalar::Int(1)),
                Channeled::Absent(Reason::from("A")),
                Channeled::Absent(Reason::from("B")),
            ],
        );
        let right = column(
            ScalarType::Int,
            vec![
                Channeled::Absent(Reason::from("X")),
                Channeled::Present(Scalar::Int(2)),
                Channeled::Absent(Reason::from("Y")),
            ],
        );
        let sum = add(&left, &right).unwrap();
        assert_eq!(
            sum.data().as_slice(),
            &[
                Channeled::Absent(Reason::from("X")),
                Channeled::Absent(Reason::from("A")),
                Channeled::Absent(Reason::from("B")),
            ]
        );
    }

    #[test]
    fn int_arithmetic_promotes_and_checks_overflow() {
        let ints = column(ScalarType::Int, vec![Channeled::Present(Scalar::Int(3))]);
        let floats = column(ScalarType::Float, vec![Channeled::Present(Scalar::Float(0.5))]);
        let mixed = mul(&ints, &floats).unwrap();
        assert_eq!(mixed.types().value, ScalarType::Float);
        assert_eq!(mixed.at(0).unwrap(), &Channeled::Present(Scalar::Float(1.5)));

        let quotient = div(&ints, &ints).unwrap();
        assert_eq!(quotient.at(0).unwrap(), &Channeled::Present(Scalar::Float(1.0)));

        let big = column(ScalarType::Int, vec![Channeled::Present(Scalar::Int(i64::MAX))]);
        assert!(matches!(
            add(&big, &ints),
            Err(Error::ArithmeticOverflow { index: 0 })
        ));
    }

    #[test]
    fn text_values_are_rejected() {
        let text = column(ScalarType::Text, vec![Channeled::Present(Scalar::from("a"))]);
        assert!(matches!(
            add(&text, &text),
            Err(Error::UnsupportedOperation {
                value_type: ScalarType::Text,
                ..
            })
        ));
    }

    #[test]
    fn scalar_broadcast_keeps_reasons() {
        let ages = column(
            ScalarType::Int,
            vec![
                Channeled::Present(Scalar::Int(20)),
                Channeled::Absent(Reason::from("REFUSED")),
            ],
        );
        let older = binary_scalar(&ages, BinaryOp::Add, &Scalar::Int(1)).unwrap();
        assert_eq!(
            older.data().as_slice(),
            &[
                Channeled::Present(Scalar::Int(21)),
                Channeled::Absent(Reason::from("REFUSED")),
            ]
        );
        let halves = binary_scalar(&ages, BinaryOp::Mul, &Scalar::Float(0.5)).unwrap();
        assert_eq!(halves.at(0).unwrap(), &Channeled::Present(Scalar::Float(10.0)));
    }
}
