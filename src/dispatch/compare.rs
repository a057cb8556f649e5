use std::cmp::Ordering;

use crate::column::Column;
use crate::element::{Channeled, Reason};
use crate::error::{Channel, Error, Result};
use crate::promote::common_types;
use crate::scalar::{Scalar, ScalarType};
use crate::vector::ChanneledVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Unordered pairs (NaN) compare unequal and fail every relation.
    fn holds(self, ordering: Option<Ordering>) -> bool {
        match self {
            Self::Ne => ordering != Some(Ordering::Equal),
            Self::Eq => ordering == Some(Ordering::Equal),
            Self::Lt => ordering.is_some_and(Ordering::is_lt),
            Self::Le => ordering.is_some_and(Ordering::is_le),
            Self::Gt => ordering.is_some_and(Ordering::is_gt),
            Self::Ge => ordering.is_some_and(Ordering::is_ge),
        }
    }
}

fn comparable(left: ScalarType, right: ScalarType) -> bool {
    left == right || (left.is_numeric() && right.is_numeric())
}

/// `Present(a)` equals `target` iff `a == target`; an absent element is
/// unequal to every plain value.
#[must_use]
pub fn eq_value(column: &Column, target: &Scalar) -> Vec<bool> {
    column
        .value_channel()
        .map(|value| value.is_some_and(|value| value.compare(target) == Some(Ordering::Equal)))
        .collect()
}

/// Relational comparison against a plain value. Absent elements stay absent
/// with their reason, so the result is itself channeled.
///
/// # Errors
///
/// Returns [`Error::IncompatibleChannelTypes`] when the column's values
/// cannot be ordered against `target`.
pub fn compare_value(
    column: &Column,
    op: CompareOp,
    target: &Scalar,
) -> Result<ChanneledVec<bool, Reason>> {
    let value_type = column.types().value;
    if !comparable(value_type, target.scalar_type()) {
        return Err(Error::IncompatibleChannelTypes {
            channel: Channel::Value,
            left: value_type,
            right: target.scalar_type(),
        });
    }
    Ok(column
        .data()
        .map_value_channel(|value| op.holds(value.compare(target))))
}

/// Elementwise comparison of two columns after promotion, with the same
/// absent-reason tie-break as arithmetic.
///
/// # Errors
///
/// Returns [`Error::IncompatibleChannelTypes`] or [`Error::LengthMismatch`].
pub fn compare_columns(
    left: &Column,
    op: CompareOp,
    right: &Column,
) -> Result<ChanneledVec<bool, Reason>> {
    let target = common_types(left.types(), right.types())?;
    let (left, right) = (left.cast(target)?, right.cast(target)?);
    left.data()
        .zip_with(right.data(), |a, b| op.holds(a.compare(b)))
}

impl ChanneledVec<bool, Reason> {
    /// Collapses a channeled mask, treating absent positions as `false`.
    #[must_use]
    pub fn to_mask(&self) -> Vec<bool> {
        self.iter()
            .map(|element| matches!(element, Channeled::Present(true)))
            .collect()
    }
}
