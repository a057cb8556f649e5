use std::borrow::Cow;
use std::cmp::Ordering;

use crate::column::Column;
use crate::element::{Channeled, Reason};
use crate::error::{Error, Result};
use crate::scalar::{Scalar, ScalarType};

fn numeric(column: &Column, operation: &'static str) -> Result<()> {
    let value_type = column.types().value;
    if value_type.is_numeric() {
        Ok(())
    } else {
        Err(Error::UnsupportedOperation {
            operation: Cow::Borrowed(operation),
            value_type,
        })
    }
}

/// Sum of the present values. Integer and boolean columns sum to an integer,
/// float columns to a float; an all-absent column sums to zero.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] for non-numeric columns and
/// [`Error::ArithmeticOverflow`] naming the position where an integer sum
/// overflowed.
pub fn sum(column: &Column) -> Result<Scalar> {
    numeric(column, "sum")?;
    if column.types().value == ScalarType::Float {
        return Ok(Scalar::Float(
            column.data().present_values().filter_map(Scalar::as_f64).sum(),
        ));
    }

    let mut total: i64 = 0;
    for (index, cell) in column.data().iter().enumerate() {
        let value = match cell {
            Channeled::Present(Scalar::Int(v)) => *v,
            Channeled::Present(Scalar::Bool(v)) => i64::from(*v),
            _ => continue,
        };
        total = total
            .checked_add(value)
            .ok_or(Error::ArithmeticOverflow { index })?;
    }
    Ok(Scalar::Int(total))
}

/// Arithmetic mean of the present values; `None` when nothing is present.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] for non-numeric columns.
#[allow(clippy::cast_precision_loss)]
pub fn mean(column: &Column) -> Result<Option<f64>> {
    numeric(column, "mean")?;
    let (total, count) = column
        .data()
        .present_values()
        .filter_map(Scalar::as_f64)
        .fold((0.0, 0_usize), |(total, count), value| (total + value, count + 1));
    Ok((count > 0).then(|| total / count as f64))
}

fn extreme(column: &Column, operation: &'static str, keep: Ordering) -> Result<Option<Scalar>> {
    let mut best: Option<&Scalar> = None;
    let ordered = column
        .data()
        .present_values()
        .filter(|value| !matches!(value, Scalar::Float(v) if v.is_nan()));
    for value in ordered {
        best = match best {
            None => Some(value),
            Some(current) => match value.compare(current) {
                Some(ordering) if ordering == keep => Some(value),
                Some(_) => Some(current),
                None => {
                    return Err(Error::UnsupportedOperation {
                        operation: Cow::Borrowed(operation),
                        value_type: column.types().value,
                    });
                }
            },
        };
    }
    Ok(best.cloned())
}

/// Smallest present value. NaN is skipped.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] if two values cannot be ordered.
pub fn min(column: &Column) -> Result<Option<Scalar>> {
    extreme(column, "min", Ordering::Less)
}

/// Largest present value. NaN is skipped.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] if two values cannot be ordered.
pub fn max(column: &Column) -> Result<Option<Scalar>> {
    extreme(column, "max", Ordering::Greater)
}

#[must_use]
pub fn count_present(column: &Column) -> usize {
    column.data().count_present()
}

#[must_use]
pub fn count_absent(column: &Column) -> usize {
    column.data().count_absent()
}

/// Tabulates the reason channel in first-seen order.
#[must_use]
pub fn reason_counts(column: &Column) -> Vec<(Reason, usize)> {
    let mut counts: Vec<(Reason, usize)> = Vec::new();
    for reason in column.reason_channel().flatten() {
        match counts.iter_mut().find(|(seen, _)| seen == reason) {
            Some((_, count)) => *count += 1,
            None => counts.push((reason.clone(), 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Cell;
    use crate::promote::ChannelTypes;

    fn survey() -> Column {
        let cells: Vec<Cell> = vec![
            Channeled::Present(Scalar::Int(20)),
            Channeled::Absent(Reason::from("REFUSED")),
            Channeled::Present(Scalar::Int(21)),
            Channeled::Absent(Reason::ParseFailure),
            Channeled::Absent(Reason::from("REFUSED")),
        ];
        Column::new(ChannelTypes::new(ScalarType::Int, ScalarType::Text), cells.into()).unwrap()
    }

    #[test]
    fn value_reductions_skip_absents() {
        let column = survey();
        assert_eq!(sum(&column).unwrap(), Scalar::Int(41));
        assert_eq!(mean(&column).unwrap(), Some(20.5));
        assert_eq!(min(&column).unwrap(), Some(Scalar::Int(20)));
        assert_eq!(max(&column).unwrap(), Some(Scalar::Int(21)));
        assert_eq!(count_present(&column), 2);
        assert_eq!(count_absent(&column), 3);
    }

    #[test]
    fn sum_ignores_reason_rewrites() {
        let column = survey();
        let recoded = column
            .map_reasons(ScalarType::Text, |_| Scalar::from("OTHER"))
            .unwrap();
        assert_eq!(sum(&column).unwrap(), sum(&recoded).unwrap());
    }

    #[test]
    fn reasons_are_tabulated_in_order() {
        assert_eq!(
            reason_counts(&survey()),
            vec![(Reason::from("REFUSED"), 2), (Reason::ParseFailure, 1)]
        );
    }

    #[test]
    fn text_columns_have_min_but_no_mean() {
        let text = Column::new(
            ChannelTypes::new(ScalarType::Text, ScalarType::Text),
            vec![
                Channeled::Present(Scalar::from("b")),
                Channeled::Present(Scalar::from("a")),
            ]
            .into(),
        )
        .unwrap();
        assert_eq!(min(&text).unwrap(), Some(Scalar::from("a")));
        assert!(matches!(
            mean(&text),
            Err(Error::UnsupportedOperation { .. })
        ));
        let empty = Column::empty(ChannelTypes::new(ScalarType::Float, ScalarType::Text));
        assert_eq!(mean(&empty).unwrap(), None);
        assert_eq!(sum(&empty).unwrap(), Scalar::Float(0.0));
    }
}
