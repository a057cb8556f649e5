use crate::element::{Cell, Channeled, Reason};
use crate::error::{Channel, Error, Result};
use crate::promote::{
    ChannelTypes, cast_reason_channel, cast_scalar, cast_value_channel, common_types,
    reason_supertype,
};
use crate::scalar::{Scalar, ScalarType};
use crate::vector::{ChanneledVec, ReasonChannel, ValueChannel};

/// Dynamically typed channeled column.
///
/// Every present value has type `types.value` and every reason code has type
/// `types.reason`; failure markers are untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    types: ChannelTypes,
    data: ChanneledVec<Scalar, Reason>,
}

impl Column {
    /// Builds a column after checking every payload against `types`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleChannelTypes`] for the first payload whose
    /// type differs from the declared channel type.
    pub fn new(types: ChannelTypes, data: ChanneledVec<Scalar, Reason>) -> Result<Self> {
        for cell in &data {
            let (channel, expected, found) = match cell {
                Channeled::Present(value) => (Channel::Value, types.value, value.scalar_type()),
                Channeled::Absent(Reason::Code(code)) => {
                    (Channel::Reason, types.reason, code.scalar_type())
                }
                Channeled::Absent(_) => continue,
            };
            if expected != found {
                return Err(Error::IncompatibleChannelTypes {
                    channel,
                    left: expected,
                    right: found,
                });
            }
        }
        Ok(Self { types, data })
    }

    pub(crate) const fn from_parts(types: ChannelTypes, data: ChanneledVec<Scalar, Reason>) -> Self {
        Self { types, data }
    }

    /// An empty column with the given channel types.
    #[must_use]
    pub fn empty(types: ChannelTypes) -> Self {
        Self::from_parts(types, ChanneledVec::default())
    }

    #[must_use]
    pub const fn types(&self) -> ChannelTypes {
        self.types
    }

    #[must_use]
    pub const fn data(&self) -> &ChanneledVec<Scalar, Reason> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> ChanneledVec<Scalar, Reason> {
        self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] when `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&Cell> {
        self.data.at(index)
    }

    #[must_use]
    pub fn value_channel(&self) -> ValueChannel<'_, Scalar, Reason> {
        self.data.value_channel()
    }

    #[must_use]
    pub fn reason_channel(&self) -> ReasonChannel<'_, Scalar, Reason> {
        self.data.reason_channel()
    }

    /// Concatenates two columns with identical channel types.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the channel types differ; use
    /// [`Column::concat_promoted`] to unify them first.
    pub fn concat(&self, other: &Self) -> Result<Self> {
        if self.types != other.types {
            return Err(Error::TypeMismatch {
                left: self.types,
                right: other.types,
            });
        }
        Ok(Self::from_parts(self.types, self.data.concat(&other.data)))
    }

    /// Promotes both columns to their common channel types, then concatenates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleChannelTypes`] when no promotion exists.
    pub fn concat_promoted(&self, other: &Self) -> Result<Self> {
        let target = common_types(self.types, other.types)?;
        self.cast(target)?.concat(&other.cast(target)?)
    }

    /// Casts both channels to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleChannelTypes`] naming the channel without
    /// a conversion path.
    pub fn cast(&self, target: ChannelTypes) -> Result<Self> {
        let values = cast_value_channel(self, target.value)?;
        cast_reason_channel(&values, target.reason)
    }

    /// Maps present values into `target`-typed values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleChannelTypes`] if `f` yields a value of
    /// another type.
    pub fn map_values(&self, target: ScalarType, f: impl FnMut(&Scalar) -> Scalar) -> Result<Self> {
        Self::new(
            ChannelTypes::new(target, self.types.reason),
            self.data.map_value_channel(f),
        )
    }

    /// Maps reason codes into `target`-typed codes; failure markers pass
    /// through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleChannelTypes`] if `f` yields a code of
    /// another type.
    pub fn map_reasons(
        &self,
        target: ScalarType,
        mut f: impl FnMut(&Scalar) -> Scalar,
    ) -> Result<Self> {
        Self::new(
            ChannelTypes::new(self.types.value, target),
            self.data.map_reason_channel(|reason| match reason {
                Reason::Code(code) => Reason::Code(f(code)),
                failure => failure.clone(),
            }),
        )
    }

    /// Channel-preserving conditional between two columns of the same types.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] or [`Error::LengthMismatch`].
    pub fn select(&self, mask: &[bool], other: &Self) -> Result<Self> {
        if self.types != other.types {
            return Err(Error::TypeMismatch {
                left: self.types,
                right: other.types,
            });
        }
        Ok(Self::from_parts(self.types, self.data.select(mask, &other.data)?))
    }

    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the mask length differs.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        Ok(Self::from_parts(self.types, self.data.filter(mask)?))
    }

    /// Collapses both channels into one scalar sequence of a type able to
    /// hold values and reason codes alike. Failure markers become `None`.
    ///
    /// This discards which channel each scalar came from, so it is only ever
    /// done on request.
    #[must_use]
    pub fn flatten(&self) -> (ScalarType, Vec<Option<Scalar>>) {
        let target = reason_supertype(self.types.value, self.types.reason);
        let flat = self
            .data
            .iter()
            .map(|cell| match cell {
                Channeled::Present(value) => cast_scalar(value, target),
                Channeled::Absent(Reason::Code(code)) => cast_scalar(code, target),
                Channeled::Absent(_) => None,
            })
            .collect();
        (target, flat)
    }
}
