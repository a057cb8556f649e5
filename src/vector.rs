use std::iter::FusedIterator;
use std::slice;

use crate::element::Channeled;
use crate::error::{Error, Result};

/// Ordered, fixed-length collection of [`Channeled`] elements.
///
/// Storage is a single vector of tagged elements owned outright; channel views
/// borrow it without copying and every transformation returns a new vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ChanneledVec<V, R> {
    elements: Vec<Channeled<V, R>>,
}

impl<V, R> Default for ChanneledVec<V, R> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<V, R> ChanneledVec<V, R> {
    #[must_use]
    pub const fn new(elements: Vec<Channeled<V, R>>) -> Self {
        Self { elements }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Bounds-checked element access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] when `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&Channeled<V, R>> {
        self.elements.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.elements.len(),
        })
    }

    pub fn iter(&self) -> slice::Iter<'_, Channeled<V, R>> {
        self.elements.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Channeled<V, R>] {
        &self.elements
    }

    #[must_use]
    pub fn into_elements(self) -> Vec<Channeled<V, R>> {
        self.elements
    }

    /// Lazy view of the value channel: `Some` at present positions.
    #[must_use]
    pub fn value_channel(&self) -> ValueChannel<'_, V, R> {
        ValueChannel {
            inner: self.elements.iter(),
        }
    }

    /// Lazy view of the reason channel: `Some` at absent positions.
    #[must_use]
    pub fn reason_channel(&self) -> ReasonChannel<'_, V, R> {
        ReasonChannel {
            inner: self.elements.iter(),
        }
    }

    /// Present values only, in order.
    pub fn present_values(&self) -> impl Iterator<Item = &V> + '_ {
        self.value_channel().flatten()
    }

    #[must_use]
    pub fn count_present(&self) -> usize {
        self.elements.iter().filter(|e| e.is_present()).count()
    }

    #[must_use]
    pub fn count_absent(&self) -> usize {
        self.elements.len() - self.count_present()
    }
}

impl<V: Clone, R: Clone> ChanneledVec<V, R> {
    /// Transforms every present value; absent elements pass through.
    pub fn map_value_channel<V2>(&self, mut f: impl FnMut(&V) -> V2) -> ChanneledVec<V2, R> {
        self.elements
            .iter()
            .map(|element| match element {
                Channeled::Present(value) => Channeled::Present(f(value)),
                Channeled::Absent(reason) => Channeled::Absent(reason.clone()),
            })
            .collect()
    }

    /// Transforms every absent reason; present elements pass through.
    pub fn map_reason_channel<R2>(&self, mut f: impl FnMut(&R) -> R2) -> ChanneledVec<V, R2> {
        self.elements
            .iter()
            .map(|element| match element {
                Channeled::Present(value) => Channeled::Present(value.clone()),
                Channeled::Absent(reason) => Channeled::Absent(f(reason)),
            })
            .collect()
    }

    /// End-to-end concatenation of two vectors of the same element type.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut elements = Vec::with_capacity(self.len() + other.len());
        elements.extend_from_slice(&self.elements);
        elements.extend_from_slice(&other.elements);
        Self { elements }
    }

    /// Elementwise combination of two equally long vectors.
    ///
    /// `f` only sees pairs of present values. When either operand is absent
    /// the result is absent: the left operand's reason wins if it is absent,
    /// otherwise the right operand's reason is carried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] for operands of different lengths.
    pub fn zip_with<W>(
        &self,
        other: &Self,
        mut f: impl FnMut(&V, &V) -> W,
    ) -> Result<ChanneledVec<W, R>> {
        self.try_zip_with(other, |_, a, b| Ok(f(a, b)))
    }

    /// Fallible form of [`ChanneledVec::zip_with`]; `f` also receives the
    /// position. The first error aborts the whole operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] or the first error produced by `f`.
    pub fn try_zip_with<W>(
        &self,
        other: &Self,
        mut f: impl FnMut(usize, &V, &V) -> Result<W>,
    ) -> Result<ChanneledVec<W, R>> {
        ensure_same_len(self.len(), other.len())?;
        self.elements
            .iter()
            .zip(&other.elements)
            .enumerate()
            .map(|(index, pair)| match pair {
                (Channeled::Present(a), Channeled::Present(b)) => {
                    f(index, a, b).map(Channeled::Present)
                }
                (Channeled::Absent(reason), _) | (Channeled::Present(_), Channeled::Absent(reason)) => {
                    Ok(Channeled::Absent(reason.clone()))
                }
            })
            .collect()
    }

    /// Channel-preserving conditional: position `i` comes from `self` where
    /// `mask[i]` holds and from `other` elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the mask or `other` differ in length.
    pub fn select(&self, mask: &[bool], other: &Self) -> Result<Self> {
        ensure_same_len(self.len(), mask.len())?;
        ensure_same_len(self.len(), other.len())?;
        Ok(mask
            .iter()
            .zip(self.elements.iter().zip(&other.elements))
            .map(|(keep, (ours, theirs))| if *keep { ours.clone() } else { theirs.clone() })
            .collect())
    }

    /// Keeps the positions where `mask` is true.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the mask length differs.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        ensure_same_len(self.len(), mask.len())?;
        Ok(self
            .elements
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(element, _)| element.clone())
            .collect())
    }
}

pub(crate) fn ensure_same_len(left: usize, right: usize) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(Error::LengthMismatch { left, right })
    }
}

impl<V, R> FromIterator<Channeled<V, R>> for ChanneledVec<V, R> {
    fn from_iter<I: IntoIterator<Item = Channeled<V, R>>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<V, R> From<Vec<Channeled<V, R>>> for ChanneledVec<V, R> {
    fn from(elements: Vec<Channeled<V, R>>) -> Self {
        Self { elements }
    }
}

impl<'a, V, R> IntoIterator for &'a ChanneledVec<V, R> {
    type Item = &'a Channeled<V, R>;
    type IntoIter = slice::Iter<'a, Channeled<V, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<V, R> IntoIterator for ChanneledVec<V, R> {
    type Item = Channeled<V, R>;
    type IntoIter = std::vec::IntoIter<Channeled<V, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

/// Borrowed, restartable view over the value channel.
#[derive(Debug, Clone)]
pub struct ValueChannel<'a, V, R> {
    inner: slice::Iter<'a, Channeled<V, R>>,
}

impl<'a, V, R> Iterator for ValueChannel<'a, V, R> {
    type Item = Option<&'a V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Channeled::as_value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V, R> ExactSizeIterator for ValueChannel<'_, V, R> {}
impl<V, R> FusedIterator for ValueChannel<'_, V, R> {}

/// Borrowed, restartable view over the reason channel.
#[derive(Debug, Clone)]
pub struct ReasonChannel<'a, V, R> {
    inner: slice::Iter<'a, Channeled<V, R>>,
}

impl<'a, V, R> Iterator for ReasonChannel<'a, V, R> {
    type Item = Option<&'a R>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Channeled::as_reason)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V, R> ExactSizeIterator for ReasonChannel<'_, V, R> {}
impl<V, R> FusedIterator for ReasonChannel<'_, V, R> {}

#[cfg(test)]
mod tests {
    use super::*;

    type Vector = ChanneledVec<i64, &'static str>;

    fn sample() -> Vector {
        ChanneledVec::new(vec![
            Channeled::Present(20),
            Channeled::Absent("REFUSED"),
            Channeled::Present(21),
        ])
    }

    #[test]
    fn at_is_bounds_checked() {
        let v = sample();
        assert_eq!(v.at(1).unwrap(), &Channeled::Absent("REFUSED"));
        assert!(matches!(
            v.at(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn channel_views_are_dual_and_restartable() {
        let v = sample();
        let values = v.value_channel();
        let again = values.clone();
        assert_eq!(values.collect::<Vec<_>>(), vec![Some(&20), None, Some(&21)]);
        assert_eq!(again.len(), 3);
        assert_eq!(
            v.reason_channel().collect::<Vec<_>>(),
            vec![None, Some(&"REFUSED"), None]
        );
    }

    #[test]
    fn maps_touch_only_their_channel() {
        let v = sample();
        let doubled = v.map_value_channel(|x| x * 2);
        assert_eq!(
            doubled.as_slice(),
            &[
                Channeled::Present(40),
                Channeled::Absent("REFUSED"),
                Channeled::Present(42)
            ]
        );
        let lowered = v.map_reason_channel(|r| r.to_lowercase());
        assert_eq!(lowered.at(1).unwrap(), &Channeled::Absent("refused".to_owned()));
        assert_eq!(lowered.at(0).unwrap(), &Channeled::Present(20));
    }

    #[test]
    fn concat_preserves_order_and_length() {
        let a = sample();
        let b = ChanneledVec::new(vec![Channeled::Absent("OMITTED")]);
        let joined = a.concat(&b);
        assert_eq!(joined.len(), a.len() + b.len());
        assert_eq!(joined.at(3).unwrap(), &Channeled::Absent("OMITTED"));
        assert_eq!(joined.at(0).unwrap(), &Channeled::Present(20));
    }

    #[test]
    fn zip_keeps_left_reason_when_both_absent() {
        let left: Vector = ChanneledVec::new(vec![
            Channeled::Absent("L"),
            Channeled::Present(1),
            Channeled::Absent("L"),
            Channeled::Present(2),
        ]);
        let right: Vector = ChanneledVec::new(vec![
            Channeled::Absent("R"),
            Channeled::Absent("R"),
            Channeled::Present(5),
            Channeled::Present(3),
        ]);
        let summed = left.zip_with(&right, |a, b| a + b).unwrap();
        assert_eq!(
            summed.as_slice(),
            &[
                Channeled::Absent("L"),
                Channeled::Absent("R"),
                Channeled::Absent("L"),
                Channeled::Present(5)
            ]
        );
    }

    #[test]
    fn zip_rejects_length_mismatch() {
        let a = sample();
        let b: Vector = ChanneledVec::new(vec![Channeled::Present(1)]);
        assert!(matches!(
            a.zip_with(&b, |x, y| x + y),
            Err(Error::LengthMismatch { left: 3, right: 1 })
        ));
    }

    #[test]
    fn select_and_filter_preserve_tags() {
        let a = sample();
        let b: Vector = ChanneledVec::new(vec![
            Channeled::Absent("OMITTED"),
            Channeled::Present(0),
            Channeled::Present(0),
        ]);
        let chosen = a.select(&[false, true, true], &b).unwrap();
        assert_eq!(chosen.at(0).unwrap(), &Channeled::Absent("OMITTED"));
        assert_eq!(chosen.at(1).unwrap(), &Channeled::Absent("REFUSED"));
        let kept = a.filter(&[false, true, false]).unwrap();
        assert_eq!(kept.as_slice(), &[Channeled::Absent("REFUSED")]);
        assert_eq!(a.count_absent(), 1);
        assert_eq!(a.count_present(), 2);
    }
}
