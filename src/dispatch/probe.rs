use crate::column::Column;
use crate::element::{Channeled, Reason};
use crate::promote::cast_scalar;
use crate::vector::ChanneledVec;

/// Comparison value that matches one specific absent reason.
///
/// `element == probe(r)` holds exactly when the element is `Absent(r)`; a
/// present element never matches, whatever its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonProbe<R> {
    reason: R,
}

impl<R> ReasonProbe<R> {
    #[must_use]
    pub const fn reason(&self) -> &R {
        &self.reason
    }
}

#[must_use]
pub const fn probe<R>(reason: R) -> ReasonProbe<R> {
    ReasonProbe { reason }
}

impl<V, R: PartialEq> PartialEq<ReasonProbe<R>> for Channeled<V, R> {
    fn eq(&self, other: &ReasonProbe<R>) -> bool {
        matches!(self, Self::Absent(reason) if *reason == other.reason)
    }
}

impl<V, R: PartialEq> ChanneledVec<V, R> {
    /// Boolean mask of the positions absent for the probed reason.
    #[must_use]
    pub fn matches_probe(&self, probe: &ReasonProbe<R>) -> Vec<bool> {
        self.iter().map(|element| element == probe).collect()
    }
}

impl Column {
    /// Like [`ChanneledVec::matches_probe`], with the probed code first cast
    /// to the column's reason type so `probe(Reason::from("-99"))` finds an
    /// integer `-99` reason.
    #[must_use]
    pub fn matches_probe(&self, probe: &ReasonProbe<Reason>) -> Vec<bool> {
        let reason = match &probe.reason {
            Reason::Code(code) => match cast_scalar(code, self.types().reason) {
                Some(code) => Reason::Code(code),
                None => return vec![false; self.len()],
            },
            failure => failure.clone(),
        };
        self.data().matches_probe(&ReasonProbe { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promote::ChannelTypes;
    use crate::scalar::{Scalar, ScalarType};

    #[test]
    fn probe_matches_only_its_reason() {
        let refused: Channeled<i64, &str> = Channeled::Absent("REFUSED");
        assert!(refused == probe("REFUSED"));
        assert!(refused != probe("OMITTED"));
        assert!(Channeled::<i64, &str>::Present(1) != probe("REFUSED"));
    }

    #[test]
    fn column_probe_selects_positions() {
        let column = Column::new(
            ChannelTypes::new(ScalarType::Int, ScalarType::Int),
            vec![
                Channeled::Present(Scalar::Int(-99)),
                Channeled::Absent(Reason::from(-99_i64)),
                Channeled::Absent(Reason::ParseFailure),
            ]
            .into(),
        )
        .unwrap();
        assert_eq!(
            column.matches_probe(&probe(Reason::from("-99"))),
            vec![false, true, false]
        );
        assert_eq!(
            column.matches_probe(&probe(Reason::ParseFailure)),
            vec![false, false, true]
        );
        assert_eq!(
            column.matches_probe(&probe(Reason::from("REFUSED"))),
            vec![false, false, false]
        );
    }
}
