use serde::Serialize;

/// One cell that matched neither a missing token nor the value parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeProblem {
    /// Zero-based data row (header excluded).
    pub row: usize,
    pub column: String,
    pub raw: String,
}

/// Non-fatal problems collected while decoding, in row order per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecodeReport {
    problems: Vec<DecodeProblem>,
}

impl DecodeReport {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            problems: Vec::new(),
        }
    }

    pub fn push(&mut self, problem: DecodeProblem) {
        self.problems.push(problem);
    }

    /// Appends every problem of `other`, keeping its order.
    pub fn merge(&mut self, other: Self) {
        self.problems.extend(other.problems);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    #[must_use]
    pub fn problems(&self) -> &[DecodeProblem] {
        &self.problems
    }

    pub fn for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a DecodeProblem> {
        self.problems
            .iter()
            .filter(move |problem| problem.column == column)
    }

    #[must_use]
    pub fn into_problems(self) -> Vec<DecodeProblem> {
        self.problems
    }
}

impl From<Vec<DecodeProblem>> for DecodeReport {
    fn from(problems: Vec<DecodeProblem>) -> Self {
        Self { problems }
    }
}

impl<'a> IntoIterator for &'a DecodeReport {
    type Item = &'a DecodeProblem;
    type IntoIter = std::slice::Iter<'a, DecodeProblem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}
