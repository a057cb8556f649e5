use std::borrow::Cow;
use std::collections::HashSet;

use crate::column::Column;
use crate::decode::DecodedColumn;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct NamedColumn {
    pub name: String,
    pub column: DecodedColumn,
}

impl NamedColumn {
    pub fn new(name: impl Into<String>, column: DecodedColumn) -> Self {
        Self {
            name: name.into(),
            column,
        }
    }
}

/// Ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<NamedColumn>,
}

impl Dataset {
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the columns differ in length and
    /// [`Error::InvalidConfig`] for a repeated name.
    pub fn new(columns: Vec<NamedColumn>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for named in &columns {
            if !seen.insert(named.name.as_str()) {
                return Err(Error::InvalidConfig {
                    details: Cow::Owned(format!("duplicate column name '{}'", named.name)),
                });
            }
        }
        if let Some(first) = columns.first() {
            for named in &columns[1..] {
                if named.column.len() != first.column.len() {
                    return Err(Error::LengthMismatch {
                        left: first.column.len(),
                        right: named.column.len(),
                    });
                }
            }
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn columns(&self) -> &[NamedColumn] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|named| named.name.as_str())
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |named| named.column.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] if no column has this name.
    pub fn column(&self, name: &str) -> Result<&DecodedColumn> {
        self.columns
            .iter()
            .find(|named| named.name == name)
            .map(|named| &named.column)
            .ok_or_else(|| Error::UnknownColumn {
                name: name.to_owned(),
            })
    }

    /// The named column if it was decoded into channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`], or [`Error::NotChanneled`] for a
    /// column that opted out of channels.
    pub fn channeled(&self, name: &str) -> Result<&Column> {
        self.column(name)?
            .as_channeled()
            .ok_or_else(|| Error::NotChanneled {
                name: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PlainColumn;
    use crate::scalar::{Scalar, ScalarType};

    fn plain(values: Vec<Option<Scalar>>) -> DecodedColumn {
        DecodedColumn::Plain(PlainColumn::new(ScalarType::Int, values))
    }

    #[test]
    fn lookup_by_name() {
        let dataset = Dataset::new(vec![
            NamedColumn::new("id", plain(vec![Some(Scalar::Int(1))])),
            NamedColumn::new("n", plain(vec![None])),
        ])
        .unwrap();
        assert_eq!(dataset.num_rows(), 1);
        assert_eq!(dataset.names().collect::<Vec<_>>(), ["id", "n"]);
        assert!(matches!(
            dataset.column("missing"),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(
            dataset.channeled("id"),
            Err(Error::NotChanneled { ref name }) if name == "id"
        ));
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let ragged = Dataset::new(vec![
            NamedColumn::new("a", plain(vec![None])),
            NamedColumn::new("b", plain(vec![None, None])),
        ]);
        assert!(matches!(ragged, Err(Error::LengthMismatch { left: 1, right: 2 })));
        let duplicate = Dataset::new(vec![
            NamedColumn::new("a", plain(vec![])),
            NamedColumn::new("a", plain(vec![])),
        ]);
        assert!(matches!(duplicate, Err(Error::InvalidConfig { .. })));
    }
}
