//! Splitting raw text cells into value and reason channels.
//!
//! A cell is checked against the column's missing tokens first (exact match),
//! then handed to the value parser. Cells that fail both become
//! `Absent(ParseFailure)` and are recorded in a [`DecodeReport`]; decoding
//! never aborts because of a single cell.

mod encode;
pub mod parser;
mod report;
mod tokens;


use rayon::prelude::*;

use crate::column::Column;
use crate::element::{Channeled, Reason};
use crate::error::Result;
use crate::promote::ChannelTypes;
use crate::scalar::{Scalar, ScalarType};
use crate::vector::ChanneledVec;

pub use encode::{ColumnEncoder, floats_look_integral};
pub use parser::{
    BoolParser, CategoricalParser, ColumnType, DateParser, FloatParser, IntParser, ParseFailure,
    ScalarParser, StandardGuesser, TextParser, TypeGuesser, ValueParser,
};
pub use report::{DecodeProblem, DecodeReport};
pub use tokens::{
    ColumnTokens, ColumnTokensConfig, MissingToken, MissingTokenSpec, MissingTokens,
    ReasonConfig, TokenConfig, TokenKeyword, TokenSpecConfig,
};

/// A decoded vector together with the problems found while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<V> {
    pub values: ChanneledVec<V, Reason>,
    pub report: DecodeReport,
}

/// Decodes the cells of one column with a typed value parser.
#[derive(Debug, Clone)]
pub struct ColumnDecoder<'a, P> {
    column: &'a str,
    tokens: &'a MissingTokens,
    parser: P,
}

impl<'a, P: ValueParser> ColumnDecoder<'a, P> {
    pub const fn new(column: &'a str, tokens: &'a MissingTokens, parser: P) -> Self {
        Self {
            column,
            tokens,
            parser,
        }
    }

    /// Decodes one cell without recording problems.
    pub fn decode_cell(&self, raw: &str) -> Channeled<P::Output, Reason> {
        if let Some(reason) = self.tokens.match_token(raw) {
            return Channeled::Absent(Reason::Code(reason.clone()));
        }
        self.parser
            .parse(raw)
            .map_or(Channeled::Absent(Reason::ParseFailure), Channeled::Present)
    }

    /// Sequential single pass over `cells`.
    pub fn decode<S: AsRef<str>>(&self, cells: &[S]) -> Decoded<P::Output> {
        let (values, problems) = self.decode_rows(cells, 0);
        Decoded {
            values: values.into(),
            report: problems.into(),
        }
    }

    /// Decodes `chunk_rows`-sized row ranges on the rayon pool. Chunks are
    /// reassembled by position, so the result equals [`ColumnDecoder::decode`].
    pub fn decode_par<S>(&self, cells: &[S], chunk_rows: usize) -> Decoded<P::Output>
    where
        S: AsRef<str> + Sync,
        P::Output: Send,
    {
        let chunk_rows = chunk_rows.max(1);
        let chunks: Vec<_> = cells
            .par_chunks(chunk_rows)
            .enumerate()
            .map(|(index, chunk)| self.decode_rows(chunk, index * chunk_rows))
            .collect();

        let mut values = Vec::with_capacity(cells.len());
        let mut report = DecodeReport::new();
        for (chunk_values, problems) in chunks {
            values.extend(chunk_values);
            report.merge(problems.into());
        }
        Decoded {
            values: values.into(),
            report,
        }
    }

    fn decode_rows<S: AsRef<str>>(
        &self,
        cells: &[S],
        first_row: usize,
    ) -> (Vec<Channeled<P::Output, Reason>>, Vec<DecodeProblem>) {
        let mut values = Vec::with_capacity(cells.len());
        let mut problems = Vec::new();
        for (offset, cell) in cells.iter().enumerate() {
            let raw = cell.as_ref();
            let decoded = self.decode_cell(raw);
            if matches!(decoded, Channeled::Absent(Reason::ParseFailure)) {
                problems.push(DecodeProblem {
                    row: first_row + offset,
                    column: self.column.to_owned(),
                    raw: raw.to_owned(),
                });
            }
            values.push(decoded);
        }
        (values, problems)
    }
}

/// Column that opted out of channels: native absents only.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainColumn {
    value_type: ScalarType,
    values: Vec<Option<Scalar>>,
}

impl PlainColumn {
    #[must_use]
    pub const fn new(value_type: ScalarType, values: Vec<Option<Scalar>>) -> Self {
        Self { value_type, values }
    }

    #[must_use]
    pub const fn value_type(&self) -> ScalarType {
        self.value_type
    }

    #[must_use]
    pub fn values(&self) -> &[Option<Scalar>] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of decoding one column of a load.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedColumn {
    Channeled(Column),
    Plain(PlainColumn),
}

impl DecodedColumn {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Channeled(column) => column.len(),
            Self::Plain(column) => column.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn value_type(&self) -> ScalarType {
        match self {
            Self::Channeled(column) => column.types().value,
            Self::Plain(column) => column.value_type(),
        }
    }

    #[must_use]
    pub const fn as_channeled(&self) -> Option<&Column> {
        match self {
            Self::Channeled(column) => Some(column),
            Self::Plain(_) => None,
        }
    }

    #[must_use]
    pub const fn as_plain(&self) -> Option<&PlainColumn> {
        match self {
            Self::Plain(column) => Some(column),
            Self::Channeled(_) => None,
        }
    }
}

/// Everything needed to decode one named column of a load.
#[derive(Clone, Copy)]
pub struct ColumnPlan<'a> {
    pub name: &'a str,
    /// `None` opts the column out of channels.
    pub tokens: Option<&'a MissingTokens>,
    pub column_type: &'a ColumnType,
    pub guesser: &'a dyn TypeGuesser,
    /// Row chunk size for parallel decoding; `None` decodes sequentially.
    pub chunk_rows: Option<usize>,
}

/// Output of [`ColumnPlan::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    pub column: DecodedColumn,
    pub report: DecodeReport,
}

impl ColumnPlan<'_> {
    /// Resolves the value type (guessing if requested) and decodes the cells.
    ///
    /// Columns without channels still treat the standard `""`/`"NA"` markers
    /// as native absents and still report unparsable cells.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if the column type cannot be
    /// turned into a parser.
    pub fn decode<S: AsRef<str> + Sync>(&self, cells: &[S]) -> Result<DecodeOutput> {
        let native = MissingTokens::standard();
        let tokens = self.tokens.unwrap_or(&native);
        let column_type = match self.column_type {
            ColumnType::Infer => self.infer(cells, tokens),
            other => other.clone(),
        };
        let parser = ScalarParser::for_type(&column_type)?;
        let value_type = parser.value_type();
        let decoder = ColumnDecoder::new(self.name, tokens, parser);
        let decoded = match self.chunk_rows {
            Some(rows) if cells.len() > rows => decoder.decode_par(cells, rows),
            _ => decoder.decode(cells),
        };

        let column = match self.tokens {
            Some(tokens) => DecodedColumn::Channeled(Column::from_parts(
                ChannelTypes::new(value_type, tokens.reason_type()),
                decoded.values,
            )),
            None => DecodedColumn::Plain(PlainColumn::new(
                value_type,
                decoded
                    .values
                    .into_iter()
                    .map(|cell| match cell {
                        Channeled::Present(value) => Some(value),
                        Channeled::Absent(_) => None,
                    })
                    .collect(),
            )),
        };
        Ok(DecodeOutput {
            column,
            report: decoded.report,
        })
    }

    /// Guesses from the cells no missing token consumed.
    fn infer<S: AsRef<str>>(&self, cells: &[S], tokens: &MissingTokens) -> ColumnType {
        let candidates: Vec<&str> = cells
            .iter()
            .map(|cell| cell.as_ref())
            .filter(|raw| !raw.is_empty() && tokens.match_token(raw).is_none())
            .collect();
        self.guesser.guess(&candidates)
    }
}
