//! Loading delimited text into channeled columns.
//!
//! Every field is decoded from the configured input encoding first, then the
//! record set is transposed into columns and each column runs through its
//! [`ColumnPlan`] on the rayon pool. Column order follows the header.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use csv::{ByteRecord, ReaderBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, NamedColumn};
use crate::decode::{
    ColumnPlan, ColumnType, DecodeOutput, DecodeReport, MissingTokenSpec, StandardGuesser,
    TokenSpecConfig, TypeGuesser,
};
use crate::encoding::{decode_field, resolve_encoding};
use crate::error::{Error, Result};
use crate::logger;

/// Options controlling how delimited text is split and decoded.
#[derive(Clone)]
pub struct LoadOptions {
    delimiter: u8,
    has_headers: bool,
    encoding: Option<String>,
    tokens: MissingTokenSpec,
    column_types: HashMap<String, ColumnType>,
    default_type: ColumnType,
    chunk_rows: Option<usize>,
    guesser: Arc<dyn TypeGuesser>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("delimiter", &char::from(self.delimiter))
            .field("has_headers", &self.has_headers)
            .field("encoding", &self.encoding)
            .field("tokens", &self.tokens)
            .field("column_types", &self.column_types)
            .field("default_type", &self.default_type)
            .field("chunk_rows", &self.chunk_rows)
            .finish_non_exhaustive()
    }
}

impl LoadOptions {
    /// Comma-separated UTF-8 with a header, the standard `""`/`"NA"` tokens
    /// for every column, and inferred types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            encoding: None,
            tokens: MissingTokenSpec::default(),
            column_types: HashMap::new(),
            default_type: ColumnType::Infer,
            chunk_rows: None,
            guesser: Arc::new(StandardGuesser),
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Decodes input fields from `label` (any WHATWG label, plus a few Mac
    /// aliases) instead of UTF-8.
    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.encoding = (!label.trim().is_empty()).then_some(label);
        self
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: MissingTokenSpec) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_column_type(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.column_types.insert(name.into(), column_type);
        self
    }

    /// Type for columns without an explicit entry.
    #[must_use]
    pub fn with_default_type(mut self, column_type: ColumnType) -> Self {
        self.default_type = column_type;
        self
    }

    /// Splits long columns into `rows`-sized chunks decoded in parallel.
    #[must_use]
    pub const fn with_chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = if rows == 0 { None } else { Some(rows) };
        self
    }

    #[must_use]
    pub fn with_guesser(mut self, guesser: Arc<dyn TypeGuesser>) -> Self {
        self.guesser = guesser;
        self
    }

    #[must_use]
    pub const fn tokens(&self) -> &MissingTokenSpec {
        &self.tokens
    }

    #[must_use]
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }

    #[must_use]
    pub const fn has_headers(&self) -> bool {
        self.has_headers
    }

    fn column_type(&self, name: &str) -> &ColumnType {
        self.column_types.get(name).unwrap_or(&self.default_type)
    }

    fn check_columns(&self, names: &[String]) -> Result<()> {
        let configured = self
            .column_types
            .keys()
            .map(String::as_str)
            .chain(self.tokens.column_names());
        for name in configured {
            if !names.iter().any(|known| known == name) {
                return Err(Error::UnknownColumn {
                    name: name.to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// JSON description of a load, as accepted by the command line tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    pub delimiter: Option<char>,
    pub has_headers: Option<bool>,
    pub encoding: Option<String>,
    pub tokens: TokenSpecConfig,
    pub column_types: BTreeMap<String, ColumnType>,
    pub default_type: ColumnType,
    pub chunk_rows: Option<usize>,
}

impl LoadConfig {
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Json`]
    /// if it is not a valid configuration.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed or unknown fields.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates the configuration into load options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-ASCII delimiter and
    /// [`Error::AmbiguousTokens`] for conflicting token lists.
    pub fn into_options(self) -> Result<LoadOptions> {
        let mut options = LoadOptions::new()
            .with_tokens(self.tokens.build()?)
            .with_default_type(self.default_type);
        if let Some(delimiter) = self.delimiter {
            let byte = u8::try_from(delimiter)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| Error::InvalidConfig {
                    details: Cow::Owned(format!("delimiter {delimiter:?} is not ASCII")),
                })?;
            options = options.with_delimiter(byte);
        }
        if let Some(has_headers) = self.has_headers {
            options = options.with_headers(has_headers);
        }
        if let Some(label) = self.encoding {
            options = options.with_encoding(label);
        }
        if let Some(rows) = self.chunk_rows {
            options = options.with_chunk_rows(rows);
        }
        for (name, column_type) in self.column_types {
            options = options.with_column_type(name, column_type);
        }
        Ok(options)
    }
}

/// Decoded dataset plus every non-fatal problem met while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub dataset: Dataset,
    /// Problems grouped by column in header order, rows ascending.
    pub report: DecodeReport,
}

/// Opens `path` and loads it with [`read_csv_from_reader`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened, plus every error of
/// [`read_csv_from_reader`].
pub fn read_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Loaded> {
    let file = File::open(path.as_ref())?;
    read_csv_from_reader(BufReader::new(file), options)
}

/// Reads delimited text and decodes every column.
///
/// Unparsable cells never fail the load: they become
/// `Absent(ParseFailure)`, land in [`Loaded::report`], and each affected
/// column logs one warning.
///
/// # Errors
///
/// Returns [`Error::Csv`] for malformed or ragged records,
/// [`Error::Encoding`] for undecodable fields, [`Error::UnknownColumn`] for
/// configuration naming a column the input lacks, and
/// [`Error::InvalidConfig`] for duplicate header names or unusable column
/// types.
pub fn read_csv_from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Loaded> {
    let encoding = resolve_encoding(options.encoding.as_deref())?;
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .from_reader(reader);

    let mut names: Vec<String> = Vec::new();
    if options.has_headers {
        for field in csv_reader.byte_headers()? {
            names.push(decode_field(field, encoding)?.into_owned());
        }
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    let mut record = ByteRecord::new();
    while csv_reader.read_byte_record(&mut record)? {
        if cells.is_empty() {
            cells = vec![Vec::new(); record.len()];
        }
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(decode_field(field, encoding)?.into_owned());
        }
    }
    if !options.has_headers {
        names = (1..=cells.len()).map(|index| format!("column_{index}")).collect();
    }
    options.check_columns(&names)?;

    let outputs: Vec<DecodeOutput> = names
        .par_iter()
        .zip(cells.par_iter())
        .map(|(name, cells)| {
            let plan = ColumnPlan {
                name,
                tokens: options.tokens.resolve(name),
                column_type: options.column_type(name),
                guesser: options.guesser.as_ref(),
                chunk_rows: options.chunk_rows,
            };
            let output = plan.decode(cells)?;
            logger::warn_decode_problems(name, output.report.problems());
            Ok(output)
        })
        .collect::<Result<_>>()?;

    let mut report = DecodeReport::new();
    let mut columns = Vec::with_capacity(outputs.len());
    for (name, output) in names.into_iter().zip(outputs) {
        report.merge(output.report);
        columns.push(NamedColumn::new(name, output.column));
    }
    Ok(Loaded {
        dataset: Dataset::new(columns)?,
        report,
    })
}
