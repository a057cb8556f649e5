mod csv;

use std::collections::HashMap;

use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;

use crate::dataset::Dataset;
use crate::decode::{
    ColumnEncoder, DecodeReport, DecodedColumn, MissingTokenSpec, floats_look_integral,
};
use crate::element::{Channeled, Reason};
use crate::error::Result;
use crate::logger::log_warn;
use crate::reader::Loaded;

pub use self::csv::CsvSink;

/// Column names handed to a sink before the first row.
pub struct SinkContext<'a> {
    pub names: Vec<&'a str>,
}

impl<'a> SinkContext<'a> {
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            names: dataset.names().collect(),
        }
    }
}

/// Trait implemented by sinks that consume re-encoded text rows.
pub trait RowSink {
    /// Called before any rows are written to allow the sink to initialise internal state.
    fn begin(&mut self, context: SinkContext<'_>) -> Result<()>;

    /// Invoked once per row with one encoded field per column.
    fn write_row(&mut self, row: &[&str]) -> Result<()>;

    /// Called once all rows have been forwarded to the sink.
    fn finish(&mut self) -> Result<()>;
}

/// Re-encodes `dataset` with `tokens` and streams it row by row into `sink`.
///
/// Reason codes render as the first token configured for them in the
/// column's token set, so decoding the output with the same tokens yields
/// the same dataset. Failure markers have no raw text here and render as
/// empty fields; one warning is logged per affected column. Use
/// [`write_loaded`] to keep the text of unparsable cells.
///
/// # Errors
///
/// Returns any error raised by the sink.
pub fn write_dataset<S: RowSink + ?Sized>(
    sink: &mut S,
    dataset: &Dataset,
    tokens: &MissingTokenSpec,
) -> Result<()> {
    write_columns(sink, dataset, tokens, None)
}

/// Re-encodes a loaded dataset, writing every unparsable cell back as the raw
/// text recorded in its decode report.
///
/// Reloading the output with the same options reproduces both the dataset
/// and the report.
///
/// # Errors
///
/// Returns any error raised by the sink.
pub fn write_loaded<S: RowSink + ?Sized>(
    sink: &mut S,
    loaded: &Loaded,
    tokens: &MissingTokenSpec,
) -> Result<()> {
    write_columns(sink, &loaded.dataset, tokens, Some(&loaded.report))
}

fn write_columns<S: RowSink + ?Sized>(
    sink: &mut S,
    dataset: &Dataset,
    tokens: &MissingTokenSpec,
    report: Option<&DecodeReport>,
) -> Result<()> {
    let mut ryu = RyuBuffer::new();
    let mut itoa = ItoaBuffer::new();
    let encoded: Vec<Vec<String>> = dataset
        .columns()
        .iter()
        .map(|named| {
            let integral = match &named.column {
                DecodedColumn::Channeled(column) => {
                    floats_look_integral(column.data().present_values())
                }
                DecodedColumn::Plain(column) => {
                    floats_look_integral(column.values().iter().flatten())
                }
            };
            let encoder =
                ColumnEncoder::new(tokens.resolve(&named.name)).with_float_suffix(integral);
            let raw: HashMap<usize, &str> = report
                .map(|report| {
                    report
                        .for_column(&named.name)
                        .map(|problem| (problem.row, problem.raw.as_str()))
                        .collect()
                })
                .unwrap_or_default();
            let mut blanked = 0_usize;
            let fields: Vec<String> = match &named.column {
                DecodedColumn::Channeled(column) => column
                    .data()
                    .iter()
                    .enumerate()
                    .map(|(row, cell)| match (cell, raw.get(&row)) {
                        (Channeled::Absent(Reason::ParseFailure), Some(text)) => {
                            (*text).to_owned()
                        }
                        _ => {
                            if matches!(
                                cell,
                                Channeled::Absent(Reason::ParseFailure | Reason::CastFailure)
                            ) {
                                blanked += 1;
                            }
                            let mut out = String::new();
                            encoder.encode_cell_into(cell, &mut out, &mut ryu, &mut itoa);
                            out
                        }
                    })
                    .collect(),
                DecodedColumn::Plain(column) => {
                    let mut fields = encoder.encode_plain(column);
                    for (row, value) in column.values().iter().enumerate() {
                        if let (None, Some(text)) = (value, raw.get(&row)) {
                            fields[row] = (*text).to_owned();
                        }
                    }
                    fields
                }
            };
            if blanked > 0 {
                let noun = if blanked == 1 { "marker" } else { "markers" };
                log_warn(&format!(
                    "{blanked} failure {noun} in column '{}' written as empty fields",
                    named.name
                ));
            }
            fields
        })
        .collect();

    sink.begin(SinkContext::new(dataset))?;
    let mut row: Vec<&str> = Vec::with_capacity(encoded.len());
    for index in 0..dataset.num_rows() {
        row.clear();
        row.extend(encoded.iter().map(|column| column[index].as_str()));
        sink.write_row(&row)?;
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{ColumnTokens, ColumnType};
    use crate::reader::{LoadOptions, read_csv_from_reader};

    fn render(write: impl FnOnce(&mut CsvSink<Vec<u8>>) -> Result<()>) -> String {
        let mut sink = CsvSink::new(Vec::new());
        write(&mut sink).unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn unparsable_cells_survive_a_reload() {
        let options = LoadOptions::new().with_column_type("age", ColumnType::Int);
        let loaded = read_csv_from_reader("age\n20\ntwenty\n".as_bytes(), &options).unwrap();

        let text = render(|sink| write_loaded(sink, &loaded, options.tokens()));
        assert_eq!(text, "age\n20\ntwenty\n");

        let reloaded = read_csv_from_reader(text.as_bytes(), &options).unwrap();
        assert_eq!(
            reloaded.dataset.channeled("age").unwrap().at(1).unwrap(),
            &Channeled::Absent(Reason::ParseFailure)
        );
        assert_eq!(reloaded.report, loaded.report);
    }

    #[test]
    fn plain_columns_keep_unparsable_text() {
        let tokens = MissingTokenSpec::default().with_column("id", ColumnTokens::NoChannel);
        let options = LoadOptions::new()
            .with_tokens(tokens)
            .with_column_type("id", ColumnType::Int);
        let loaded = read_csv_from_reader("id\n1\nNA\nx\n".as_bytes(), &options).unwrap();
        assert_eq!(loaded.report.len(), 1);

        let text = render(|sink| write_loaded(sink, &loaded, options.tokens()));
        // A lone empty field is quoted so the record is not read as blank.
        assert_eq!(text, "id\n1\n\"\"\nx\n");
    }

    #[test]
    fn markers_without_raw_text_are_blanked() {
        let options = LoadOptions::new().with_column_type("age", ColumnType::Int);
        let loaded = read_csv_from_reader("age,n\ntwenty,1\n".as_bytes(), &options).unwrap();
        let text = render(|sink| write_dataset(sink, &loaded.dataset, options.tokens()));
        assert_eq!(text, "age,n\n,1\n");
    }

    #[test]
    fn whole_float_columns_stay_float() {
        let options = LoadOptions::new();
        let loaded = read_csv_from_reader("w,x\n1.0,1.5\n2.0,2.0\n".as_bytes(), &options).unwrap();

        let text = render(|sink| write_loaded(sink, &loaded, options.tokens()));
        assert_eq!(text, "w,x\n1.0,1.5\n2.0,2\n");

        let reloaded = read_csv_from_reader(text.as_bytes(), &options).unwrap();
        assert_eq!(reloaded.dataset, loaded.dataset);
    }
}
