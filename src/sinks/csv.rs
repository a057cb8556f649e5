use std::borrow::Cow;
use std::io::Write;

use csv::{ByteRecord, Writer, WriterBuilder};

use crate::error::{Error, Result};
use crate::sinks::{RowSink, SinkContext};

/// Writes re-encoded rows as delimited text (CSV/TSV).
pub struct CsvSink<W: Write> {
    output: Option<W>,
    writer: Option<Writer<W>>,
    delimiter: u8,
    write_headers: bool,
    column_count: usize,
    record: ByteRecord,
}

impl<W: Write> CsvSink<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            output: Some(writer),
            writer: None,
            delimiter: b',',
            write_headers: true,
            column_count: 0,
            record: ByteRecord::new(),
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_headers(mut self, headers: bool) -> Self {
        self.write_headers = headers;
        self
    }

    /// Returns the underlying writer once the sink has finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] while a write is still in progress.
    pub fn into_inner(self) -> Result<W> {
        self.output.ok_or_else(|| Error::InvalidConfig {
            details: Cow::from("CSV sink is still writing"),
        })
    }

    fn writer(&mut self) -> Result<&mut Writer<W>> {
        self.writer.as_mut().ok_or_else(|| Error::InvalidConfig {
            details: Cow::from("CSV sink used before begin"),
        })
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn begin(&mut self, context: SinkContext<'_>) -> Result<()> {
        let output = self.output.take().ok_or_else(|| Error::InvalidConfig {
            details: Cow::from("CSV sink cannot be reused without finishing"),
        })?;
        let writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(output);
        self.writer = Some(writer);
        self.column_count = context.names.len();
        self.record = ByteRecord::with_capacity(64 * self.column_count, self.column_count);

        if self.write_headers {
            let header: ByteRecord = context.names.iter().map(|name| name.as_bytes()).collect();
            self.writer()?.write_byte_record(&header)?;
        }
        Ok(())
    }

    fn write_row(&mut self, row: &[&str]) -> Result<()> {
        if row.len() != self.column_count {
            return Err(Error::LengthMismatch {
                left: self.column_count,
                right: row.len(),
            });
        }
        let mut record = std::mem::take(&mut self.record);
        record.clear();
        for field in row {
            record.push_field(field.as_bytes());
        }
        let written = self.writer()?.write_byte_record(&record);
        self.record = record;
        written?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            let out = writer.into_inner().map_err(|e| Error::Csv {
                details: Cow::Owned(format!("csv into_inner failed: {}", e.error())),
            })?;
            self.output = Some(out);
        }
        self.column_count = 0;
        self.record.clear();
        Ok(())
    }
}
