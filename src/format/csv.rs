//! CSV format implementation.

use std::io::{Read, Write};

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use super::tabular::{
    encode_rows, header_names, mapping_rows, record_from, select_rows, union_keys,
};
use super::{DecodeContext, Format, FormatError, FormatKind, LineOutcome, RejectedLine, split_lines};
use crate::config::{CsvOptions, ProcessingMode, QuotePolicy};
use crate::error::{FailedPayload, HandlerError};
use crate::tree::{Mapping, Scalar, TreeValue};

/// Delimited text using the csv crate.
#[derive(Debug, Clone)]
pub struct CsvFormat {
    options: CsvOptions,
    delimiter: u8,
    quote: u8,
    escape: Option<u8>,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            options: CsvOptions::default(),
            delimiter: b',',
            quote: b'"',
            escape: Some(b'\\'),
        }
    }
}

fn quote_style(policy: QuotePolicy) -> QuoteStyle {
    match policy {
        QuotePolicy::Minimal => QuoteStyle::Necessary,
        QuotePolicy::All => QuoteStyle::Always,
        QuotePolicy::NonNumeric => QuoteStyle::NonNumeric,
        QuotePolicy::None => QuoteStyle::Never,
    }
}

fn csv_error(e: csv::Error) -> FormatError {
    FormatError::Serde(Box::new(e))
}

impl CsvFormat {
    /// Fails when a delimiter, quote or escape character is not ASCII.
    pub fn new(options: CsvOptions) -> Result<Self, HandlerError> {
        Ok(Self {
            delimiter: options.delimiter_byte()?,
            quote: options.quote_byte()?,
            escape: options.escape_byte()?,
            options,
        })
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// First record of existing delimited content, `None` when it is empty.
    pub fn read_header<R: Read>(&self, reader: R) -> Result<Option<Vec<String>>, FormatError> {
        let mut reader = self.reader_builder().from_reader(reader);
        match reader.records().next() {
            Some(record) => {
                let record = record.map_err(csv_error)?;
                Ok(Some(record.iter().map(str::to_string).collect()))
            }
            None => Ok(None),
        }
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape);
        builder
    }

    fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .has_headers(false)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .quote_style(quote_style(self.options.quoting))
            .double_quote(true);
        if let Some(escape) = self.escape {
            builder.escape(escape);
        }
        builder
    }

    fn cell(&self, field: &str) -> TreeValue {
        if self.options.infer_types {
            TreeValue::Scalar(Scalar::infer(field))
        } else {
            TreeValue::Scalar(Scalar::Str(field.to_string()))
        }
    }

    fn parse_rows(&self, text: &str) -> Result<Vec<Vec<TreeValue>>, FormatError> {
        let mut reader = self.reader_builder().from_reader(text.as_bytes());
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(|field| self.cell(field)).collect());
        }
        Ok(rows)
    }

    /// Parse a single line on its own.
    fn parse_line(
        &self,
        raw: &[u8],
        ctx: &DecodeContext<'_>,
    ) -> Result<Vec<TreeValue>, (FailedPayload, FormatError)> {
        let text = ctx
            .text(raw)
            .map_err(|e| (FailedPayload::Raw(raw.to_vec()), e))?;
        let mut reader = self.reader_builder().from_reader(text.as_bytes());
        match reader.records().next() {
            Some(Ok(record)) => Ok(record.iter().map(|field| self.cell(field)).collect()),
            Some(Err(e)) => Err((FailedPayload::Text(text.to_string()), csv_error(e))),
            None => Ok(Vec::new()),
        }
    }

    fn write_rows(&self, rows: &[&Mapping], writer: &mut dyn Write) -> Result<(), FormatError> {
        let header = union_keys(rows);
        let mut wtr = self.writer_builder().from_writer(&mut *writer);
        if self.options.write_header && !header.is_empty() {
            wtr.write_record(&header).map_err(csv_error)?;
        }
        for row in rows {
            let record: Vec<String> = header
                .iter()
                .map(|key| row.get(key).map(TreeValue::cell_text).unwrap_or_default())
                .collect();
            wtr.write_record(&record).map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Format for CsvFormat {
    fn kind(&self) -> FormatKind {
        if self.delimiter == b'\t' {
            FormatKind::Tsv
        } else {
            FormatKind::Csv
        }
    }

    /// Documents always decode to a list of rows.
    fn supports_object(&self) -> bool {
        false
    }

    fn decode(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<TreeValue, FormatError> {
        let text = ctx.text(bytes)?;
        let (names, data) = select_rows(self.parse_rows(text)?, ctx.options);

        // Short rows are padded with nulls; long rows are malformed.
        let mut records = Vec::with_capacity(data.len());
        for (i, mut row) in data.into_iter().enumerate() {
            if !names.is_empty() && row.len() > names.len() {
                return Err(FormatError::Syntax(format!(
                    "data row {}: expected {} fields, found {}",
                    i + 1,
                    names.len(),
                    row.len()
                )));
            }
            row.resize(names.len().max(row.len()), TreeValue::NULL);
            records.push(record_from(&names, row));
        }
        Ok(TreeValue::Sequence(records))
    }

    fn decode_lines(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Vec<LineOutcome> {
        let mut outcomes = Vec::new();
        let mut lines = split_lines(bytes).skip(ctx.options.skiprows);

        let mut names = Vec::new();
        if let Some(header) = ctx.options.header {
            match lines.nth(header) {
                Some((line, raw)) => match self.parse_line(raw, ctx) {
                    Ok(cells) => names = header_names(&cells),
                    Err((raw, error)) => outcomes.push(Err(RejectedLine { line, raw, error })),
                },
                None => return outcomes,
            }
        }

        for (line, raw) in lines.take(ctx.options.nrows.unwrap_or(usize::MAX)) {
            let outcome = match self.parse_line(raw, ctx) {
                Ok(cells) if !names.is_empty() && cells.len() != names.len() => Err(RejectedLine {
                    line,
                    raw: FailedPayload::from_bytes(raw),
                    error: FormatError::Syntax(format!(
                        "expected {} fields, found {}",
                        names.len(),
                        cells.len()
                    )),
                }),
                Ok(cells) => Ok(record_from(&names, cells)),
                Err((raw, error)) => Err(RejectedLine { line, raw, error }),
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    fn encode(
        &self,
        value: &TreeValue,
        _mode: ProcessingMode,
        writer: &mut dyn Write,
    ) -> Result<(), FormatError> {
        let rows = encode_rows(value)?;
        self.write_rows(&rows, writer)
    }

    fn encode_lines(&self, records: &[TreeValue], writer: &mut dyn Write) -> Result<(), FormatError> {
        let rows = mapping_rows(records)?;
        self.write_rows(&rows, writer)
    }
}
