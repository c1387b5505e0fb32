//! Excel format implementation (`calamine` read, `rust_xlsxwriter` write).

use std::io::{Cursor, Write};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use rust_xlsxwriter::{Workbook, Worksheet};

use super::tabular::{encode_rows, record_from, select_rows, union_keys};
use super::{DecodeContext, Format, FormatError, FormatKind};
use crate::config::{ExcelOptions, ProcessingMode};
use crate::tree::{Scalar, TreeValue};

/// Spreadsheet workbooks. Binary only and never line oriented.
#[derive(Debug, Clone, Default)]
pub struct ExcelFormat {
    options: ExcelOptions,
}

impl ExcelFormat {
    pub fn new(options: ExcelOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExcelOptions {
        &self.options
    }
}

fn codec(e: impl std::fmt::Display) -> FormatError {
    FormatError::Other(e.to_string())
}

/// Integral floats come back as integers.
fn cell_value(cell: &Data) -> TreeValue {
    let scalar = match cell {
        Data::Int(i) => Scalar::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Scalar::Int(*f as i64),
        Data::Float(f) => Scalar::Float(*f),
        Data::String(s) if s.is_empty() => Scalar::Null,
        Data::String(s) => Scalar::Str(s.clone()),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::DateTime(d) => Scalar::Str(d.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Str(s.clone()),
        Data::Error(e) => Scalar::Str(format!("{e:?}")),
        Data::Empty => Scalar::Null,
    };
    TreeValue::Scalar(scalar)
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &TreeValue) -> Result<(), FormatError> {
    match value {
        TreeValue::Scalar(Scalar::Null) => {}
        TreeValue::Scalar(Scalar::Bool(b)) => {
            sheet.write_boolean(row, col, *b).map_err(codec)?;
        }
        TreeValue::Scalar(Scalar::Int(i)) => {
            sheet.write_number(row, col, *i as f64).map_err(codec)?;
        }
        TreeValue::Scalar(Scalar::Float(f)) => {
            sheet.write_number(row, col, *f).map_err(codec)?;
        }
        TreeValue::Scalar(Scalar::Str(s)) => {
            sheet.write_string(row, col, s).map_err(codec)?;
        }
        other => {
            sheet.write_string(row, col, other.cell_text()).map_err(codec)?;
        }
    }
    Ok(())
}

impl Format for ExcelFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::Excel
    }

    fn is_binary(&self) -> bool {
        true
    }

    fn supports_lines(&self) -> bool {
        false
    }

    fn supports_object(&self) -> bool {
        false
    }

    fn decode(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<TreeValue, FormatError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(codec)?;
        let sheet = match &ctx.options.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| FormatError::Syntax("workbook has no sheets".into()))?,
        };
        let range = workbook.worksheet_range(&sheet).map_err(codec)?;

        // The range starts at the first used cell; rows above it still count
        // for `skiprows` and `header`.
        let leading = range.start().map_or(0, |(row, _)| row as usize);
        let rows = std::iter::repeat_n(vec![TreeValue::NULL; range.width()], leading)
            .chain(range.rows().map(|row| row.iter().map(cell_value).collect()))
            .collect();

        let (names, data) = select_rows(rows, ctx.options);
        Ok(TreeValue::Sequence(
            data.into_iter().map(|row| record_from(&names, row)).collect(),
        ))
    }

    fn encode(
        &self,
        value: &TreeValue,
        _mode: ProcessingMode,
        writer: &mut dyn Write,
    ) -> Result<(), FormatError> {
        let rows = encode_rows(value)?;
        let header = union_keys(&rows);

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.options.sheet_name).map_err(codec)?;

        for (col, name) in header.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| FormatError::Shape("too many columns for a worksheet".into()))?;
            sheet.write_string(0, col, name).map_err(codec)?;
        }
        for (r, record) in rows.iter().enumerate() {
            let row = u32::try_from(r + 1).map_err(|_| FormatError::Shape("too many rows for a worksheet".into()))?;
            for (col, name) in header.iter().enumerate() {
                if let Some(value) = record.get(name) {
                    write_cell(sheet, row, col as u16, value)?;
                }
            }
        }

        let buffer = workbook.save_to_buffer().map_err(codec)?;
        writer.write_all(&buffer)?;
        Ok(())
    }

    fn encode_lines(&self, _records: &[TreeValue], _writer: &mut dyn Write) -> Result<(), FormatError> {
        Err(FormatError::Shape(
            "Excel workbooks cannot be written line by line".into(),
        ))
    }
}
