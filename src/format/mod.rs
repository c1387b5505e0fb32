//! Format adapters for decoding and encoding tree values.
//!
//! This module provides:
//! - `FormatKind`: Enum of the supported file formats
//! - `FormatError`: Errors raised by an adapter
//! - `Format`: the adapter trait every handler is generic over
//! - `JsonFormat`, `CsvFormat`, `XmlFormat`, `ExcelFormat` implementations

use std::io::Write;

use thiserror::Error;

use crate::config::{Encoding, LoadOptions, ProcessingMode};
use crate::error::FailedPayload;
use crate::tree::TreeValue;

mod json;
pub use json::JsonFormat;

#[cfg(feature = "csv")]
mod csv;
#[cfg(feature = "csv")]
pub use self::csv::CsvFormat;

#[cfg(feature = "xml")]
mod xml;
#[cfg(feature = "xml")]
pub use xml::XmlFormat;

#[cfg(feature = "excel")]
mod excel;
#[cfg(feature = "excel")]
pub use excel::ExcelFormat;

#[cfg(any(feature = "csv", feature = "excel"))]
mod tabular;

/// Represents different data format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Csv,
    /// CSV with a tab delimiter
    Tsv,
    Json,
    /// One JSON document per line
    JsonLines,
    Xml,
    Excel,
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatKind::Csv => write!(f, "csv"),
            FormatKind::Tsv => write!(f, "tsv"),
            FormatKind::Json => write!(f, "json"),
            FormatKind::JsonLines => write!(f, "jsonl"),
            FormatKind::Xml => write!(f, "xml"),
            FormatKind::Excel => write!(f, "excel"),
        }
    }
}

impl FormatKind {
    /// Parse a format kind from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(FormatKind::Csv),
            "tsv" => Some(FormatKind::Tsv),
            "json" => Some(FormatKind::Json),
            "jsonl" | "ndjson" | "jsonlines" => Some(FormatKind::JsonLines),
            "xml" => Some(FormatKind::Xml),
            "excel" | "xlsx" | "xls" => Some(FormatKind::Excel),
            _ => None,
        }
    }

    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        [
            FormatKind::Csv,
            FormatKind::Tsv,
            FormatKind::Json,
            FormatKind::JsonLines,
            FormatKind::Xml,
            FormatKind::Excel,
        ]
        .into_iter()
        .find(|kind| kind.extensions().contains(&ext.as_str()))
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FormatKind::Csv => &["csv"],
            FormatKind::Tsv => &["tsv"],
            FormatKind::Json => &["json"],
            FormatKind::JsonLines => &["jsonl", "ndjson"],
            FormatKind::Xml => &["xml"],
            FormatKind::Excel => &["xlsx", "xls", "ods"],
        }
    }

    /// Processing mode used when the format is picked by extension.
    pub fn default_mode(&self) -> ProcessingMode {
        match self {
            FormatKind::JsonLines => ProcessingMode::Multiline,
            _ => ProcessingMode::Array,
        }
    }

    /// Whether a second dump can continue an existing file of this format.
    ///
    /// Line formats and delimited text can; documents with a single root
    /// and workbooks cannot.
    pub fn supports_append(&self) -> bool {
        matches!(self, FormatKind::JsonLines | FormatKind::Csv | FormatKind::Tsv)
    }

    /// Check if this format is available (feature enabled).
    pub fn is_available(&self) -> bool {
        match self {
            FormatKind::Json | FormatKind::JsonLines => true,

            #[cfg(feature = "csv")]
            FormatKind::Csv | FormatKind::Tsv => true,
            #[cfg(not(feature = "csv"))]
            FormatKind::Csv | FormatKind::Tsv => false,

            #[cfg(feature = "xml")]
            FormatKind::Xml => true,
            #[cfg(not(feature = "xml"))]
            FormatKind::Xml => false,

            #[cfg(feature = "excel")]
            FormatKind::Excel => true,
            #[cfg(not(feature = "excel"))]
            FormatKind::Excel => false,
        }
    }
}

/// Errors that can occur during format operations.
#[derive(Debug, Error)]
pub enum FormatError {
    /// I/O error during format operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serde error: {0}")]
    Serde(Box<dyn std::error::Error + Send + Sync>),

    /// Malformed input for the format
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Data whose shape the format cannot represent
    #[error("Shape error: {0}")]
    Shape(String),

    /// Other format-specific error
    #[error("Format error: {0}")]
    Other(String),
}

/// Per-call inputs to [`Format::decode`].
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub mode: ProcessingMode,
    pub encoding: Encoding,
    pub options: &'a LoadOptions,
}

impl<'a> DecodeContext<'a> {
    pub fn new(mode: ProcessingMode, encoding: Encoding, options: &'a LoadOptions) -> Self {
        Self {
            mode,
            encoding,
            options,
        }
    }

    pub(crate) fn text<'b>(&self, bytes: &'b [u8]) -> Result<&'b str, FormatError> {
        self.encoding
            .decode(bytes)
            .map_err(|e| FormatError::Syntax(format!("invalid {}: {e}", self.encoding.label())))
    }
}

/// A line of multiline input that could not be decoded.
#[derive(Debug)]
pub struct RejectedLine {
    /// 1-based line number in the input
    pub line: usize,
    pub raw: FailedPayload,
    pub error: FormatError,
}

pub type LineOutcome = Result<TreeValue, RejectedLine>;

/// Split on `\n`, dropping a trailing `\r` and lines that are only whitespace.
pub(crate) fn split_lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    bytes
        .split(|b| *b == b'\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix(b"\r").unwrap_or(line)))
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
}

/// A file format adapter.
///
/// Adapters are stateless apart from their options; handler state lives in
/// `FileHandler`.
pub trait Format: std::fmt::Debug {
    fn kind(&self) -> FormatKind;

    /// Binary-only formats refuse text streams.
    fn is_binary(&self) -> bool {
        false
    }

    /// Whether the format can be processed in Multiline mode.
    fn supports_lines(&self) -> bool {
        true
    }

    /// Whether a whole document can decode to a single record.
    fn supports_object(&self) -> bool {
        true
    }

    /// Decode one whole document.
    fn decode(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<TreeValue, FormatError>;

    /// Decode every non-empty line as an independent unit.
    ///
    /// A line that fails to decode is returned as a [`RejectedLine`] and
    /// never stops the remaining lines.
    fn decode_lines(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Vec<LineOutcome> {
        split_lines(bytes)
            .map(|(line, raw)| match ctx.text(raw) {
                Ok(text) => self.decode(text.as_bytes(), ctx).map_err(|error| RejectedLine {
                    line,
                    raw: FailedPayload::Text(text.to_string()),
                    error,
                }),
                Err(error) => Err(RejectedLine {
                    line,
                    raw: FailedPayload::Raw(raw.to_vec()),
                    error,
                }),
            })
            .collect()
    }

    /// Encode a whole document shaped for `mode` (Array or Object).
    fn encode(
        &self,
        value: &TreeValue,
        mode: ProcessingMode,
        writer: &mut dyn Write,
    ) -> Result<(), FormatError>;

    /// Encode one record per line.
    fn encode_lines(&self, records: &[TreeValue], writer: &mut dyn Write) -> Result<(), FormatError>;
}
