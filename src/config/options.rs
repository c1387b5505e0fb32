//! Format-specific options.

use serde::Deserialize;

use crate::error::HandlerError;

/// Which CSV fields get quoted on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotePolicy {
    /// Only fields that need it
    #[default]
    Minimal,
    All,
    NonNumeric,
    None,
}

impl QuotePolicy {
    /// Map the classic numeric quoting codes (0 through 3).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(QuotePolicy::Minimal),
            1 => Some(QuotePolicy::All),
            2 => Some(QuotePolicy::NonNumeric),
            3 => Some(QuotePolicy::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: char,
    pub quote: char,
    pub escape: Option<char>,
    pub quoting: QuotePolicy,
    /// Type numeric and boolean cells instead of keeping every cell as text
    pub infer_types: bool,
    /// Write the header row on dump; off when continuing an existing file
    pub write_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            escape: Some('\\'),
            quoting: QuotePolicy::Minimal,
            infer_types: true,
            write_header: true,
        }
    }
}

fn ascii_byte(what: &str, c: char) -> Result<u8, HandlerError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(HandlerError::config(format!(
            "CSV {what} must be a single ASCII character, got '{c}'"
        )))
    }
}

impl CsvOptions {
    /// Tab-separated values.
    pub fn tsv() -> Self {
        Self {
            delimiter: '\t',
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_quoting(mut self, quoting: QuotePolicy) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_infer_types(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    pub fn with_write_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    pub(crate) fn delimiter_byte(&self) -> Result<u8, HandlerError> {
        ascii_byte("delimiter", self.delimiter)
    }

    pub(crate) fn quote_byte(&self) -> Result<u8, HandlerError> {
        ascii_byte("quote character", self.quote)
    }

    pub(crate) fn escape_byte(&self) -> Result<Option<u8>, HandlerError> {
        self.escape.map(|c| ascii_byte("escape character", c)).transpose()
    }
}

/// Element names used when writing XML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    pub root_tag: String,
    pub row_tag: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root_tag: "root".to_string(),
            row_tag: "row".to_string(),
        }
    }
}

impl XmlOptions {
    pub fn with_root_tag(mut self, tag: impl Into<String>) -> Self {
        self.root_tag = tag.into();
        self
    }

    pub fn with_row_tag(mut self, tag: impl Into<String>) -> Self {
        self.row_tag = tag.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExcelOptions {
    /// Name of the worksheet written by `dump`
    pub sheet_name: String,
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
        }
    }
}
