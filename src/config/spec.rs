//! Handler and load specifications.

use serde::Deserialize;

/// Shape of a single decoded unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// One document that is (or contains) a list of records
    #[default]
    Array,
    /// Every non-empty line is an independent record
    Multiline,
    /// One document that is a single record
    Object,
}

impl ProcessingMode {
    /// Parse a mode from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "array" => Some(ProcessingMode::Array),
            "multiline" | "lines" => Some(ProcessingMode::Multiline),
            "object" => Some(ProcessingMode::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Array => "array",
            ProcessingMode::Multiline => "multiline",
            ProcessingMode::Object => "object",
        }
    }
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text encoding of textual inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Encoding {
    #[default]
    Utf8,
    /// UTF-8 with a leading byte-order mark on written text
    Utf8Sig,
}

impl Encoding {
    /// Parse an encoding label such as `utf-8` or `utf-8-sig`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Some(Encoding::Utf8Sig),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Sig => "utf-8-sig",
        }
    }

    /// Decode bytes to text. A leading byte-order mark is dropped.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<&'a str, std::str::Utf8Error> {
        std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes))
    }

    /// Prefix written before text-mode output.
    pub fn bom(&self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => b"",
            Encoding::Utf8Sig => UTF8_BOM,
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Encoding::from_label(&label).ok_or_else(|| format!("unsupported encoding '{label}'"))
    }
}

/// Per-handler settings fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub mode: ProcessingMode,
    pub encoding: Encoding,
    /// Location of the error sink that receives failed items
    pub error_log: String,
    /// Joins nested keys when records are flattened into columns
    pub separator: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::default(),
            encoding: Encoding::default(),
            error_log: "error.log".to_string(),
            separator: ".".to_string(),
        }
    }
}

impl HandlerConfig {
    pub fn new(mode: ProcessingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_error_log(mut self, error_log: impl Into<String>) -> Self {
        self.error_log = error_log.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

/// Column projection applied to loaded records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UseCols {
    /// Keep keys at these positions of each record
    Indices(Vec<usize>),
    Names(Vec<String>),
}

impl UseCols {
    pub fn keeps(&self, index: usize, key: &str) -> bool {
        match self {
            UseCols::Indices(indices) => indices.contains(&index),
            UseCols::Names(names) => names.iter().any(|n| n == key),
        }
    }
}

fn default_header() -> Option<usize> {
    Some(0)
}

/// Options for a single `load`/`loads` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// `/`-separated path to the data inside each unit
    pub data_key: Option<String>,
    pub usecols: Option<UseCols>,
    /// Row holding the column names in tabular inputs; `None` means no header
    #[serde(default = "default_header")]
    pub header: Option<usize>,
    /// Leading rows or lines skipped before the header
    pub skiprows: usize,
    /// Maximum number of data rows read
    pub nrows: Option<usize>,
    /// Worksheet read by the Excel adapter; the first sheet when unset
    pub sheet: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            data_key: None,
            usecols: None,
            header: default_header(),
            skiprows: 0,
            nrows: None,
            sheet: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured data key, ignoring an empty string.
    pub fn data_key(&self) -> Option<&str> {
        self.data_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn with_data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }

    pub fn with_usecols(mut self, usecols: UseCols) -> Self {
        self.usecols = Some(usecols);
        self
    }

    pub fn with_header(mut self, header: Option<usize>) -> Self {
        self.header = header;
        self
    }

    pub fn with_skiprows(mut self, skiprows: usize) -> Self {
        self.skiprows = skiprows;
        self
    }

    pub fn with_nrows(mut self, nrows: usize) -> Self {
        self.nrows = Some(nrows);
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// Policy for handling existing output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileExistsPolicy {
    /// Overwrite existing files
    Overwrite,
    /// Append to existing files
    Append,
    #[default]
    /// Return an error if file exists
    Error,
}

impl FileExistsPolicy {
    /// Parse a policy from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Some(FileExistsPolicy::Overwrite),
            "append" => Some(FileExistsPolicy::Append),
            "error" => Some(FileExistsPolicy::Error),
            _ => None,
        }
    }
}
