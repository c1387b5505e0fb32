//! Error and diagnostic types for file-format handlers.
//!
//! This module provides:
//! - `HandlerError`: the error returned by handler operations
//! - `DiagnosticKind`: which step of the pipeline a record failed in
//! - `Diagnostic`: a single reported problem with context
//! - `FailedItem` / `FailedPayload`: entries of the fail buffer
//! - `LoadReport`: the per-call summary returned by `load`/`loads`

use std::fmt;
use std::io;

use thiserror::Error;

use crate::format::FormatError;
use crate::tree::TreeValue;

/// Errors returned by handler operations.
///
/// Per-record problems never surface here; they are reported as
/// [`Diagnostic`]s and kept in the fail buffer instead.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An input or output location could not be opened, read or written.
    #[error("cannot access '{target}': {source}")]
    Resource {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Invalid open mode, option value or handler setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization of outgoing data failed.
    #[error("cannot encode data for '{target}': {source}")]
    Format {
        target: String,
        #[source]
        source: FormatError,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

impl HandlerError {
    pub fn resource(target: impl Into<String>, source: io::Error) -> Self {
        HandlerError::Resource {
            target: target.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        HandlerError::Config(message.into())
    }

    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HandlerError::Resource { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Where in the pipeline a record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Opening or reading a location failed
    Resource,
    /// Raw content could not be decoded
    Decode,
    /// The configured data key was absent
    MissingKey,
    /// The unit had the wrong shape for the processing mode
    TypeMismatch,
    Encode,
    /// The error sink could not be opened or written
    Sink,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Resource => write!(f, "Resource"),
            DiagnosticKind::Decode => write!(f, "Decode"),
            DiagnosticKind::MissingKey => write!(f, "MissingKey"),
            DiagnosticKind::TypeMismatch => write!(f, "TypeMismatch"),
            DiagnosticKind::Encode => write!(f, "Encode"),
            DiagnosticKind::Sink => write!(f, "Sink"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Identifier of the source or sink (file path, `<memory>`, `path:line`)
    pub target: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.target, self.message)
    }
}

/// Content kept for a rejected record.
#[derive(Debug, Clone, PartialEq)]
pub enum FailedPayload {
    /// Bytes that were not valid text
    Raw(Vec<u8>),
    Text(String),
    Tree(TreeValue),
}

impl FailedPayload {
    /// Keep text when the bytes are UTF-8, raw bytes otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => FailedPayload::Text(text.to_string()),
            Err(_) => FailedPayload::Raw(bytes.to_vec()),
        }
    }

    /// The line written to the error sink for this payload.
    ///
    /// Content spanning several lines is written as a JSON string so that
    /// every failed item stays on exactly one line.
    pub fn to_log_line(&self) -> Result<String, serde_json::Error> {
        let text = match self {
            FailedPayload::Text(text) => text.clone(),
            FailedPayload::Tree(tree) => tree.to_canonical_text()?,
            FailedPayload::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        if text.contains(['\n', '\r']) {
            serde_json::to_string(&text)
        } else {
            Ok(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub kind: DiagnosticKind,
    pub payload: FailedPayload,
}

impl FailedItem {
    pub fn new(kind: DiagnosticKind, payload: FailedPayload) -> Self {
        Self { kind, payload }
    }
}

/// Outcome of a single `load`/`loads` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub target: String,
    /// Records appended to the pass buffer by this call
    pub passed: usize,
    /// Items appended to the fail buffer by this call
    pub failed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.diagnostics.is_empty()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} passed, {} failed",
            self.target, self.passed, self.failed
        )?;
        for (i, d) in self.diagnostics.iter().enumerate() {
            writeln!(f, "  #{}: {}", i + 1, d)?;
        }
        Ok(())
    }
}
