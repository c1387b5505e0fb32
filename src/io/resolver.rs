//! Turns a caller-supplied location or handle into an open stream.
//!
//! Streams opened here (paths and providers) are owned by the resolved value
//! and closed when it is dropped, on every exit path. Handles borrowed from
//! the caller are never closed.

use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;

use tracing::{debug, error};

use super::{FileInput, FileOutput, InputProvider, OutputTarget};
use crate::error::HandlerError;

/// Open mode accepted by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
    ReadBinary,
    WriteBinary,
    AppendBinary,
}

impl OpenMode {
    /// Parse one of `r`, `w`, `a`, `rb`, `wb`, `ab`.
    pub fn parse(mode: &str) -> Result<Self, HandlerError> {
        match mode {
            "r" => Ok(OpenMode::Read),
            "w" => Ok(OpenMode::Write),
            "a" => Ok(OpenMode::Append),
            "rb" => Ok(OpenMode::ReadBinary),
            "wb" => Ok(OpenMode::WriteBinary),
            "ab" => Ok(OpenMode::AppendBinary),
            other => Err(HandlerError::config(format!(
                "open mode '{other}' is not supported, expected one of r, w, a, rb, wb, ab"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::Write => "w",
            OpenMode::Append => "a",
            OpenMode::ReadBinary => "rb",
            OpenMode::WriteBinary => "wb",
            OpenMode::AppendBinary => "ab",
        }
    }

    pub fn for_read(binary: bool) -> Self {
        if binary {
            OpenMode::ReadBinary
        } else {
            OpenMode::Read
        }
    }

    pub fn for_write(binary: bool) -> Self {
        if binary {
            OpenMode::WriteBinary
        } else {
            OpenMode::Write
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadBinary)
    }

    pub fn is_append(&self) -> bool {
        matches!(self, OpenMode::Append | OpenMode::AppendBinary)
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            OpenMode::ReadBinary | OpenMode::WriteBinary | OpenMode::AppendBinary
        )
    }

    pub fn stream_mode(&self) -> StreamMode {
        if self.is_binary() {
            StreamMode::Binary
        } else {
            StreamMode::Text
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Text,
    Binary,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Text => write!(f, "text"),
            StreamMode::Binary => write!(f, "binary"),
        }
    }
}

/// Where `load` reads from.
pub enum Input<'a> {
    /// Opened by the handler and closed before `load` returns
    Path(PathBuf),
    /// Caller-owned stream of text
    Text(&'a mut dyn Read),
    /// Caller-owned stream of bytes
    Binary(&'a mut dyn Read),
    Provider(&'a dyn InputProvider),
}

impl Input<'_> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path(path.into())
    }
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Text(_) => f.write_str("Text(..)"),
            Input::Binary(_) => f.write_str("Binary(..)"),
            Input::Provider(p) => f.debug_tuple("Provider").field(&p.id()).finish(),
        }
    }
}

/// Where `dump` writes to.
pub enum Output<'a> {
    /// Created or truncated by the handler and closed before `dump` returns
    Path(PathBuf),
    Text(&'a mut dyn Write),
    Binary(&'a mut dyn Write),
    /// Opened with `open_overwrite`
    Target(&'a dyn OutputTarget),
}

impl Output<'_> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Output::Path(path.into())
    }
}

impl fmt::Debug for Output<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Output::Text(_) => f.write_str("Text(..)"),
            Output::Binary(_) => f.write_str("Binary(..)"),
            Output::Target(t) => f.debug_tuple("Target").field(&t.id()).finish(),
        }
    }
}

pub const TEXT_STREAM_ID: &str = "<text stream>";
pub const BINARY_STREAM_ID: &str = "<binary stream>";

pub struct ResolvedInput<'a> {
    pub id: String,
    pub reader: Box<dyn Read + 'a>,
    pub mode: StreamMode,
    /// True when the resolver opened the stream itself
    pub opened: bool,
}

impl fmt::Debug for ResolvedInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedInput")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("opened", &self.opened)
            .finish()
    }
}

pub struct ResolvedOutput<'a> {
    pub id: String,
    pub writer: Box<dyn Write + 'a>,
    pub mode: StreamMode,
    pub opened: bool,
}

impl fmt::Debug for ResolvedOutput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOutput")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("opened", &self.opened)
            .finish()
    }
}

pub fn resolve_input(input: Input<'_>, open_mode: OpenMode) -> Result<ResolvedInput<'_>, HandlerError> {
    if !open_mode.is_read() {
        return Err(HandlerError::config(format!(
            "input cannot be opened with mode '{open_mode}'"
        )));
    }

    let resolved = match input {
        Input::Path(path) => {
            let provider = FileInput::new(path);
            let reader = provider.open().map_err(|e| {
                error!(location = %provider.id(), error = %e, "failed to open input");
                HandlerError::resource(provider.id(), e)
            })?;
            ResolvedInput {
                id: provider.id().to_string(),
                reader,
                mode: open_mode.stream_mode(),
                opened: true,
            }
        }
        Input::Provider(provider) => {
            let reader = provider
                .open()
                .map_err(|e| HandlerError::resource(provider.id(), e))?;
            ResolvedInput {
                id: provider.id().to_string(),
                reader,
                mode: open_mode.stream_mode(),
                opened: true,
            }
        }
        Input::Text(reader) => ResolvedInput {
            id: TEXT_STREAM_ID.to_string(),
            reader: Box::new(reader),
            mode: StreamMode::Text,
            opened: false,
        },
        Input::Binary(reader) => ResolvedInput {
            id: BINARY_STREAM_ID.to_string(),
            reader: Box::new(reader),
            mode: StreamMode::Binary,
            opened: false,
        },
    };

    debug!(
        location = %resolved.id,
        mode = %resolved.mode,
        opened = resolved.opened,
        "input resolved"
    );
    Ok(resolved)
}

pub fn resolve_output(output: Output<'_>, open_mode: OpenMode) -> Result<ResolvedOutput<'_>, HandlerError> {
    if open_mode.is_read() {
        return Err(HandlerError::config(format!(
            "output cannot be opened with mode '{open_mode}'"
        )));
    }

    let resolved = match output {
        Output::Path(path) => {
            let target = FileOutput::new(path);
            let opened = if open_mode.is_append() {
                target.open_append()
            } else {
                target.open_overwrite()
            };
            let writer = opened.map_err(|e| {
                error!(location = %target.id(), error = %e, "failed to open output");
                HandlerError::resource(target.id(), e)
            })?;
            ResolvedOutput {
                id: target.id().to_string(),
                writer,
                mode: open_mode.stream_mode(),
                opened: true,
            }
        }
        Output::Target(target) => {
            let opened = if open_mode.is_append() {
                target.open_append()
            } else {
                target.open_overwrite()
            };
            let writer = opened.map_err(|e| HandlerError::resource(target.id(), e))?;
            ResolvedOutput {
                id: target.id().to_string(),
                writer,
                mode: open_mode.stream_mode(),
                opened: true,
            }
        }
        Output::Text(writer) => ResolvedOutput {
            id: TEXT_STREAM_ID.to_string(),
            writer: Box::new(writer),
            mode: StreamMode::Text,
            opened: false,
        },
        Output::Binary(writer) => ResolvedOutput {
            id: BINARY_STREAM_ID.to_string(),
            writer: Box::new(writer),
            mode: StreamMode::Binary,
            opened: false,
        },
    };

    debug!(
        location = %resolved.id,
        mode = %resolved.mode,
        opened = resolved.opened,
        "output resolved"
    );
    Ok(resolved)
}
