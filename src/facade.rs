//! Load and dump tables by file extension.
//!
//! The handler and processing mode are picked from the extension (or an
//! explicit [`FormatKind`]): `jsonl`/`ndjson` use Multiline mode, everything
//! else uses Array mode.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::info;

use crate::builder::HandlerBuilder;
use crate::config::{FileExistsPolicy, LoadOptions};
use crate::error::HandlerError;
use crate::format::{Format, FormatKind, JsonFormat};
use crate::handler::{DumpData, FileHandler};
use crate::io::{FileOutput, Input, Output, OutputTarget};
use crate::table::Table;

#[cfg(feature = "csv")]
use crate::config::CsvOptions;
#[cfg(feature = "csv")]
use crate::format::CsvFormat;
#[cfg(feature = "excel")]
use crate::format::ExcelFormat;
#[cfg(feature = "xml")]
use crate::format::XmlFormat;

/// Format for `path`, from `format` when given, else from the extension.
pub fn resolve_kind(path: &Path, format: Option<FormatKind>) -> Result<FormatKind, HandlerError> {
    let kind = match format {
        Some(kind) => kind,
        None => {
            let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
            FormatKind::from_extension(ext).ok_or_else(|| {
                HandlerError::UnsupportedFormat(format!(
                    "cannot infer a format from '{}'",
                    path.display()
                ))
            })?
        }
    };
    if !kind.is_available() {
        return Err(HandlerError::UnsupportedFormat(format!(
            "{kind} support is not enabled in this build"
        )));
    }
    Ok(kind)
}

/// Load a file into a table with default handler settings.
pub fn load_path(
    path: impl AsRef<Path>,
    format: Option<FormatKind>,
    options: &LoadOptions,
) -> Result<Table, HandlerError> {
    load_path_with(path, format, options, HandlerBuilder::default())
}

/// Like [`load_path`], with the error sink and diagnostics taken from
/// `builder`. The processing mode always follows the format.
pub fn load_path_with(
    path: impl AsRef<Path>,
    format: Option<FormatKind>,
    options: &LoadOptions,
    builder: HandlerBuilder,
) -> Result<Table, HandlerError> {
    let path = path.as_ref();
    let kind = resolve_kind(path, format)?;
    let builder = builder.with_mode(kind.default_mode());

    match kind {
        FormatKind::Json | FormatKind::JsonLines => load_with(builder.build(JsonFormat)?, path, options),
        #[cfg(feature = "csv")]
        FormatKind::Csv => load_with(builder.build(CsvFormat::new(CsvOptions::default())?)?, path, options),
        #[cfg(feature = "csv")]
        FormatKind::Tsv => load_with(builder.build(CsvFormat::new(CsvOptions::tsv())?)?, path, options),
        #[cfg(feature = "xml")]
        FormatKind::Xml => load_with(builder.build(XmlFormat::default())?, path, options),
        #[cfg(feature = "excel")]
        FormatKind::Excel => load_with(builder.build(ExcelFormat::default())?, path, options),
        #[allow(unreachable_patterns)]
        other => Err(HandlerError::UnsupportedFormat(other.to_string())),
    }
}

fn load_with<F: Format>(
    mut handler: FileHandler<F>,
    path: &Path,
    options: &LoadOptions,
) -> Result<Table, HandlerError> {
    let report = handler.load(Input::path(path), options)?;
    info!(
        source = %report.target,
        passed = report.passed,
        failed = report.failed,
        "loaded by extension"
    );
    Ok(handler.into_table())
}

/// Write `table` to `path` in the format picked by extension or `format`.
///
/// `FileExistsPolicy::Append` is only accepted for line formats and
/// delimited text; a CSV continuation skips the header and must match the
/// existing one.
pub fn dump_path(
    table: &Table,
    path: impl AsRef<Path>,
    format: Option<FormatKind>,
    policy: FileExistsPolicy,
) -> Result<(), HandlerError> {
    let path = path.as_ref();
    let kind = resolve_kind(path, format)?;
    if policy == FileExistsPolicy::Append && !kind.supports_append() {
        return Err(HandlerError::config(format!(
            "{kind} files cannot be appended to"
        )));
    }
    let builder = HandlerBuilder::new(kind.default_mode());

    match kind {
        FormatKind::Json | FormatKind::JsonLines => {
            dump_with(builder.build(JsonFormat)?, table, path, policy)
        }
        #[cfg(feature = "csv")]
        FormatKind::Csv | FormatKind::Tsv => {
            let options = if kind == FormatKind::Tsv {
                CsvOptions::tsv()
            } else {
                CsvOptions::default()
            };
            let options = match policy {
                FileExistsPolicy::Append => continue_csv(table, path, options)?,
                _ => options,
            };
            dump_with(builder.build_csv(options)?, table, path, policy)
        }
        #[cfg(feature = "xml")]
        FormatKind::Xml => dump_with(builder.build(XmlFormat::default())?, table, path, policy),
        #[cfg(feature = "excel")]
        FormatKind::Excel => dump_with(builder.build(ExcelFormat::default())?, table, path, policy),
        #[allow(unreachable_patterns)]
        other => Err(HandlerError::UnsupportedFormat(other.to_string())),
    }
}

/// Options for appending `table` below the content already at `path`.
#[cfg(feature = "csv")]
fn continue_csv(table: &Table, path: &Path, options: CsvOptions) -> Result<CsvOptions, HandlerError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(options),
        Err(e) => return Err(HandlerError::resource(path.to_string_lossy(), e)),
    };
    let header = CsvFormat::new(options.clone())?
        .read_header(file)
        .map_err(|source| HandlerError::Format {
            target: path.to_string_lossy().into_owned(),
            source,
        })?;
    let Some(header) = header else {
        return Ok(options);
    };
    if !table.is_empty() && header != table.column_names() {
        return Err(HandlerError::config(format!(
            "columns [{}] do not match the header [{}] of '{}'",
            table.column_names().join(", "),
            header.join(", "),
            path.display()
        )));
    }
    Ok(options.with_write_header(false))
}

/// True when `path` has content whose last byte is not a line break.
fn lacks_final_newline(path: &Path) -> io::Result<bool> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn dump_with<F: Format>(
    mut handler: FileHandler<F>,
    table: &Table,
    path: &Path,
    policy: FileExistsPolicy,
) -> Result<(), HandlerError> {
    let data = Some(DumpData::Table(table));
    match policy {
        FileExistsPolicy::Error if path.exists() => Err(HandlerError::resource(
            path.to_string_lossy(),
            io::Error::new(io::ErrorKind::AlreadyExists, "output file already exists"),
        )),
        FileExistsPolicy::Error | FileExistsPolicy::Overwrite => {
            handler.dump(Output::path(path), data)
        }
        FileExistsPolicy::Append => {
            let target = FileOutput::new(path);
            let separate =
                lacks_final_newline(path).map_err(|e| HandlerError::resource(target.id(), e))?;
            let mut writer = target
                .open_append()
                .map_err(|e| HandlerError::resource(target.id(), e))?;
            if separate {
                writer
                    .write_all(b"\n")
                    .map_err(|e| HandlerError::resource(target.id(), e))?;
            }
            handler.dump(Output::Binary(&mut writer), data)?;
            writer
                .flush()
                .map_err(|e| HandlerError::resource(target.id(), e))
        }
    }
}
