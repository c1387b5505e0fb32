//! Per-format handlers: load, materialize and dump.
//!
//! A [`FileHandler`] owns an accumulator (pass and fail buffers), the table
//! built from it, and the error sink that receives rejected items. Loading
//! never fails because of bad records; only resource and configuration
//! problems surface as [`HandlerError`].

mod accumulator;
mod materializer;

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, info};

pub use accumulator::{Accumulator, Classification, Rejection};
pub use materializer::MaterializeStats;
use materializer::Materializer;

use crate::builder::HandlerBuilder;
use crate::config::{HandlerConfig, LoadOptions, ProcessingMode};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::error::{Diagnostic, DiagnosticKind, FailedItem, FailedPayload, HandlerError, LoadReport};
use crate::format::{DecodeContext, Format, FormatError, JsonFormat};
use crate::io::{
    FileOutput, Input, OpenMode, Output, OutputTarget, StreamMode, resolve_input, resolve_output,
};
use crate::table::Table;
use crate::tree::{Mapping, TreeValue};

#[cfg(feature = "csv")]
use crate::config::CsvOptions;
#[cfg(feature = "excel")]
use crate::config::ExcelOptions;
#[cfg(feature = "xml")]
use crate::config::XmlOptions;
#[cfg(feature = "csv")]
use crate::format::CsvFormat;
#[cfg(feature = "excel")]
use crate::format::ExcelFormat;
#[cfg(feature = "xml")]
use crate::format::XmlFormat;

/// Identifier used for `loads` input in diagnostics.
pub const MEMORY_ID: &str = "<memory>";

pub type JsonHandler = FileHandler<JsonFormat>;
#[cfg(feature = "csv")]
pub type CsvHandler = FileHandler<CsvFormat>;
#[cfg(feature = "xml")]
pub type XmlHandler = FileHandler<XmlFormat>;
#[cfg(feature = "excel")]
pub type ExcelHandler = FileHandler<ExcelFormat>;

/// Explicit data for `dump`/`dumps` instead of the handler's own table.
#[derive(Debug, Clone, Copy)]
pub enum DumpData<'a> {
    Table(&'a Table),
    Tree(&'a TreeValue),
}

/// Result of `dumps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dumped {
    Text(String),
    Binary(Vec<u8>),
}

impl Dumped {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Dumped::Text(text) => text.as_bytes(),
            Dumped::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Dumped::Text(text) => Some(text),
            Dumped::Binary(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Dumped::Text(text) => text.into_bytes(),
            Dumped::Binary(bytes) => bytes,
        }
    }
}

/// Shape a table the way `mode` expects for encoding.
///
/// Object mode writes the single row as a mapping; with more than one row the
/// table is written column-oriented.
pub fn table_to_tree(table: &Table, mode: ProcessingMode) -> TreeValue {
    match mode {
        ProcessingMode::Array | ProcessingMode::Multiline => TreeValue::Sequence(
            table.to_records().into_iter().map(TreeValue::Mapping).collect(),
        ),
        ProcessingMode::Object => match table.row_count() {
            0 => TreeValue::Mapping(Mapping::new()),
            1 => table
                .to_records()
                .pop()
                .map(TreeValue::Mapping)
                .unwrap_or_default(),
            _ => TreeValue::Mapping(table.to_column_mapping()),
        },
    }
}

#[derive(Debug)]
pub struct FileHandler<F: Format> {
    format: F,
    config: HandlerConfig,
    accumulator: Accumulator,
    table: Table,
    error_sink: Arc<dyn OutputTarget>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl FileHandler<JsonFormat> {
    pub fn new(mode: ProcessingMode) -> Self {
        Self::assemble(JsonFormat, HandlerConfig::new(mode), None, None)
    }
}

#[cfg(feature = "csv")]
impl FileHandler<CsvFormat> {
    /// Fails when a CSV option character is not ASCII.
    pub fn new(mode: ProcessingMode, options: CsvOptions) -> Result<Self, HandlerError> {
        let format = CsvFormat::new(options)?;
        Ok(Self::assemble(format, HandlerConfig::new(mode), None, None))
    }
}

#[cfg(feature = "xml")]
impl FileHandler<XmlFormat> {
    pub fn new(mode: ProcessingMode, options: XmlOptions) -> Self {
        Self::assemble(XmlFormat::new(options), HandlerConfig::new(mode), None, None)
    }
}

#[cfg(feature = "excel")]
impl FileHandler<ExcelFormat> {
    /// Workbooks are always processed in Array mode.
    pub fn new(options: ExcelOptions) -> Self {
        Self::assemble(
            ExcelFormat::new(options),
            HandlerConfig::new(ProcessingMode::Array),
            None,
            None,
        )
    }
}

impl<F: Format> FileHandler<F> {
    pub(crate) fn assemble(
        format: F,
        config: HandlerConfig,
        error_sink: Option<Arc<dyn OutputTarget>>,
        diagnostics: Option<Arc<dyn DiagnosticSink>>,
    ) -> Self {
        let error_sink =
            error_sink.unwrap_or_else(|| Arc::new(FileOutput::new(config.error_log.clone())));
        let diagnostics = diagnostics.unwrap_or_else(|| Arc::new(TracingDiagnostics));
        Self {
            format,
            config,
            accumulator: Accumulator::new(),
            table: Table::new(),
            error_sink,
            diagnostics,
        }
    }

    /// Build a handler for any format, validating the configuration.
    pub fn with_format(format: F, config: HandlerConfig) -> Result<Self, HandlerError> {
        HandlerBuilder::from_config(config).build(format)
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn mode(&self) -> ProcessingMode {
        self.config.mode
    }

    /// Records loaded but not yet materialized.
    pub fn pending(&self) -> &[TreeValue] {
        self.accumulator.pending()
    }

    /// Items not yet written to the error sink.
    pub fn failed(&self) -> &[FailedItem] {
        self.accumulator.failed()
    }

    /// The table as of the last materialization.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn error_sink(&self) -> &dyn OutputTarget {
        self.error_sink.as_ref()
    }

    /// Whether Multiline mode or the format forces binary streams.
    fn binary_streams(&self) -> bool {
        self.config.mode == ProcessingMode::Multiline || self.format.is_binary()
    }

    fn report(&self, report: &mut LoadReport, diagnostic: Diagnostic) {
        self.diagnostics.report(&diagnostic);
        report.diagnostics.push(diagnostic);
    }

    /// Read one source, decode it and classify every unit.
    ///
    /// Undecodable content and rejected units go to the fail buffer and are
    /// listed in the returned report; only resource and configuration errors
    /// return `Err`.
    pub fn load(&mut self, input: Input<'_>, options: &LoadOptions) -> Result<LoadReport, HandlerError> {
        self.load_labeled(input, options, None)
    }

    /// Like [`load`](Self::load) for in-memory content.
    pub fn loads(&mut self, data: impl AsRef<[u8]>, options: &LoadOptions) -> Result<LoadReport, HandlerError> {
        let mut bytes = data.as_ref();
        self.load_labeled(Input::Binary(&mut bytes), options, Some(MEMORY_ID))
    }

    fn load_labeled(
        &mut self,
        input: Input<'_>,
        options: &LoadOptions,
        label: Option<&str>,
    ) -> Result<LoadReport, HandlerError> {
        let resolved = resolve_input(input, OpenMode::for_read(self.binary_streams()))?;
        if self.format.is_binary() && resolved.mode == StreamMode::Text {
            return Err(HandlerError::config(format!(
                "{} input needs a binary stream",
                self.format.kind()
            )));
        }

        let id = label.map_or(resolved.id, str::to_string);
        let mut reader = resolved.reader;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| HandlerError::resource(&id, e))?;
        drop(reader);

        Ok(self.ingest(&id, &bytes, options))
    }

    fn ingest(&mut self, id: &str, bytes: &[u8], options: &LoadOptions) -> LoadReport {
        let mut report = LoadReport::new(id);
        let pass_start = self.accumulator.pass_len();
        let fail_start = self.accumulator.fail_len();
        let ctx = DecodeContext::new(self.config.mode, self.config.encoding, options);

        if self.config.mode == ProcessingMode::Multiline {
            for outcome in self.format.decode_lines(bytes, &ctx) {
                match outcome {
                    Ok(unit) => self.classify(unit, options, id, &mut report),
                    Err(rejected) => {
                        self.accumulator.reject(DiagnosticKind::Decode, rejected.raw);
                        let target = format!("{id}:{}", rejected.line);
                        let diagnostic =
                            Diagnostic::new(DiagnosticKind::Decode, target, rejected.error.to_string());
                        self.report(&mut report, diagnostic);
                    }
                }
            }
        } else {
            match self.format.decode(bytes, &ctx) {
                Ok(unit) => self.classify(unit, options, id, &mut report),
                Err(error) => {
                    self.accumulator
                        .reject(DiagnosticKind::Decode, FailedPayload::from_bytes(bytes));
                    let diagnostic = Diagnostic::new(DiagnosticKind::Decode, id, error.to_string());
                    self.report(&mut report, diagnostic);
                }
            }
        }

        if let Some(usecols) = &options.usecols {
            self.accumulator.project_since(pass_start, usecols);
        }

        report.passed = self.accumulator.pass_len() - pass_start;
        report.failed = self.accumulator.fail_len() - fail_start;
        info!(
            source = %id,
            format = %self.format.kind(),
            mode = %self.config.mode,
            passed = report.passed,
            failed = report.failed,
            "load finished"
        );
        report
    }

    fn classify(&mut self, unit: TreeValue, options: &LoadOptions, id: &str, report: &mut LoadReport) {
        let outcome = self
            .accumulator
            .classify(unit, self.config.mode, options.data_key());
        for rejection in outcome.rejections {
            self.report(report, Diagnostic::new(rejection.kind, id, rejection.message));
        }
    }

    /// Move pending records into the table and failed items to the error sink.
    pub fn materialize(&mut self) -> &Table {
        self.materialize_with_stats();
        &self.table
    }

    pub fn materialize_with_stats(&mut self) -> MaterializeStats {
        let materializer = Materializer {
            separator: &self.config.separator,
            error_sink: self.error_sink.as_ref(),
            diagnostics: self.diagnostics.as_ref(),
        };
        materializer.run(&mut self.accumulator, &mut self.table)
    }

    pub fn to_table(&mut self) -> &Table {
        self.materialize()
    }

    /// Materialize and hand the table over.
    pub fn into_table(mut self) -> Table {
        self.materialize_with_stats();
        self.table
    }

    /// Replace the table after materializing anything pending.
    pub fn set_table(&mut self, table: Table) {
        self.materialize_with_stats();
        self.table = table;
    }

    /// Read from the table by `column` or `column/row`.
    pub fn get(&mut self, path: &str) -> Option<TreeValue> {
        self.materialize().get(path)
    }

    /// Write into the table by `column` or `column/row`; returns cells changed.
    pub fn set(&mut self, path: &str, value: TreeValue) -> usize {
        self.materialize_with_stats();
        self.table.set(path, value)
    }

    /// Encode data (by default the materialized table) to `output`.
    ///
    /// Data the format cannot represent is routed to the fail buffer as an
    /// `Encode` item and returned as [`HandlerError::Format`]; nothing is
    /// written in that case.
    pub fn dump(&mut self, output: Output<'_>, data: Option<DumpData<'_>>) -> Result<(), HandlerError> {
        let tree = match data {
            Some(DumpData::Tree(tree)) => tree.clone(),
            Some(DumpData::Table(table)) => table_to_tree(table, self.config.mode),
            None => {
                self.materialize_with_stats();
                table_to_tree(&self.table, self.config.mode)
            }
        };

        let mut buffer = Vec::new();
        if let Err(source) = self.encode(&tree, &mut buffer) {
            let target = output_id(&output);
            self.diagnostics.report(&Diagnostic::new(
                DiagnosticKind::Encode,
                target.clone(),
                source.to_string(),
            ));
            self.accumulator
                .reject(DiagnosticKind::Encode, FailedPayload::Tree(tree));
            return Err(HandlerError::Format { target, source });
        }

        let binary = self.binary_streams();
        let mut resolved = resolve_output(output, OpenMode::for_write(binary))?;
        if self.format.is_binary() && resolved.mode == StreamMode::Text {
            return Err(HandlerError::config(format!(
                "{} output needs a binary stream",
                self.format.kind()
            )));
        }

        let id = resolved.id.clone();
        let bom = if resolved.mode == StreamMode::Text {
            self.config.encoding.bom()
        } else {
            b""
        };
        resolved
            .writer
            .write_all(bom)
            .and_then(|()| resolved.writer.write_all(&buffer))
            .and_then(|()| resolved.writer.flush())
            .map_err(|e| HandlerError::resource(&id, e))?;

        debug!(target_id = %id, bytes = buffer.len(), format = %self.format.kind(), "dump finished");
        Ok(())
    }

    /// Like [`dump`](Self::dump), returning the encoded content.
    pub fn dumps(&mut self, mode: StreamMode, data: Option<DumpData<'_>>) -> Result<Dumped, HandlerError> {
        let mut buffer: Vec<u8> = Vec::new();
        match mode {
            StreamMode::Text => {
                self.dump(Output::Text(&mut buffer), data)?;
                String::from_utf8(buffer)
                    .map(Dumped::Text)
                    .map_err(|e| HandlerError::config(format!("encoded output is not text: {e}")))
            }
            StreamMode::Binary => {
                self.dump(Output::Binary(&mut buffer), data)?;
                Ok(Dumped::Binary(buffer))
            }
        }
    }

    fn encode(&self, tree: &TreeValue, buffer: &mut Vec<u8>) -> Result<(), FormatError> {
        match self.config.mode {
            ProcessingMode::Multiline => match tree {
                TreeValue::Sequence(records) => self.format.encode_lines(records, buffer),
                record => self.format.encode_lines(std::slice::from_ref(record), buffer),
            },
            mode => self.format.encode(tree, mode, buffer),
        }
    }
}

fn output_id(output: &Output<'_>) -> String {
    match output {
        Output::Path(path) => path.to_string_lossy().into_owned(),
        Output::Target(target) => target.id().to_string(),
        Output::Text(_) => crate::io::TEXT_STREAM_ID.to_string(),
        Output::Binary(_) => crate::io::BINARY_STREAM_ID.to_string(),
    }
}
