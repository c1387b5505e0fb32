//! Builder for creating FileHandler instances.

use std::sync::Arc;

use tracing::debug;

use crate::config::{Encoding, FormatConfig, HandlerConfig, ProcessingMode};
use crate::diagnostics::DiagnosticSink;
use crate::error::HandlerError;
use crate::format::{Format, JsonFormat};
use crate::handler::{FileHandler, JsonHandler};
use crate::io::OutputTarget;

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
#[cfg(feature = "csv")]
use crate::handler::CsvHandler;
#[cfg(feature = "excel")]
use crate::handler::ExcelHandler;
#[cfg(feature = "xml")]
use crate::handler::XmlHandler;

#[derive(Debug, Clone, Default)]
pub struct HandlerBuilder {
    config: HandlerConfig,
    error_sink: Option<Arc<dyn OutputTarget>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl HandlerBuilder {
    pub fn new(mode: ProcessingMode) -> Self {
        Self::from_config(HandlerConfig::new(mode))
    }

    pub fn from_config(config: HandlerConfig) -> Self {
        Self {
            config,
            error_sink: None,
            diagnostics: None,
        }
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Parse an encoding label such as `utf-8-sig`.
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self, HandlerError> {
        self.config.encoding = Encoding::from_label(label)
            .ok_or_else(|| HandlerError::config(format!("unsupported encoding '{label}'")))?;
        Ok(self)
    }

    /// Path of the default file error sink.
    pub fn with_error_log(mut self, path: impl Into<String>) -> Self {
        self.config.error_log = path.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    /// Use `sink` instead of a file at `error_log`.
    pub fn with_error_sink(mut self, sink: Arc<dyn OutputTarget>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn build<F: Format>(self, format: F) -> Result<FileHandler<F>, HandlerError> {
        if self.config.mode == ProcessingMode::Multiline && !format.supports_lines() {
            return Err(HandlerError::config(format!(
                "{} does not support multiline mode",
                format.kind()
            )));
        }
        if self.config.mode == ProcessingMode::Object && !format.supports_object() {
            return Err(HandlerError::config(format!(
                "{} does not support object mode",
                format.kind()
            )));
        }
        if self.config.separator.is_empty() {
            return Err(HandlerError::config("column separator must not be empty"));
        }
        if self.error_sink.is_none() && self.config.error_log.trim().is_empty() {
            return Err(HandlerError::config("error log path must not be empty"));
        }

        debug!(
            format = %format.kind(),
            mode = %self.config.mode,
            encoding = self.config.encoding.label(),
            "handler built"
        );
        Ok(FileHandler::assemble(
            format,
            self.config,
            self.error_sink,
            self.diagnostics,
        ))
    }

    pub fn build_json(self) -> Result<JsonHandler, HandlerError> {
        self.build(JsonFormat)
    }

    #[cfg(feature = "csv")]
    pub fn build_csv(self, options: CsvOptions) -> Result<CsvHandler, HandlerError> {
        let format = CsvFormat::new(options)?;
        self.build(format)
    }

    #[cfg(feature = "xml")]
    pub fn build_xml(self, options: XmlOptions) -> Result<XmlHandler, HandlerError> {
        self.build(XmlFormat::new(options))
    }

    #[cfg(feature = "excel")]
    pub fn build_excel(self, options: ExcelOptions) -> Result<ExcelHandler, HandlerError> {
        self.build(ExcelFormat::new(options))
    }
}

impl From<&FormatConfig> for HandlerBuilder {
    fn from(config: &FormatConfig) -> Self {
        HandlerBuilder::from_config(config.handler.clone())
    }
}
