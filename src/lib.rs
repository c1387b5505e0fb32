//! # fileformat
//!
//! File-format handlers that load CSV, JSON, XML and Excel content into a
//! uniform [`Table`], keeping every record that does not fit aside instead
//! of failing the whole load.
//!
//! ## Overview
//!
//! fileformat provides:
//! - **Per-format handlers**: [`FileHandler`] generic over a [`Format`] adapter
//! - **Processing modes**: whole-document lists (`Array`), one record per line
//!   (`Multiline`) and single-record documents (`Object`)
//! - **Accumulation**: any number of `load` calls feed a pass buffer and a fail
//!   buffer; `materialize` flattens the pass buffer into the table and appends
//!   the fail buffer to an error sink
//! - **Diagnostics**: every rejected record is reported through an injected
//!   [`DiagnosticSink`] and returned in a [`LoadReport`]
//! - **Extension facade**: [`facade::load_path`] / [`facade::dump_path`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fileformat::{JsonHandler, LoadOptions, ProcessingMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut handler = JsonHandler::new(ProcessingMode::Multiline);
//!     let report = handler.loads("{\"a\":1}\n{\"bad json\n{\"a\":3}\n", &LoadOptions::default())?;
//!     assert_eq!(report.failed, 1);
//!
//!     let table = handler.materialize();
//!     assert_eq!(table.column_i64("a"), Some(vec![Some(1), Some(3)]));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `csv` - CSV/TSV handler (enabled by default)
//! - `xml` - XML handler (enabled by default)
//! - `excel` - Excel handler (calamine + rust_xlsxwriter)
//! - `yaml` - YAML configuration files
//! - `cli` - the `fileformat_convert` binary

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod format;
pub mod handler;
pub mod io;
pub mod table;
pub mod tree;

pub use builder::HandlerBuilder;
pub use config::{
    CsvOptions, Encoding, ExcelOptions, FileExistsPolicy, FormatConfig, HandlerConfig,
    LoadOptions, ProcessingMode, QuotePolicy, UseCols, XmlOptions,
};
pub use diagnostics::{
    CollectingDiagnostics, CompositeDiagnostics, DiagnosticSink, TracingDiagnostics,
};
pub use error::{
    Diagnostic, DiagnosticKind, FailedItem, FailedPayload, HandlerError, HandlerResult,
    LoadReport,
};
pub use format::{Format, FormatError, FormatKind, JsonFormat};
pub use handler::{DumpData, Dumped, FileHandler, JsonHandler, MaterializeStats};
pub use io::{
    FileInput, FileOutput, InMemorySink, InMemorySource, Input, InputProvider, OpenMode,
    Output, OutputTarget, StreamMode,
};
pub use table::{Column, ColumnType, Table};
pub use tree::{Mapping, Scalar, TreeValue};

#[cfg(feature = "csv")]
pub use format::CsvFormat;
#[cfg(feature = "csv")]
pub use handler::CsvHandler;
#[cfg(feature = "excel")]
pub use format::ExcelFormat;
#[cfg(feature = "excel")]
pub use handler::ExcelHandler;
#[cfg(feature = "xml")]
pub use format::XmlFormat;
#[cfg(feature = "xml")]
pub use handler::XmlHandler;
