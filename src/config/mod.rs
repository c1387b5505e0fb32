//! Configuration types for handlers and loads.
//!
//! This module provides:
//! - `ProcessingMode` / `Encoding`: how units are shaped and decoded
//! - `HandlerConfig`: per-handler settings fixed at construction
//! - `LoadOptions`: per-call options for `load`/`loads`
//! - `CsvOptions`, `XmlOptions`, `ExcelOptions`: format-specific options
//! - `FormatConfig`: all of the above, loadable from a JSON or YAML file
//! - `FileExistsPolicy`: Policy for handling existing output files

mod format_config;
mod options;
mod spec;

pub use format_config::FormatConfig;
pub use options::{CsvOptions, ExcelOptions, QuotePolicy, XmlOptions};
pub use spec::{Encoding, FileExistsPolicy, HandlerConfig, LoadOptions, ProcessingMode, UseCols};
