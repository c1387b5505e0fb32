//! File-backed configuration bundle.

use std::path::Path;

use serde::Deserialize;

use super::{CsvOptions, ExcelOptions, HandlerConfig, LoadOptions, XmlOptions};
use crate::error::HandlerError;

/// Everything needed to build a handler and run a load, in one document.
///
/// ```json
/// {
///   "handler": { "mode": "multiline", "encoding": "utf-8-sig" },
///   "load": { "data_key": "items", "usecols": ["id", "name"] },
///   "csv": { "delimiter": ";", "quoting": "all" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub handler: HandlerConfig,
    pub load: LoadOptions,
    pub csv: CsvOptions,
    pub xml: XmlOptions,
    pub excel: ExcelOptions,
}

impl FormatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, HandlerError> {
        serde_json::from_str(text)
            .map_err(|e| HandlerError::config(format!("invalid JSON configuration: {e}")))
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(text: &str) -> Result<Self, HandlerError> {
        serde_yaml::from_str(text)
            .map_err(|e| HandlerError::config(format!("invalid YAML configuration: {e}")))
    }

    /// Read a configuration file, choosing the parser by extension.
    ///
    /// `.yaml`/`.yml` need the `yaml` feature; anything else is read as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, HandlerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| HandlerError::resource(path.to_string_lossy(), e))?;
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            #[cfg(not(feature = "yaml"))]
            Some("yaml" | "yml") => Err(HandlerError::config(
                "YAML configuration requires the 'yaml' feature",
            )),
            _ => Self::from_json_str(&text),
        }
    }
}
