//! Input provider trait definition.

use std::fmt::Debug;
use std::io::Read;

/// A source that can be opened for reading any number of times.
///
/// Handlers accept a provider through `Input::Provider`; every `load` call
/// opens a fresh stream and drops it before returning.
pub trait InputProvider: Send + Sync + Debug {
    /// Identifier used in diagnostics and logs (usually the file path).
    fn id(&self) -> &str;

    /// Each call returns a fresh stream positioned at the beginning.
    fn open(&self) -> std::io::Result<Box<dyn Read + Send>>;
}
