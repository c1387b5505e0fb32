//! Output target trait definition.

use std::fmt::Debug;
use std::io::Write;

/// A destination that can be opened for writing any number of times.
///
/// The error sink of every handler is an `OutputTarget` opened with
/// [`open_append`](OutputTarget::open_append) on each materialization.
pub trait OutputTarget: Send + Sync + Debug {
    /// Identifier used in diagnostics and logs (usually the file path).
    fn id(&self) -> &str;

    /// Open the target for writing, truncating any existing content.
    fn open_overwrite(&self) -> std::io::Result<Box<dyn Write + Send>>;

    /// Open the target for appending to existing content.
    fn open_append(&self) -> std::io::Result<Box<dyn Write + Send>>;
}
