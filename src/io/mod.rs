//! I/O abstractions for input providers and output targets.
//!
//! This module provides:
//! - `InputProvider`: Trait for input sources
//! - `OutputTarget`: Trait for output destinations (including the error sink)
//! - File and in-memory implementations
//! - The resolver that turns `Input`/`Output` into open streams

mod input;
mod memory;
mod output;
mod resolver;
mod std_io;

pub use input::InputProvider;
pub use memory::{InMemorySink, InMemorySource};
pub use output::OutputTarget;
pub use resolver::{
    BINARY_STREAM_ID, Input, OpenMode, Output, ResolvedInput, ResolvedOutput, StreamMode,
    TEXT_STREAM_ID, resolve_input, resolve_output,
};
pub use std_io::{FileInput, FileOutput};
