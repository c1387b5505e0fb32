//! Pluggable receivers for per-record diagnostics.
//!
//! Handlers forward every [`Diagnostic`] they produce to an injected
//! [`DiagnosticSink`]. The default sink emits `tracing` events; tests use
//! [`CollectingDiagnostics`] to inspect what was reported.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, warn};

use crate::error::{Diagnostic, DiagnosticKind};

/// Receiver for diagnostics produced by load, materialize and dump.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Emits each diagnostic as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::Sink | DiagnosticKind::Resource => error!(
                kind = %diagnostic.kind,
                location = %diagnostic.target,
                "{}",
                diagnostic.message
            ),
            _ => warn!(
                kind = %diagnostic.kind,
                location = %diagnostic.target,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}

/// Forwards each diagnostic to several sinks.
#[derive(Default)]
pub struct CompositeDiagnostics {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl CompositeDiagnostics {
    pub fn new(sinks: Vec<Arc<dyn DiagnosticSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sinks.push(sink);
    }
}

impl fmt::Debug for CompositeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDiagnostics")
            .field("sinks_len", &self.sinks.len())
            .finish()
    }
}

impl DiagnosticSink for CompositeDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        for sink in &self.sinks {
            sink.report(diagnostic);
        }
    }
}
