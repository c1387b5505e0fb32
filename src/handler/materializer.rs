//! Drains the accumulator: pass records into the table, failed items into
//! the error sink.

use std::io::Write;

use tracing::{debug, warn};

use super::accumulator::Accumulator;
use crate::diagnostics::DiagnosticSink;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::io::OutputTarget;
use crate::table::Table;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    pub rows_added: usize,
    /// Failed items written to the error sink
    pub persisted: usize,
    /// Failed items still buffered because the sink could not be opened
    pub retained: usize,
}

pub(crate) struct Materializer<'a> {
    pub separator: &'a str,
    pub error_sink: &'a dyn OutputTarget,
    pub diagnostics: &'a dyn DiagnosticSink,
}

impl Materializer<'_> {
    /// Calling this again without new loads changes nothing.
    pub fn run(&self, accumulator: &mut Accumulator, table: &mut Table) -> MaterializeStats {
        let mut stats = MaterializeStats::default();

        let pending = accumulator.take_pending();
        stats.rows_added = pending.len();
        table.append_records(pending, self.separator);

        if accumulator.fail_len() > 0 {
            match self.persist(accumulator) {
                Some(persisted) => {
                    stats.persisted = persisted;
                    accumulator.clear_failed();
                }
                None => stats.retained = accumulator.fail_len(),
            }
        }

        if stats != MaterializeStats::default() {
            debug!(
                rows_added = stats.rows_added,
                persisted = stats.persisted,
                retained = stats.retained,
                "materialized"
            );
        }
        stats
    }

    /// Append every failed item to the sink, one line each.
    ///
    /// Returns `None` when the sink cannot be opened; the fail buffer is then
    /// left as it was.
    fn persist(&self, accumulator: &Accumulator) -> Option<usize> {
        let sink_id = self.error_sink.id();
        let mut writer = match self.error_sink.open_append() {
            Ok(writer) => writer,
            Err(e) => {
                self.report(sink_id, format!("cannot open error sink: {e}"));
                return None;
            }
        };

        let mut persisted = 0;
        for item in accumulator.failed() {
            let line = match item.payload.to_log_line() {
                Ok(line) => line,
                Err(e) => {
                    warn!(kind = %item.kind, error = %e, "skipping unserializable failed item");
                    self.report(sink_id, format!("cannot serialize {} item: {e}", item.kind));
                    continue;
                }
            };
            let written = writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.write_all(b"\n"));
            match written {
                Ok(()) => persisted += 1,
                Err(e) => self.report(sink_id, format!("cannot write {} item: {e}", item.kind)),
            }
        }
        if let Err(e) = writer.flush() {
            self.report(sink_id, format!("cannot flush error sink: {e}"));
        }
        Some(persisted)
    }

    fn report(&self, sink_id: &str, message: String) {
        self.diagnostics
            .report(&Diagnostic::new(DiagnosticKind::Sink, sink_id, message));
    }
}
