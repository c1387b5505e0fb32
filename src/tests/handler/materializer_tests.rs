//! Materialization: pass buffer into the table, fail buffer into the sink.

use std::io::{self, Write};
use std::sync::Arc;

use crate::builder::HandlerBuilder;
use crate::config::{LoadOptions, ProcessingMode};
use crate::diagnostics::CollectingDiagnostics;
use crate::error::DiagnosticKind;
use crate::format::JsonFormat;
use crate::handler::MaterializeStats;
use crate::io::OutputTarget;
use crate::tests::support::{fixture, parse};

/// Sink that can never be opened.
#[derive(Debug)]
struct BrokenSink;

impl OutputTarget for BrokenSink {
    fn id(&self) -> &str {
        "broken"
    }

    fn open_overwrite(&self) -> io::Result<Box<dyn Write + Send>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn open_append(&self) -> io::Result<Box<dyn Write + Send>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

#[test]
fn materialize_moves_pass_records_and_persists_failures() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Multiline);
    fx.handler
        .loads("{\"a\":1}\n{\"bad json\n{\"a\":3}", &LoadOptions::default())
        .unwrap();

    let stats = fx.handler.materialize_with_stats();
    assert_eq!(
        stats,
        MaterializeStats {
            rows_added: 2,
            persisted: 1,
            retained: 0
        }
    );
    assert_eq!(fx.handler.table().column_i64("a"), Some(vec![Some(1), Some(3)]));
    assert_eq!(fx.errors.lines(), vec!["{\"bad json"]);
    assert!(fx.handler.pending().is_empty());
    assert!(fx.handler.failed().is_empty());
}

#[test]
fn second_materialize_without_loads_is_a_no_op() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Array);
    fx.handler.loads(r#"[{"a":1}]"#, &LoadOptions::default()).unwrap();
    fx.handler.materialize();
    let before = fx.handler.table().clone();

    let stats = fx.handler.materialize_with_stats();
    assert_eq!(stats, MaterializeStats::default());
    assert_eq!(fx.handler.table(), &before);
}

#[test]
fn materialize_on_empty_buffers_writes_nothing() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Array);
    assert!(fx.handler.materialize().is_empty());
    assert!(fx.errors.contents().is_empty());
}

#[test]
fn tables_accumulate_across_materializations() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Array);
    fx.handler.loads(r#"[{"a":1}]"#, &LoadOptions::default()).unwrap();
    fx.handler.materialize();
    fx.handler.loads(r#"[{"a":2,"b":"x"}]"#, &LoadOptions::default()).unwrap();
    let table = fx.handler.materialize();

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_names(), vec!["a", "b"]);
}

#[test]
fn failed_trees_are_persisted_as_compact_json() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Object);
    fx.handler.loads("[1, 2]", &LoadOptions::default()).unwrap();
    fx.handler.materialize();
    assert_eq!(fx.errors.lines(), vec!["[1,2]"]);
}

#[test]
fn malformed_multi_line_document_is_one_log_entry() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Array);
    let report = fx
        .handler
        .loads("[\n {\"a\":1},\n {\"a\":\n", &LoadOptions::default())
        .unwrap();
    assert_eq!(report.failed, 1);

    let stats = fx.handler.materialize_with_stats();
    assert_eq!(stats.persisted, 1);
    let lines = fx.errors.lines();
    assert_eq!(lines.len(), 1);
    let restored: String = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(restored, "[\n {\"a\":1},\n {\"a\":\n");
}

#[test]
fn sink_errors_accumulate_across_materializations() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Multiline);
    fx.handler.loads("{bad\n", &LoadOptions::default()).unwrap();
    fx.handler.materialize();
    fx.handler.loads("{worse\n", &LoadOptions::default()).unwrap();
    fx.handler.materialize();
    assert_eq!(fx.errors.lines(), vec!["{bad", "{worse"]);
}

#[test]
fn unopenable_sink_keeps_failures_buffered() {
    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let mut handler = HandlerBuilder::new(ProcessingMode::Multiline)
        .with_error_sink(Arc::new(BrokenSink))
        .with_diagnostics(diagnostics.clone())
        .build(JsonFormat)
        .unwrap();
    handler
        .loads("{\"a\":1}\nnot json\n", &LoadOptions::default())
        .unwrap();

    let stats = handler.materialize_with_stats();
    assert_eq!(stats.rows_added, 1);
    assert_eq!(stats.retained, 1);
    assert_eq!(handler.failed().len(), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::Sink), 1);
    assert_eq!(handler.table().row_count(), 1);
}

#[test]
fn into_table_materializes_pending_records() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Array);
    fx.handler
        .loads(r#"[{"a":{"b":1}}]"#, &LoadOptions::default())
        .unwrap();
    let table = fx.handler.into_table();
    assert_eq!(table.get("a.b/0"), Some(parse("1")));
}
