//! `dump`/`dumps` shapes and failure routing.

use crate::builder::HandlerBuilder;
use crate::config::{Encoding, LoadOptions, ProcessingMode};
use crate::format::JsonFormat;
use crate::handler::{DumpData, Dumped, table_to_tree};
use crate::io::{InMemorySink, Output, StreamMode};
use crate::table::Table;
use crate::tests::support::{fixture, parse};

fn table(records: &str) -> Table {
    match parse(records) {
        crate::tree::TreeValue::Sequence(items) => Table::from_records(items, "."),
        other => Table::from_records([other], "."),
    }
}

#[test]
fn array_dump_writes_a_list_of_flat_rows() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Array);
    fx.handler
        .loads(r#"[{"a":1,"b":{"c":"x"}}]"#, &LoadOptions::default())
        .unwrap();
    let dumped = fx.handler.dumps(StreamMode::Text, None).unwrap();

    let text = dumped.as_text().expect("text output");
    assert_eq!(parse(text), parse(r#"[{"a":1,"b.c":"x"}]"#));
    assert!(text.ends_with('\n'));
}

#[test]
fn multiline_dump_writes_one_compact_record_per_line() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Multiline);
    fx.handler.loads("{\"a\":1}\n{\"a\":2}\n", &LoadOptions::default()).unwrap();
    let dumped = fx.handler.dumps(StreamMode::Binary, None).unwrap();
    assert_eq!(dumped, Dumped::Binary(b"{\"a\":1}\n{\"a\":2}\n".to_vec()));
}

#[test]
fn object_dump_shapes() {
    assert_eq!(
        table_to_tree(&Table::new(), ProcessingMode::Object),
        parse("{}")
    );
    assert_eq!(
        table_to_tree(&table(r#"{"a":1}"#), ProcessingMode::Object),
        parse(r#"{"a":1}"#)
    );
    assert_eq!(
        table_to_tree(&table(r#"[{"a":1},{"a":2}]"#), ProcessingMode::Object),
        parse(r#"{"a":[1,2]}"#)
    );
}

#[test]
fn explicit_tree_data_is_encoded_as_given() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Object);
    let data = parse(r#"{"k":[1,2]}"#);
    let dumped = fx
        .handler
        .dumps(StreamMode::Text, Some(DumpData::Tree(&data)))
        .unwrap();
    assert_eq!(parse(dumped.as_text().unwrap()), data);
}

#[test]
fn round_trip_preserves_flat_tables() {
    let mut first = fixture(JsonFormat, ProcessingMode::Array);
    first
        .handler
        .loads(r#"[{"a":1,"b":"x"},{"a":2,"b":null,"c":1.5}]"#, &LoadOptions::default())
        .unwrap();
    let dumped = first.handler.dumps(StreamMode::Binary, None).unwrap();

    let mut second = fixture(JsonFormat, ProcessingMode::Array);
    second.handler.loads(dumped.as_bytes(), &LoadOptions::default()).unwrap();
    assert_eq!(second.handler.materialize(), first.handler.table());
}

#[test]
fn dump_to_target_overwrites() {
    let mut fx = fixture(JsonFormat, ProcessingMode::Multiline);
    let out = InMemorySink::new("out.jsonl");
    fx.handler.loads("{\"a\":1}\n", &LoadOptions::default()).unwrap();

    fx.handler.dump(Output::Target(&out), None).unwrap();
    fx.handler.dump(Output::Target(&out), None).unwrap();
    assert_eq!(out.lines(), vec!["{\"a\":1}"]);
}

#[test]
fn text_writes_carry_the_byte_order_mark() {
    let mut handler = HandlerBuilder::new(ProcessingMode::Array)
        .with_encoding(Encoding::Utf8Sig)
        .with_error_sink(std::sync::Arc::new(InMemorySink::new("errors")))
        .build(JsonFormat)
        .unwrap();
    let data = parse("[]");

    let text = handler
        .dumps(StreamMode::Text, Some(DumpData::Tree(&data)))
        .unwrap();
    assert!(text.as_bytes().starts_with(Encoding::Utf8Sig.bom()));

    let binary = handler
        .dumps(StreamMode::Binary, Some(DumpData::Tree(&data)))
        .unwrap();
    assert!(!binary.as_bytes().starts_with(Encoding::Utf8Sig.bom()));
}

#[cfg(feature = "xml")]
#[test]
fn unencodable_data_is_routed_to_the_fail_buffer() {
    use crate::error::{DiagnosticKind, FailedPayload, HandlerError};
    use crate::format::XmlFormat;

    let mut fx = fixture(XmlFormat::default(), ProcessingMode::Object);
    let data = parse("[1,2]");
    let mut out: Vec<u8> = Vec::new();
    let err = fx
        .handler
        .dump(Output::Binary(&mut out), Some(DumpData::Tree(&data)))
        .unwrap_err();

    assert!(matches!(err, HandlerError::Format { .. }));
    assert!(out.is_empty());
    assert_eq!(fx.handler.failed()[0].kind, DiagnosticKind::Encode);
    assert_eq!(fx.handler.failed()[0].payload, FailedPayload::Tree(data));
    assert_eq!(fx.diagnostics.count(DiagnosticKind::Encode), 1);

    fx.handler.materialize();
    assert_eq!(fx.errors.lines(), vec!["[1,2]"]);
}
