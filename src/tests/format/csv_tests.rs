//! CSV adapter and handler tests.

use crate::builder::HandlerBuilder;
use crate::config::{CsvOptions, LoadOptions, ProcessingMode, QuotePolicy, UseCols};
use crate::error::{DiagnosticKind, FailedPayload, HandlerError};
use crate::format::{CsvFormat, Format, FormatKind};
use crate::handler::DumpData;
use crate::io::StreamMode;
use crate::table::ColumnType;
use crate::tests::support::{Fixture, fixture, parse};
use crate::tree::TreeValue;

fn csv(mode: ProcessingMode) -> Fixture<CsvFormat> {
    fixture(CsvFormat::default(), mode)
}

fn csv_with(options: CsvOptions, mode: ProcessingMode) -> Fixture<CsvFormat> {
    fixture(CsvFormat::new(options).expect("ascii options"), mode)
}

#[test]
fn header_row_names_columns_and_cells_are_typed() {
    let mut fx = csv(ProcessingMode::Array);
    fx.handler
        .loads("a,b,c\n1,x,true\n2.5,,false\n", &LoadOptions::default())
        .unwrap();
    let table = fx.handler.materialize();

    assert_eq!(table.column_names(), vec!["a", "b", "c"]);
    assert_eq!(table.column_type("a"), Some(ColumnType::Float));
    assert_eq!(table.column_str("b"), Some(vec![Some("x"), None]));
    assert_eq!(table.column_type("c"), Some(ColumnType::Bool));
}

#[test]
fn without_header_columns_are_positions() {
    let mut fx = csv(ProcessingMode::Array);
    let options = LoadOptions::default().with_header(None);
    fx.handler.loads("1,2\n3,4\n", &options).unwrap();
    let table = fx.handler.materialize();
    assert_eq!(table.column_names(), vec!["0", "1"]);
    assert_eq!(table.row_count(), 2);
}

#[test]
fn skiprows_and_nrows() {
    let mut fx = csv(ProcessingMode::Array);
    let options = LoadOptions::default().with_skiprows(1).with_nrows(2);
    fx.handler
        .loads("exported today\na,b\n1,2\n3,4\n5,6\n", &options)
        .unwrap();
    assert_eq!(
        fx.handler.materialize().column_i64("a"),
        Some(vec![Some(1), Some(3)])
    );
}

#[test]
fn blank_and_duplicate_header_names() {
    let mut fx = csv(ProcessingMode::Array);
    fx.handler.loads("a,a,\n1,2,3\n", &LoadOptions::default()).unwrap();
    assert_eq!(
        fx.handler.materialize().column_names(),
        vec!["a", "a.1", "Unnamed: 2"]
    );
}

#[test]
fn short_rows_are_padded() {
    let mut fx = csv(ProcessingMode::Array);
    fx.handler.loads("a,b\n1\n", &LoadOptions::default()).unwrap();
    let table = fx.handler.materialize();
    assert_eq!(table.column_names(), vec!["a", "b"]);
    assert!(table.cell(0, "b").unwrap().is_null());
}

#[test]
fn long_rows_fail_the_document() {
    let mut fx = csv(ProcessingMode::Array);
    let report = fx
        .handler
        .loads("a,b\n1,2,3\n", &LoadOptions::default())
        .unwrap();
    assert_eq!(report.passed, 0);
    assert_eq!(report.count(DiagnosticKind::Decode), 1);
    assert_eq!(
        fx.handler.failed()[0].payload,
        FailedPayload::Text("a,b\n1,2,3\n".into())
    );
}

#[test]
fn multiline_rejects_only_the_mismatched_line() {
    let mut fx = csv(ProcessingMode::Multiline);
    let report = fx
        .handler
        .loads("a,b\n1,2\n3\n4,5\n", &LoadOptions::default())
        .unwrap();

    assert_eq!(report.passed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(fx.handler.failed()[0].payload, FailedPayload::Text("3".into()));
    assert_eq!(
        fx.handler.materialize().column_i64("b"),
        Some(vec![Some(2), Some(5)])
    );
}

#[test]
fn quoted_fields_keep_delimiters() {
    let mut fx = csv(ProcessingMode::Array);
    fx.handler
        .loads("name,notes\n\"Smith, J\",\"said \"\"hi\"\"\"\n", &LoadOptions::default())
        .unwrap();
    let table = fx.handler.materialize();
    assert_eq!(table.column_str("name"), Some(vec![Some("Smith, J")]));
    assert_eq!(table.column_str("notes"), Some(vec![Some("said \"hi\"")]));
}

#[test]
fn inference_can_be_disabled() {
    let mut fx = csv_with(
        CsvOptions::default().with_infer_types(false),
        ProcessingMode::Array,
    );
    fx.handler.loads("a\n007\n", &LoadOptions::default()).unwrap();
    assert_eq!(
        fx.handler.materialize().column_str("a"),
        Some(vec![Some("007")])
    );
}

#[test]
fn usecols_by_position() {
    let mut fx = csv(ProcessingMode::Array);
    let options = LoadOptions::default().with_usecols(UseCols::Indices(vec![0, 2]));
    fx.handler.loads("a,b,c\n1,2,3\n", &options).unwrap();
    assert_eq!(fx.handler.materialize().column_names(), vec!["a", "c"]);
}

#[test]
fn dump_writes_union_header() {
    let mut fx = csv(ProcessingMode::Array);
    let data = parse(r#"[{"a":1,"b":"x"},{"c":2.0}]"#);
    let out = fx
        .handler
        .dumps(StreamMode::Text, Some(DumpData::Tree(&data)))
        .unwrap();
    assert_eq!(out.as_text(), Some("a,b,c\n1,x,\n,,2.0\n"));
}

#[test]
fn quote_all_policy() {
    let mut fx = csv_with(
        CsvOptions::default().with_quoting(QuotePolicy::All),
        ProcessingMode::Array,
    );
    let data = parse(r#"[{"a":1}]"#);
    let out = fx
        .handler
        .dumps(StreamMode::Text, Some(DumpData::Tree(&data)))
        .unwrap();
    assert_eq!(out.as_text(), Some("\"a\"\n\"1\"\n"));
}

#[test]
fn header_row_can_be_left_out() {
    let mut fx = csv_with(
        CsvOptions::default().with_write_header(false),
        ProcessingMode::Array,
    );
    let data = parse(r#"[{"a":1,"b":"x"},{"a":2,"b":"y"}]"#);
    let out = fx
        .handler
        .dumps(StreamMode::Text, Some(DumpData::Tree(&data)))
        .unwrap();
    assert_eq!(out.as_text(), Some("1,x\n2,y\n"));
}

#[test]
fn read_header_takes_the_first_record() {
    let format = CsvFormat::default();
    assert_eq!(
        format.read_header("id,\"full name\"\n1,Ann\n".as_bytes()).unwrap(),
        Some(vec!["id".to_string(), "full name".to_string()])
    );
    assert_eq!(format.read_header("".as_bytes()).unwrap(), None);
}

#[test]
fn object_mode_is_refused_at_build_time() {
    let err = HandlerBuilder::new(ProcessingMode::Object)
        .build_csv(CsvOptions::default())
        .unwrap_err();
    assert!(matches!(err, HandlerError::Config(_)));
}

#[test]
fn round_trip_through_csv() {
    let mut first = csv(ProcessingMode::Array);
    first
        .handler
        .loads("id,name,score\n1,ann,2.5\n2,bob,3.0\n", &LoadOptions::default())
        .unwrap();
    let dumped = first.handler.dumps(StreamMode::Binary, None).unwrap();

    let mut second = csv(ProcessingMode::Array);
    second.handler.loads(dumped.as_bytes(), &LoadOptions::default()).unwrap();
    assert_eq!(second.handler.materialize(), first.handler.table());
}

#[test]
fn tsv_kind_and_delimiter() {
    let mut fx = csv_with(CsvOptions::tsv(), ProcessingMode::Array);
    assert_eq!(fx.handler.format().kind(), FormatKind::Tsv);
    fx.handler.loads("a\tb\n1\t2\n", &LoadOptions::default()).unwrap();
    assert_eq!(fx.handler.materialize().column_names(), vec!["a", "b"]);
}

#[test]
fn scalar_rows_cannot_be_written() {
    let mut fx = csv(ProcessingMode::Array);
    let data = TreeValue::from("just text");
    assert!(
        fx.handler
            .dumps(StreamMode::Text, Some(DumpData::Tree(&data)))
            .is_err()
    );
    assert_eq!(fx.handler.failed()[0].kind, DiagnosticKind::Encode);
}
