use rust_xlsxwriter::Workbook;

use crate::config::{Encoding, ExcelOptions, LoadOptions, ProcessingMode};
use crate::format::{DecodeContext, ExcelFormat, Format, FormatError, FormatKind};
use crate::handler::DumpData;
use crate::io::StreamMode;
use crate::tests::support::{fixture, parse};

fn workbook(records: &str, options: ExcelOptions) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    ExcelFormat::new(options)
        .encode(&parse(records), ProcessingMode::Array, &mut out)
        .unwrap();
    out
}

#[test]
fn excel_is_binary_and_not_line_oriented() {
    let format = ExcelFormat::default();
    assert_eq!(format.kind(), FormatKind::Excel);
    assert!(format.is_binary());
    assert!(!format.supports_lines());
    assert!(!format.supports_object());
}

#[test]
fn written_workbooks_read_back_typed() {
    let bytes = workbook(
        r#"[{"a":1,"b":"x","c":2.5,"d":true},{"a":2,"b":null}]"#,
        ExcelOptions::default(),
    );
    let mut fx = fixture(ExcelFormat::default(), ProcessingMode::Array);
    let report = fx.handler.loads(bytes, &LoadOptions::default()).unwrap();
    assert_eq!(report.passed, 2);

    let table = fx.handler.materialize();
    assert_eq!(table.column_names(), vec!["a", "b", "c", "d"]);
    assert_eq!(table.column_i64("a"), Some(vec![Some(1), Some(2)]));
    assert_eq!(table.column_str("b"), Some(vec![Some("x"), None]));
    assert_eq!(table.column_f64("c"), Some(vec![Some(2.5), None]));
    assert!(table.cell(0, "d").unwrap().as_bool().unwrap());
}

#[test]
fn sheet_selection_by_name() {
    let bytes = workbook(
        r#"[{"k":"v"}]"#,
        ExcelOptions {
            sheet_name: "Data".into(),
        },
    );
    let options = LoadOptions::default();
    let ctx = DecodeContext::new(ProcessingMode::Array, Encoding::Utf8, &options);
    assert_eq!(
        ExcelFormat::default().decode(&bytes, &ctx).unwrap(),
        parse(r#"[{"k":"v"}]"#)
    );

    let missing = LoadOptions::default().with_sheet("Other");
    let ctx = DecodeContext::new(ProcessingMode::Array, Encoding::Utf8, &missing);
    assert!(ExcelFormat::default().decode(&bytes, &ctx).is_err());
}

#[test]
fn header_and_row_window() {
    let bytes = workbook(r#"[{"n":1},{"n":2},{"n":3}]"#, ExcelOptions::default());
    let mut fx = fixture(ExcelFormat::default(), ProcessingMode::Array);
    let options = LoadOptions::default().with_header(None).with_nrows(2);
    fx.handler.loads(bytes, &options).unwrap();
    let table = fx.handler.materialize();
    assert_eq!(table.column_names(), vec!["0"]);
    assert_eq!(table.cell(0, "0").unwrap().as_str(), Some("n"));
    assert_eq!(table.row_count(), 2);
}

#[test]
fn row_positions_count_from_the_top_of_the_sheet() {
    let mut book = Workbook::new();
    let sheet = book.add_worksheet();
    sheet.write_string(2, 0, "n").unwrap();
    sheet.write_number(3, 0, 1.0).unwrap();
    sheet.write_number(4, 0, 2.0).unwrap();
    let bytes = book.save_to_buffer().unwrap();

    let mut fx = fixture(ExcelFormat::default(), ProcessingMode::Array);
    let options = LoadOptions::default().with_skiprows(2);
    fx.handler.loads(bytes, &options).unwrap();
    let table = fx.handler.materialize();
    assert_eq!(table.column_names(), vec!["n"]);
    assert_eq!(table.column_i64("n"), Some(vec![Some(1), Some(2)]));
}

#[test]
fn garbage_bytes_fail_the_load() {
    let mut fx = fixture(ExcelFormat::default(), ProcessingMode::Array);
    let report = fx
        .handler
        .loads(b"not a workbook".to_vec(), &LoadOptions::default())
        .unwrap();
    assert_eq!(report.passed, 0);
    assert_eq!(report.failed, 1);
}

#[test]
fn dumps_produce_a_zip_container() {
    let mut fx = fixture(ExcelFormat::default(), ProcessingMode::Array);
    let data = parse(r#"[{"a":1}]"#);
    let dumped = fx
        .handler
        .dumps(StreamMode::Binary, Some(DumpData::Tree(&data)))
        .unwrap();
    assert!(dumped.as_bytes().starts_with(b"PK"));
}

#[test]
fn line_output_is_refused() {
    let mut out: Vec<u8> = Vec::new();
    let err = ExcelFormat::default()
        .encode_lines(&[parse(r#"{"a":1}"#)], &mut out)
        .unwrap_err();
    assert!(matches!(err, FormatError::Shape(_)));
}
