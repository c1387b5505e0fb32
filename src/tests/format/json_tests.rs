//! JSON adapter tests.

use crate::config::{Encoding, LoadOptions, ProcessingMode};
use crate::format::{DecodeContext, Format, FormatError, FormatKind, JsonFormat};
use crate::tests::support::parse;

#[test]
fn decode_document() {
    let options = LoadOptions::default();
    let ctx = DecodeContext::new(ProcessingMode::Array, Encoding::Utf8, &options);
    let value = JsonFormat.decode(br#"[{"a":1}]"#, &ctx).unwrap();
    assert_eq!(value, parse(r#"[{"a":1}]"#));
    assert_eq!(JsonFormat.kind(), FormatKind::Json);
}

#[test]
fn decode_rejects_invalid_utf8() {
    let options = LoadOptions::default();
    let ctx = DecodeContext::new(ProcessingMode::Array, Encoding::Utf8, &options);
    let err = JsonFormat.decode(b"\xff", &ctx).unwrap_err();
    assert!(matches!(err, FormatError::Syntax(_)));
}

#[test]
fn decode_lines_reports_line_numbers() {
    let options = LoadOptions::default();
    let ctx = DecodeContext::new(ProcessingMode::Multiline, Encoding::Utf8, &options);
    let outcomes = JsonFormat.decode_lines(b"{\"a\":1}\n\n{oops\n", &ctx);

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_ok());
    let rejected = outcomes[1].as_ref().unwrap_err();
    assert_eq!(rejected.line, 3);
}

#[test]
fn encode_is_pretty_and_newline_terminated() {
    let mut out: Vec<u8> = Vec::new();
    JsonFormat
        .encode(&parse(r#"{"a":1}"#), ProcessingMode::Object, &mut out)
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": 1\n}\n");
}

#[test]
fn encode_lines_is_compact() {
    let mut out: Vec<u8> = Vec::new();
    JsonFormat
        .encode_lines(&[parse(r#"{"a":1}"#), parse("[1, 2]")], &mut out)
        .unwrap();
    assert_eq!(out, b"{\"a\":1}\n[1,2]\n");
}
