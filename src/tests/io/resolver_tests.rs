use std::io::{Cursor, Read, Write};

use crate::error::HandlerError;
use crate::io::{
    BINARY_STREAM_ID, InMemorySink, InMemorySource, Input, OpenMode, Output, StreamMode,
    TEXT_STREAM_ID, resolve_input, resolve_output,
};

#[test]
fn open_modes_parse_and_print() {
    for label in ["r", "w", "a", "rb", "wb", "ab"] {
        assert_eq!(OpenMode::parse(label).unwrap().as_str(), label);
    }
    assert!(matches!(OpenMode::parse("r+"), Err(HandlerError::Config(_))));

    let mode = OpenMode::parse("ab").unwrap();
    assert!(mode.is_append());
    assert!(mode.is_binary());
    assert!(!mode.is_read());
    assert_eq!(mode.stream_mode(), StreamMode::Binary);
    assert_eq!(OpenMode::for_read(false), OpenMode::Read);
    assert_eq!(OpenMode::for_write(true), OpenMode::WriteBinary);
}

#[test]
fn input_rejects_write_modes() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let err = resolve_input(Input::Binary(&mut cursor), OpenMode::Write).unwrap_err();
    assert!(matches!(err, HandlerError::Config(_)));
}

#[test]
fn output_rejects_read_modes() {
    let mut out: Vec<u8> = Vec::new();
    let err = resolve_output(Output::Text(&mut out), OpenMode::Read).unwrap_err();
    assert!(matches!(err, HandlerError::Config(_)));
}

#[test]
fn borrowed_streams_are_not_owned() {
    let mut cursor = Cursor::new(b"data".to_vec());
    let resolved = resolve_input(Input::Text(&mut cursor), OpenMode::Read).unwrap();
    assert_eq!(resolved.id, TEXT_STREAM_ID);
    assert_eq!(resolved.mode, StreamMode::Text);
    assert!(!resolved.opened);

    let mut out: Vec<u8> = Vec::new();
    let resolved = resolve_output(Output::Binary(&mut out), OpenMode::WriteBinary).unwrap();
    assert_eq!(resolved.id, BINARY_STREAM_ID);
    assert!(!resolved.opened);
}

#[test]
fn providers_and_targets_are_opened() {
    let source = InMemorySource::from_string("cfg.json", "{}");
    let mut resolved = resolve_input(Input::Provider(&source), OpenMode::ReadBinary).unwrap();
    let mut text = String::new();
    resolved.reader.read_to_string(&mut text).unwrap();
    assert_eq!(text, "{}");
    assert!(resolved.opened);

    let sink = InMemorySink::new("sink");
    resolve_output(Output::Target(&sink), OpenMode::Append)
        .unwrap()
        .writer
        .write_all(b"x")
        .unwrap();
    resolve_output(Output::Target(&sink), OpenMode::Append)
        .unwrap()
        .writer
        .write_all(b"y")
        .unwrap();
    assert_eq!(sink.contents_string(), "xy");
}

#[test]
fn paths_are_created_and_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    for content in [&b"first"[..], &b"2nd"[..]] {
        let mut resolved = resolve_output(Output::path(&path), OpenMode::Write).unwrap();
        assert!(resolved.opened);
        resolved.writer.write_all(content).unwrap();
    }
    assert_eq!(std::fs::read(&path).unwrap(), b"2nd");

    let mut resolved = resolve_input(Input::path(&path), OpenMode::Read).unwrap();
    assert_eq!(resolved.id, path.to_string_lossy());
    let mut text = String::new();
    resolved.reader.read_to_string(&mut text).unwrap();
    assert_eq!(text, "2nd");
}

#[test]
fn missing_paths_are_resource_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve_input(Input::path(dir.path().join("absent")), OpenMode::Read).unwrap_err();
    assert!(err.is_not_found());

    let err = resolve_output(
        Output::path(dir.path().join("no/such/dir/out.txt")),
        OpenMode::Write,
    )
    .unwrap_err();
    assert!(matches!(err, HandlerError::Resource { .. }));
}
