//! FormatKind parsing and extension mapping.

use crate::config::ProcessingMode;
use crate::format::FormatKind;

#[test]
fn extension_mapping() {
    assert_eq!(FormatKind::from_extension("csv"), Some(FormatKind::Csv));
    assert_eq!(FormatKind::from_extension("TSV"), Some(FormatKind::Tsv));
    assert_eq!(FormatKind::from_extension("json"), Some(FormatKind::Json));
    assert_eq!(FormatKind::from_extension("ndjson"), Some(FormatKind::JsonLines));
    assert_eq!(FormatKind::from_extension("jsonl"), Some(FormatKind::JsonLines));
    assert_eq!(FormatKind::from_extension("xml"), Some(FormatKind::Xml));
    assert_eq!(FormatKind::from_extension("xlsx"), Some(FormatKind::Excel));
    assert_eq!(FormatKind::from_extension("txt"), None);
}

#[test]
fn from_str_and_display_agree() {
    for kind in [
        FormatKind::Csv,
        FormatKind::Tsv,
        FormatKind::Json,
        FormatKind::JsonLines,
        FormatKind::Xml,
        FormatKind::Excel,
    ] {
        assert_eq!(FormatKind::from_str(&kind.to_string()), Some(kind));
    }
}

#[test]
fn json_lines_default_to_multiline() {
    assert_eq!(FormatKind::JsonLines.default_mode(), ProcessingMode::Multiline);
    assert_eq!(FormatKind::Csv.default_mode(), ProcessingMode::Array);
}

#[test]
fn availability_follows_features() {
    assert!(FormatKind::Json.is_available());
    assert_eq!(FormatKind::Csv.is_available(), cfg!(feature = "csv"));
    assert_eq!(FormatKind::Xml.is_available(), cfg!(feature = "xml"));
    assert_eq!(FormatKind::Excel.is_available(), cfg!(feature = "excel"));
}
