//! Table accumulation, typing and addressing.

use crate::table::{ColumnType, Table};
use crate::tree::TreeValue;

fn parse(json: &str) -> TreeValue {
    serde_json::from_str(json).unwrap()
}

fn table(records: &[&str]) -> Table {
    Table::from_records(records.iter().map(|r| parse(r)), ".")
}

#[test]
fn new_columns_are_added_to_the_right_and_backfilled() {
    let t = table(&[r#"{"a":1}"#, r#"{"b":"x","a":2}"#]);
    assert_eq!(t.column_names(), vec!["a", "b"]);
    assert_eq!(t.row_count(), 2);
    assert!(t.cell(0, "b").unwrap().is_null());
    assert_eq!(t.cell(1, "b"), Some(&TreeValue::from("x")));
}

#[test]
fn column_types_widen() {
    let t = table(&[
        r#"{"i":1,"f":1,"m":1,"n":null}"#,
        r#"{"i":null,"f":2.5,"m":"s","n":null}"#,
    ]);
    assert_eq!(t.column_type("i"), Some(ColumnType::Int));
    assert_eq!(t.column_type("f"), Some(ColumnType::Float));
    assert_eq!(t.column_type("m"), Some(ColumnType::Mixed));
    assert_eq!(t.column_type("n"), Some(ColumnType::Null));
}

#[test]
fn typed_column_access() {
    let t = table(&[r#"{"a":1,"s":"x"}"#, r#"{"a":2.5}"#]);
    assert_eq!(t.column_i64("a"), Some(vec![Some(1), None]));
    assert_eq!(t.column_f64("a"), Some(vec![Some(1.0), Some(2.5)]));
    assert_eq!(t.column_str("s"), Some(vec![Some("x"), None]));
    assert!(t.column("missing").is_none());
}

#[test]
fn concat_aligns_columns_by_name() {
    let mut left = table(&[r#"{"a":1,"b":2}"#]);
    let right = table(&[r#"{"b":3,"c":4}"#]);
    left.concat(&right);

    assert_eq!(left.column_names(), vec!["a", "b", "c"]);
    assert_eq!(left.column_i64("b"), Some(vec![Some(2), Some(3)]));
    assert_eq!(left.column_i64("a"), Some(vec![Some(1), None]));
}

#[test]
fn concat_with_empty_table_changes_nothing() {
    let mut left = table(&[r#"{"a":1}"#]);
    left.concat(&Table::new());
    assert_eq!(left.row_count(), 1);
    assert_eq!(left.column_names(), vec!["a"]);
}

#[test]
fn to_records_and_nested_records() {
    let t = table(&[r#"{"a":{"b":1,"c":2}}"#]);
    let flat = t.to_records();
    assert_eq!(flat[0].keys().collect::<Vec<_>>(), vec!["a.b", "a.c"]);

    let nested = t.to_nested_records(".");
    assert_eq!(TreeValue::Mapping(nested[0].clone()), parse(r#"{"a":{"b":1,"c":2}}"#));
}

#[test]
fn column_mapping_is_column_oriented() {
    let t = table(&[r#"{"a":1}"#, r#"{"a":2}"#]);
    assert_eq!(TreeValue::Mapping(t.to_column_mapping()), parse(r#"{"a":[1,2]}"#));
}

#[test]
fn get_by_column_and_cell() {
    let t = table(&[r#"{"a":1}"#, r#"{"a":2}"#]);
    assert_eq!(t.get("a"), Some(parse("[1,2]")));
    assert_eq!(t.get("a/1"), Some(TreeValue::from(2)));
    assert_eq!(t.get("a/5"), None);
    assert_eq!(t.get("zz"), None);
}

#[test]
fn set_reports_changed_cells_and_retypes() {
    let mut t = table(&[r#"{"a":1}"#, r#"{"a":2}"#]);
    assert_eq!(t.set("a/0", TreeValue::from("x")), 1);
    assert_eq!(t.column_type("a"), Some(ColumnType::Mixed));

    assert_eq!(t.set("a", TreeValue::from(0.5)), 2);
    assert_eq!(t.column_type("a"), Some(ColumnType::Float));

    assert_eq!(t.set("missing", TreeValue::from(1)), 0);
    assert_eq!(t.set("a/9", TreeValue::from(1)), 0);
}

#[test]
fn empty_table() {
    let t = Table::new();
    assert!(t.is_empty());
    assert_eq!(t.column_count(), 0);
    assert!(t.to_records().is_empty());
}
