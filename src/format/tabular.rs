//! Row-to-record conversion shared by the CSV and Excel adapters.

use super::FormatError;
use crate::config::LoadOptions;
use crate::tree::{Mapping, TreeValue};

/// Column names from a header row.
///
/// Blank names become `Unnamed: <index>` and repeats get a `.1`, `.2`, ...
/// suffix.
pub(crate) fn header_names(cells: &[TreeValue]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        let text = cell.cell_text();
        let base = if text.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            text
        };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Pair cells with column names; cells beyond the header use their index.
pub(crate) fn record_from(names: &[String], row: Vec<TreeValue>) -> TreeValue {
    let mapping: Mapping = row
        .into_iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = names.get(i).cloned().unwrap_or_else(|| i.to_string());
            (name, cell)
        })
        .collect();
    TreeValue::Mapping(mapping)
}

/// Apply `skiprows`, `header` and `nrows` to raw rows.
///
/// Returns the column names (empty without a header) and the data rows.
pub(crate) fn select_rows(
    rows: Vec<Vec<TreeValue>>,
    options: &LoadOptions,
) -> (Vec<String>, Vec<Vec<TreeValue>>) {
    let mut rows = rows.into_iter().skip(options.skiprows);
    let names = match options.header {
        Some(header) => match rows.nth(header) {
            Some(cells) => header_names(&cells),
            None => return (Vec::new(), Vec::new()),
        },
        None => Vec::new(),
    };
    let data = rows.take(options.nrows.unwrap_or(usize::MAX)).collect();
    (names, data)
}

/// Rows to write: a list of mappings, or one mapping as a single row.
pub(crate) fn encode_rows(value: &TreeValue) -> Result<Vec<&Mapping>, FormatError> {
    match value {
        TreeValue::Sequence(items) => mapping_rows(items),
        TreeValue::Mapping(map) => Ok(vec![map]),
        other => Err(FormatError::Shape(format!(
            "tabular output requires a list or a mapping, found a {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn mapping_rows(items: &[TreeValue]) -> Result<Vec<&Mapping>, FormatError> {
    items
        .iter()
        .map(|item| {
            item.as_mapping().ok_or_else(|| {
                FormatError::Shape(format!(
                    "expected rows of key-value records, found a {}",
                    item.type_name()
                ))
            })
        })
        .collect()
}

/// Union of row keys in first-seen order.
pub(crate) fn union_keys(rows: &[&Mapping]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}
