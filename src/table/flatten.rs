//! Conversion between nested records and flat column/value pairs.

use std::collections::HashSet;

use crate::tree::{Mapping, TreeValue};

/// Column name used for records that are not mappings.
pub const VALUE_COLUMN: &str = "value";

/// Flatten a record into `(column, cell)` pairs.
///
/// Nested mapping keys are joined with `separator`. An empty nested mapping
/// becomes a `Null` cell under its own key and lists are kept as list cells.
/// When a literal key and a nested path join to the same name, the later one
/// gets a `.1`, `.2`, ... suffix.
pub fn flatten(record: TreeValue, separator: &str) -> Vec<(String, TreeValue)> {
    match record {
        TreeValue::Mapping(map) => {
            let mut out = Vec::with_capacity(map.len());
            flatten_into(None, map, separator, &mut out);
            dedupe_names(&mut out);
            out
        }
        other => vec![(VALUE_COLUMN.to_string(), other)],
    }
}

fn dedupe_names(pairs: &mut [(String, TreeValue)]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(pairs.len());
    for (name, _) in pairs.iter_mut() {
        let mut candidate = name.clone();
        let mut n = 0;
        while !seen.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{name}.{n}");
        }
        *name = candidate;
    }
}

fn flatten_into(
    prefix: Option<&str>,
    map: Mapping,
    separator: &str,
    out: &mut Vec<(String, TreeValue)>,
) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{prefix}{separator}{key}"),
            None => key,
        };
        match value {
            TreeValue::Mapping(child) if child.is_empty() => out.push((name, TreeValue::NULL)),
            TreeValue::Mapping(child) => flatten_into(Some(&name), child, separator, out),
            leaf => out.push((name, leaf)),
        }
    }
}

/// Expand separator-joined column names back into nested mappings.
///
/// A name whose path collides with an existing leaf is kept flat.
pub fn unflatten(flat: &Mapping, separator: &str) -> Mapping {
    let mut nested = Mapping::new();
    for (name, value) in flat.iter() {
        let segments: Vec<&str> = if separator.is_empty() {
            vec![name]
        } else {
            name.split(separator).collect()
        };
        if let Err(value) = insert_path(&mut nested, &segments, value.clone()) {
            nested.insert(name, value);
        }
    }
    nested
}

fn insert_path(target: &mut Mapping, segments: &[&str], value: TreeValue) -> Result<(), TreeValue> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(value);
    };
    if rest.is_empty() {
        if target.contains_key(head) {
            return Err(value);
        }
        target.insert(*head, value);
        return Ok(());
    }
    if !target.contains_key(head) {
        target.insert(*head, TreeValue::Mapping(Mapping::new()));
    }
    match target.get_mut(head) {
        Some(TreeValue::Mapping(child)) => insert_path(child, rest, value),
        _ => Err(value),
    }
}
