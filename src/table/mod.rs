//! The tabular result produced by materialization.
//!
//! A [`Table`] is a list of named, typed columns over row-major cells.
//! Records are flattened into it (see [`flatten`]), so cells are scalars or
//! lists, never mappings.

mod flatten;

use std::collections::HashMap;
use std::fmt;

pub use flatten::{VALUE_COLUMN, flatten, unflatten};

use crate::tree::{Mapping, Scalar, TreeValue};

/// Observed type of a column, widened as values arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Only nulls seen so far
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Mixed,
}

impl ColumnType {
    pub fn of(value: &TreeValue) -> Self {
        match value {
            TreeValue::Scalar(Scalar::Null) => ColumnType::Null,
            TreeValue::Scalar(Scalar::Bool(_)) => ColumnType::Bool,
            TreeValue::Scalar(Scalar::Int(_)) => ColumnType::Int,
            TreeValue::Scalar(Scalar::Float(_)) => ColumnType::Float,
            TreeValue::Scalar(Scalar::Str(_)) => ColumnType::Str,
            TreeValue::Sequence(_) => ColumnType::List,
            TreeValue::Mapping(_) => ColumnType::Mixed,
        }
    }

    pub fn widen(self, other: ColumnType) -> ColumnType {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Null, x) | (x, ColumnType::Null) => x,
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                ColumnType::Float
            }
            _ => ColumnType::Mixed,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Null => "null",
            ColumnType::Bool => "bool",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Str => "str",
            ColumnType::List => "list",
            ColumnType::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// Borrowed view of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView<'a> {
    pub name: &'a str,
    pub dtype: ColumnType,
    pub values: Vec<&'a TreeValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<TreeValue>>,
}

fn split_cell_path(path: &str) -> Option<(&str, Option<&str>)> {
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let column = parts.next()?;
    Some((column, parts.next()))
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table by flattening each record in order.
    pub fn from_records<I>(records: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = TreeValue>,
    {
        let mut table = Table::new();
        table.append_records(records, separator);
        table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<TreeValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name).map(|i| self.columns[i].dtype)
    }

    fn push_column(&mut self, name: String) -> usize {
        let idx = self.columns.len();
        self.index.insert(name.clone(), idx);
        self.columns.push(Column {
            name,
            dtype: ColumnType::Null,
        });
        for row in &mut self.rows {
            row.push(TreeValue::NULL);
        }
        idx
    }

    /// Append one row of already-flat cells.
    ///
    /// Unknown columns are added to the right; cells missing from the row
    /// are `Null`.
    pub fn append_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (String, TreeValue)>,
    {
        let mut row = vec![TreeValue::NULL; self.columns.len()];
        for (name, value) in cells {
            let idx = match self.column_index(&name) {
                Some(idx) => idx,
                None => {
                    row.push(TreeValue::NULL);
                    self.push_column(name)
                }
            };
            let column = &mut self.columns[idx];
            column.dtype = column.dtype.widen(ColumnType::of(&value));
            row[idx] = value;
        }
        self.rows.push(row);
    }

    pub fn append_record(&mut self, record: TreeValue, separator: &str) {
        self.append_row(flatten(record, separator));
    }

    pub fn append_records<I>(&mut self, records: I, separator: &str)
    where
        I: IntoIterator<Item = TreeValue>,
    {
        for record in records {
            self.append_record(record, separator);
        }
    }

    /// Append every row of `other`, aligning columns by name.
    pub fn concat(&mut self, other: &Table) {
        for row in &other.rows {
            let cells = other
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| (column.name.clone(), cell.clone()));
            self.append_row(cells);
        }
        // Columns of an empty `other` still show up in the result.
        for column in &other.columns {
            if self.column_index(&column.name).is_none() {
                self.push_column(column.name.clone());
            }
        }
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&TreeValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column(&self, name: &str) -> Option<ColumnView<'_>> {
        let idx = self.column_index(name)?;
        Some(ColumnView {
            name: &self.columns[idx].name,
            dtype: self.columns[idx].dtype,
            values: self.rows.iter().map(|r| &r[idx]).collect(),
        })
    }

    pub fn column_i64(&self, name: &str) -> Option<Vec<Option<i64>>> {
        self.column(name)
            .map(|view| view.values.into_iter().map(TreeValue::as_i64).collect())
    }

    /// Integer cells are widened to floats.
    pub fn column_f64(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|view| view.values.into_iter().map(TreeValue::as_f64).collect())
    }

    pub fn column_str(&self, name: &str) -> Option<Vec<Option<&str>>> {
        self.column(name)
            .map(|view| view.values.into_iter().map(TreeValue::as_str).collect())
    }

    /// Rows as flat mappings keyed by column name, every column present.
    pub fn to_records(&self) -> Vec<Mapping> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.name.clone(), cell.clone()))
                    .collect()
            })
            .collect()
    }

    /// Rows with separator-joined names expanded into nested mappings.
    pub fn to_nested_records(&self, separator: &str) -> Vec<Mapping> {
        self.to_records()
            .iter()
            .map(|record| unflatten(record, separator))
            .collect()
    }

    /// Column-oriented form: `{column: [cell, ...]}`.
    pub fn to_column_mapping(&self) -> Mapping {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let values = self.rows.iter().map(|r| r[idx].clone()).collect();
                (column.name.clone(), TreeValue::Sequence(values))
            })
            .collect()
    }

    /// Read by `column` (whole column as a list) or `column/row` (one cell).
    pub fn get(&self, path: &str) -> Option<TreeValue> {
        let (column, row) = split_cell_path(path)?;
        let idx = self.column_index(column)?;
        match row {
            None => Some(TreeValue::Sequence(
                self.rows.iter().map(|r| r[idx].clone()).collect(),
            )),
            Some(row) => {
                let row: usize = row.parse().ok()?;
                self.rows.get(row).map(|r| r[idx].clone())
            }
        }
    }

    /// Write by `column` (every cell) or `column/row` (one cell).
    ///
    /// Returns the number of cells changed; unknown columns or rows change
    /// nothing.
    pub fn set(&mut self, path: &str, value: TreeValue) -> usize {
        let Some((column, row)) = split_cell_path(path) else {
            return 0;
        };
        let Some(idx) = self.column_index(column) else {
            return 0;
        };
        let changed = match row {
            None => {
                for r in &mut self.rows {
                    r[idx] = value.clone();
                }
                self.rows.len()
            }
            Some(row) => match row.parse::<usize>().ok().and_then(|i| self.rows.get_mut(i)) {
                Some(r) => {
                    r[idx] = value;
                    1
                }
                None => 0,
            },
        };
        if changed > 0 {
            self.columns[idx].dtype = self
                .rows
                .iter()
                .fold(ColumnType::Null, |acc, r| acc.widen(ColumnType::of(&r[idx])));
        }
        changed
    }
}
