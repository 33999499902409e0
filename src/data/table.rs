use std::collections::HashSet;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::model::CellValue;
use crate::error::{DaplotError, Result};

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

/// One named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// An in-memory rectangular dataset: ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from columns, checking names are non-empty and unique and
    /// that lengths are equal.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (i, col) in columns.iter().enumerate() {
            if col.name.trim().is_empty() {
                return Err(DaplotError::InvalidFormat(format!(
                    "column {i} has an empty name"
                )));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(DaplotError::InvalidFormat(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }

        let row_count = columns.first().map_or(0, |c| c.values.len());
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(DaplotError::InvalidFormat(format!(
                "column '{}' has {} values but expected {row_count}",
                bad.name,
                bad.values.len()
            )));
        }

        Ok(Self { columns, row_count })
    }

    /// Build a table from row-major data. Every row must have one cell per header.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(DaplotError::InvalidFormat("headers must not be empty".into()));
        }
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|h| Column::new(h, Vec::with_capacity(rows.len())))
            .collect();

        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DaplotError::InvalidFormat(format!(
                    "row {row_no} has {} cells but there are {} headers",
                    row.len(),
                    columns.len()
                )));
            }
            for (col, cell) in columns.iter_mut().zip(row) {
                col.values.push(cell);
            }
        }

        Self::new(columns)
    }

    /// Build a table from column-major data: `columns[i]` holds the cells of `headers[i]`.
    pub fn from_columns(headers: Vec<String>, columns: Vec<Vec<CellValue>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(DaplotError::InvalidFormat("headers must not be empty".into()));
        }
        if headers.len() != columns.len() {
            return Err(DaplotError::InvalidFormat(format!(
                "{} headers but {} columns",
                headers.len(),
                columns.len()
            )));
        }
        Self::new(
            headers
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Cells of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`Table::column`], failing with `UnknownColumn`.
    pub fn require_column(&self, name: &str) -> Result<&[CellValue]> {
        self.column(name)
            .ok_or_else(|| DaplotError::UnknownColumn(name.to_string()))
    }

    /// A new table holding only the given rows, in the order given.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Table {
            columns,
            row_count: indices.len(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let n = n.min(self.row_count);
        self.take_rows(&(0..n).collect::<Vec<_>>())
    }

    /// Rows as header → value records.
    pub fn records(&self) -> Vec<Record> {
        (0..self.row_count)
            .map(|i| {
                Record(
                    self.columns
                        .iter()
                        .map(|c| (c.name.clone(), c.values[i].clone()))
                        .collect(),
                )
            })
            .collect()
    }

    /// Rows as plain cell vectors, for editing.
    pub fn to_rows(&self) -> Vec<Vec<CellValue>> {
        (0..self.row_count)
            .map(|i| self.columns.iter().map(|c| c.values[i].clone()).collect())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Record – one row keyed by header, serialized as a JSON object
// ---------------------------------------------------------------------------

/// One row as ordered `(header, value)` pairs. Serializes as a map that keeps
/// column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(pub Vec<(String, CellValue)>);

impl Record {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
