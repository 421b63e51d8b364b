//! In-memory columnar table.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use super::{Shape, Value};

/// Errors raised when building or slicing a [`Table`].
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("row mask has {actual} entries, table has {expected} rows")]
    MaskLength { expected: usize, actual: usize },
}

/// Typed storage for a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, keep: &[bool]) -> ColumnData {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            ColumnData::Int(v) => ColumnData::Int(pick(v, keep)),
            ColumnData::Float(v) => ColumnData::Float(pick(v, keep)),
            ColumnData::Bool(v) => ColumnData::Bool(pick(v, keep)),
            ColumnData::Text(v) => ColumnData::Text(pick(v, keep)),
        }
    }

    fn truncate(&self, n: usize) -> ColumnData {
        match self {
            ColumnData::Int(v) => ColumnData::Int(v.iter().take(n).copied().collect()),
            ColumnData::Float(v) => ColumnData::Float(v.iter().take(n).copied().collect()),
            ColumnData::Bool(v) => ColumnData::Bool(v.iter().take(n).copied().collect()),
            ColumnData::Text(v) => ColumnData::Text(v.iter().take(n).cloned().collect()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Int(_) | ColumnData::Float(_))
    }

    /// Values as floats, or `None` for non-numeric columns.
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match &self.data {
            ColumnData::Int(v) => Some(v.iter().map(|x| *x as f64).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// The cell at `row` as a scalar [`Value`].
    pub fn cell(&self, row: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Int(v) => v.get(row).map(|x| Value::Int(*x)),
            ColumnData::Float(v) => v.get(row).map(|x| Value::Float(*x)),
            ColumnData::Bool(v) => v.get(row).map(|x| Value::Bool(*x)),
            ColumnData::Text(v) => v.get(row).map(|x| Value::Text(x.clone())),
        }
    }
}

/// Ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let expected = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.data.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected,
                    actual: column.data.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> Shape {
        Shape(vec![self.row_count(), self.column_count()])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Table, TableError> {
        if mask.len() != self.row_count() {
            return Err(TableError::MaskLength {
                expected: self.row_count(),
                actual: mask.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.select(mask)))
            .collect();
        Ok(Table { columns })
    }

    /// Keep the rows where numeric `column` is strictly greater than `threshold`.
    pub fn filter_greater_than(&self, column: &str, threshold: f64) -> Result<Table, TableError> {
        let values = self
            .column(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?
            .as_f64()
            .ok_or_else(|| TableError::NotNumeric(column.to_string()))?;
        let mask: Vec<bool> = values.iter().map(|v| *v > threshold).collect();
        self.filter_rows(&mask)
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.truncate(n)))
            .collect();
        Table { columns }
    }

    /// Row-major view, one `Vec<Value>` per row in column order.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        (0..self.row_count())
            .map(|row| {
                self.columns
                    .iter()
                    .filter_map(|c| c.cell(row))
                    .collect()
            })
            .collect()
    }
}

impl Serialize for ColumnData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnData::Int(v) => v.serialize(serializer),
            ColumnData::Float(v) => v.serialize(serializer),
            ColumnData::Bool(v) => v.serialize(serializer),
            ColumnData::Text(v) => v.serialize(serializer),
        }
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.data)?;
        }
        map.end()
    }
}
