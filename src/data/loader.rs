//! CSV loading with per-column type inference.

use std::io::ErrorKind;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use super::DataError;
use crate::value::{Column, ColumnData, Table};

/// Read a CSV file with a header row into memory.
pub async fn load_table(path: &Path) -> Result<Table, DataError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| match source.kind() {
        ErrorKind::NotFound => DataError::NotFound(path.to_path_buf()),
        _ => DataError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let table = parse_table(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "Table loaded"
    );
    Ok(table)
}

/// Parse CSV bytes (header row first).
///
/// Each column becomes `Int` if every cell is an integer, `Float` if every
/// non-empty cell is numeric (empty cells become NaN), `Bool` if every cell
/// is `true`/`false`, and `Text` otherwise. Header-only columns are `Float`.
pub fn parse_table(bytes: &[u8]) -> Result<Table, DataError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(cell.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer(raw)))
        .collect();
    Ok(Table::new(columns)?)
}

fn infer(raw: Vec<String>) -> ColumnData {
    let non_empty = || raw.iter().filter(|c| !c.is_empty());
    let has_empty = raw.iter().any(|c| c.is_empty());
    let all_empty = non_empty().next().is_none();

    if raw.is_empty() {
        return ColumnData::Float(Vec::new());
    }
    if all_empty {
        return ColumnData::Text(raw);
    }
    if !has_empty && raw.iter().all(|c| c.parse::<i64>().is_ok()) {
        return ColumnData::Int(raw.iter().filter_map(|c| c.parse().ok()).collect());
    }
    if non_empty().all(|c| c.parse::<f64>().is_ok()) {
        return ColumnData::Float(
            raw.iter()
                .map(|c| c.parse::<f64>().unwrap_or(f64::NAN))
                .collect(),
        );
    }
    if !has_empty && raw.iter().all(|c| parse_bool(c).is_some()) {
        return ColumnData::Bool(raw.iter().filter_map(|c| parse_bool(c)).collect());
    }
    ColumnData::Text(raw)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
