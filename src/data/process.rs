//! The threshold filter run under instrumentation.

use std::path::Path;

use super::{load_table, DataError};
use crate::instrument::{InvocationRecord, Signature};
use crate::value::{TableError, Value};

pub const SCORE_COLUMN: &str = "score";
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// `process_data(input_file, threshold=0.5, *args, **kwargs)`
pub fn process_data_signature() -> Signature {
    Signature::new("process_data")
        .param("input_file")
        .param_with_default("threshold", DEFAULT_THRESHOLD)
        .var_positional("args")
        .var_keyword("kwargs")
}

/// Load `input_file` and keep the rows whose score exceeds `threshold`.
///
/// Extra arguments are accepted and ignored.
pub async fn process_data(record: InvocationRecord) -> Result<Value, DataError> {
    let input_file = record
        .get("input_file")
        .and_then(Value::as_str)
        .ok_or_else(|| DataError::InvalidArgument {
            name: "input_file".into(),
            reason: "expected a file path".into(),
        })?;
    let threshold = record
        .get("threshold")
        .and_then(Value::as_f64)
        .ok_or_else(|| DataError::InvalidArgument {
            name: "threshold".into(),
            reason: "expected a number".into(),
        })?;

    let table = load_table(Path::new(input_file)).await?;
    let filtered = table
        .filter_greater_than(SCORE_COLUMN, threshold)
        .map_err(|e| match e {
            TableError::UnknownColumn(name) => DataError::MissingColumn(name),
            other => DataError::Table(other),
        })?;

    tracing::debug!(
        input_file,
        threshold,
        kept = filtered.row_count(),
        total = table.row_count(),
        "Rows filtered"
    );
    Ok(Value::Table(filtered))
}

/// Half-open range `[start, stop)` in increments of `step`.
///
/// Returns nothing for non-positive or non-finite steps.
pub fn threshold_sweep(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0 && start.is_finite() && stop.is_finite()) || stop <= start {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil() as usize;
    (0..count).map(|i| start + step * i as f64).collect()
}
