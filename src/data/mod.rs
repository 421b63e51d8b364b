//! Tabular input and the threshold-filter pipeline.
//!
//! # Data Flow
//! ```text
//! CSV file
//!     → loader.rs (read fully, infer column types)
//!     → Table
//!     → process.rs (keep rows with score > threshold)
//!     → Value::Table (returned through the instrumentation wrapper)
//! ```

pub mod loader;
pub mod process;

use std::path::PathBuf;

use thiserror::Error;

use crate::value::TableError;

pub use loader::{load_table, parse_table};
pub use process::{process_data, process_data_signature, threshold_sweep};

/// Errors raised while loading or processing tabular data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
}
