//! Tracking backend subsystem.
//!
//! # Data Flow
//! ```text
//! Instrumented call:
//!     → Tracker::begin (one task per invocation)
//!     → ReportSink::record (parameters, text, scalars, tables, figures, artifacts)
//!     → ReportSink::close (final status)
//!
//! Backends:
//!     → memory.rs (in-process, dry runs and tests)
//!     → local.rs  (JSON files on disk)
//!     → http.rs   (tracking server)
//! ```
//!
//! # Design Decisions
//! - Every report is a serializable ReportEvent; backends only differ in transport
//! - A sink is owned by exactly one invocation and never reused
//! - A closed sink rejects further reports

pub mod figure;
pub mod http;
pub mod local;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{TaskSettings, TrackerConfig, TrackerKind};
use crate::value::{Table, Value};

pub use figure::Figure;
pub use http::HttpTracker;
pub use local::LocalTracker;
pub use memory::MemoryTracker;

/// Errors raised by tracking backends.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracking server returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("task {0} is already closed")]
    Closed(Uuid),

    #[error("task {0} not found")]
    NotFound(String),

    #[error("invalid tracker configuration: {0}")]
    InvalidConfig(String),
}

impl TrackingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackingError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Lifecycle state of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

/// Metadata describing one tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: Uuid,
    pub project: String,
    pub name: String,
    pub tags: Vec<String>,
    pub status: TaskStatus,
    /// Seconds since epoch.
    pub started_at: u64,
    pub finished_at: Option<u64>,
}

impl TaskInfo {
    pub fn new(id: Uuid, settings: &TaskSettings) -> Self {
        Self {
            id,
            project: settings.project().to_string(),
            name: settings.task_name().to_string(),
            tags: settings.tags().to_vec(),
            status: TaskStatus::Running,
            started_at: unix_now(),
            finished_at: None,
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// One report appended to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEvent {
    Parameters {
        values: serde_json::Value,
    },
    Text {
        message: String,
    },
    Scalar {
        title: String,
        series: String,
        value: f64,
        step: i64,
    },
    Table {
        title: String,
        series: String,
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    },
    Figure {
        title: String,
        series: String,
        figure: Figure,
    },
    Artifact {
        name: String,
        value: serde_json::Value,
    },
}

/// Write side of one tracked task.
///
/// Backends implement [`record`](ReportSink::record) and
/// [`close`](ReportSink::close); the typed helpers build events.
#[async_trait]
pub trait ReportSink: Send {
    fn task_id(&self) -> Uuid;

    async fn record(&mut self, event: ReportEvent) -> Result<(), TrackingError>;

    async fn close(&mut self, status: TaskStatus) -> Result<(), TrackingError>;

    /// Attach the resolved call parameters to the task.
    async fn connect_parameters(&mut self, values: serde_json::Value) -> Result<(), TrackingError> {
        self.record(ReportEvent::Parameters { values }).await
    }

    async fn log_text(&mut self, message: String) -> Result<(), TrackingError> {
        self.record(ReportEvent::Text { message }).await
    }

    async fn log_scalar(
        &mut self,
        title: &str,
        series: &str,
        value: f64,
        step: i64,
    ) -> Result<(), TrackingError> {
        self.record(ReportEvent::Scalar {
            title: title.to_string(),
            series: series.to_string(),
            value,
            step,
        })
        .await
    }

    async fn log_table(&mut self, title: &str, series: &str, table: &Table) -> Result<(), TrackingError> {
        let columns = table.column_names().into_iter().map(String::from).collect();
        let rows = table
            .rows()
            .iter()
            .map(|row| row.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;
        self.record(ReportEvent::Table {
            title: title.to_string(),
            series: series.to_string(),
            columns,
            rows,
        })
        .await
    }

    async fn log_figure(&mut self, title: &str, series: &str, figure: Figure) -> Result<(), TrackingError> {
        self.record(ReportEvent::Figure {
            title: title.to_string(),
            series: series.to_string(),
            figure,
        })
        .await
    }

    async fn upload_artifact(&mut self, name: &str, value: &Value) -> Result<(), TrackingError> {
        self.record(ReportEvent::Artifact {
            name: name.to_string(),
            value: serde_json::to_value(value)?,
        })
        .await
    }
}

/// Factory for report sinks.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Open a new task scoped to the settings' project, name and tags.
    async fn begin(&self, settings: &TaskSettings) -> Result<Box<dyn ReportSink>, TrackingError>;

    /// Backend name for logs and metric labels.
    fn name(&self) -> &'static str;
}

/// Build the backend selected by `config`.
pub fn build_tracker(config: &TrackerConfig) -> Result<Arc<dyn Tracker>, TrackingError> {
    let tracker: Arc<dyn Tracker> = match config.kind {
        TrackerKind::Memory => Arc::new(MemoryTracker::new()),
        TrackerKind::Local => Arc::new(LocalTracker::new(&config.root)),
        TrackerKind::Http => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| TrackingError::InvalidConfig("http tracker requires a url".into()))?;
            Arc::new(HttpTracker::new(
                url,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?)
        }
    };
    tracing::debug!(backend = tracker.name(), "Tracking backend ready");
    Ok(tracker)
}
