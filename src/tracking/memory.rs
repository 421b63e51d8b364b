//! In-memory tracking backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{unix_now, ReportEvent, ReportSink, TaskInfo, TaskStatus, Tracker, TrackingError};
use crate::config::TaskSettings;

/// Everything recorded for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub info: TaskInfo,
    pub events: Vec<ReportEvent>,
    sequence: u64,
}

impl TaskRecord {
    /// Scalars recorded under `title`/`series`.
    pub fn scalars(&self, title: &str, series: &str) -> Vec<(f64, i64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Scalar {
                    title: t,
                    series: s,
                    value,
                    step,
                } if t == title && s == series => Some((*value, *step)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Text { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn artifact(&self, name: &str) -> Option<&serde_json::Value> {
        self.events.iter().find_map(|e| match e {
            ReportEvent::Artifact { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }
}

/// A tracker that keeps every task in process memory.
///
/// Clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryTracker {
    tasks: Arc<DashMap<Uuid, TaskRecord>>,
    next_sequence: Arc<AtomicU64>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tasks in the order they were opened.
    pub fn tasks(&self) -> Vec<TaskRecord> {
        let mut tasks: Vec<TaskRecord> = self.tasks.iter().map(|r| r.value().clone()).collect();
        tasks.sort_by_key(|t| t.sequence);
        tasks
    }

    pub fn task(&self, id: Uuid) -> Option<TaskRecord> {
        self.tasks.get(&id).map(|r| r.value().clone())
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

#[async_trait]
impl Tracker for MemoryTracker {
    async fn begin(&self, settings: &TaskSettings) -> Result<Box<dyn ReportSink>, TrackingError> {
        let id = Uuid::new_v4();
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.tasks.insert(
            id,
            TaskRecord {
                info: TaskInfo::new(id, settings),
                events: Vec::new(),
                sequence,
            },
        );
        Ok(Box::new(MemorySink {
            id,
            tasks: self.tasks.clone(),
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct MemorySink {
    id: Uuid,
    tasks: Arc<DashMap<Uuid, TaskRecord>>,
    closed: bool,
}

#[async_trait]
impl ReportSink for MemorySink {
    fn task_id(&self) -> Uuid {
        self.id
    }

    async fn record(&mut self, event: ReportEvent) -> Result<(), TrackingError> {
        if self.closed {
            return Err(TrackingError::Closed(self.id));
        }
        let mut task = self
            .tasks
            .get_mut(&self.id)
            .ok_or_else(|| TrackingError::NotFound(self.id.to_string()))?;
        task.events.push(event);
        Ok(())
    }

    async fn close(&mut self, status: TaskStatus) -> Result<(), TrackingError> {
        if self.closed {
            return Err(TrackingError::Closed(self.id));
        }
        if let Some(mut task) = self.tasks.get_mut(&self.id) {
            task.info.status = status;
            task.info.finished_at = Some(unix_now());
        }
        self.closed = true;
        Ok(())
    }
}
