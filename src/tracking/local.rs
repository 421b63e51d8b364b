//! File-backed tracking store.
//!
//! # Layout
//! ```text
//! <root>/<project>/<task-id>/task.json       task metadata and status
//! <root>/<project>/<task-id>/events.jsonl    one ReportEvent per line
//! <root>/<project>/<task-id>/artifacts/*.json artifact payloads
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{unix_now, ReportEvent, ReportSink, TaskInfo, TaskStatus, Tracker, TrackingError};
use crate::config::TaskSettings;

const TASK_FILE: &str = "task.json";
const EVENTS_FILE: &str = "events.jsonl";
const ARTIFACTS_DIR: &str = "artifacts";

/// A tracker that persists tasks as JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalTracker {
    root: PathBuf,
}

impl LocalTracker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata of every stored task, oldest first.
    pub async fn list_tasks(&self, project: Option<&str>) -> Result<Vec<TaskInfo>, TrackingError> {
        let mut tasks = Vec::new();
        for dir in self.task_dirs().await? {
            let info = read_info(&dir).await?;
            if project.map_or(true, |p| p == info.project) {
                tasks.push(info);
            }
        }
        tasks.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    /// Metadata and events of one task.
    pub async fn read_task(&self, id: Uuid) -> Result<(TaskInfo, Vec<ReportEvent>), TrackingError> {
        let wanted = id.to_string();
        for dir in self.task_dirs().await? {
            if dir.file_name().and_then(|n| n.to_str()) != Some(wanted.as_str()) {
                continue;
            }
            let info = read_info(&dir).await?;
            let events_path = dir.join(EVENTS_FILE);
            let content = fs::read_to_string(&events_path)
                .await
                .map_err(|e| TrackingError::io(&events_path, e))?;
            let events = content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str)
                .collect::<Result<Vec<ReportEvent>, _>>()?;
            return Ok((info, events));
        }
        Err(TrackingError::NotFound(wanted))
    }

    async fn task_dirs(&self) -> Result<Vec<PathBuf>, TrackingError> {
        let mut dirs = Vec::new();
        if !fs::try_exists(&self.root).await.unwrap_or(false) {
            return Ok(dirs);
        }
        let mut projects = fs::read_dir(&self.root)
            .await
            .map_err(|e| TrackingError::io(&self.root, e))?;
        while let Some(project) = projects
            .next_entry()
            .await
            .map_err(|e| TrackingError::io(&self.root, e))?
        {
            let project_path = project.path();
            if !project_path.is_dir() {
                continue;
            }
            let mut entries = fs::read_dir(&project_path)
                .await
                .map_err(|e| TrackingError::io(&project_path, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| TrackingError::io(&project_path, e))?
            {
                let path = entry.path();
                if path.join(TASK_FILE).is_file() {
                    dirs.push(path);
                }
            }
        }
        Ok(dirs)
    }
}

async fn read_info(dir: &Path) -> Result<TaskInfo, TrackingError> {
    let path = dir.join(TASK_FILE);
    let bytes = fs::read(&path).await.map_err(|e| TrackingError::io(&path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_info(dir: &Path, info: &TaskInfo) -> Result<(), TrackingError> {
    let path = dir.join(TASK_FILE);
    let bytes = serde_json::to_vec_pretty(info)?;
    fs::write(&path, bytes).await.map_err(|e| TrackingError::io(&path, e))
}

/// Replace anything outside `[A-Za-z0-9._-]` so names are safe path components.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        _ => cleaned,
    }
}

#[async_trait]
impl Tracker for LocalTracker {
    async fn begin(&self, settings: &TaskSettings) -> Result<Box<dyn ReportSink>, TrackingError> {
        let id = Uuid::new_v4();
        let dir = self.root.join(sanitize(settings.project())).join(id.to_string());
        let artifacts = dir.join(ARTIFACTS_DIR);
        fs::create_dir_all(&artifacts)
            .await
            .map_err(|e| TrackingError::io(&artifacts, e))?;

        let info = TaskInfo::new(id, settings);
        write_info(&dir, &info).await?;

        let events_path = dir.join(EVENTS_FILE);
        let events = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)
            .await
            .map_err(|e| TrackingError::io(&events_path, e))?;

        tracing::debug!(task_id = %id, dir = %dir.display(), "Local task opened");
        Ok(Box::new(LocalSink {
            dir,
            info,
            events,
            artifact_files: HashSet::new(),
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

struct LocalSink {
    dir: PathBuf,
    info: TaskInfo,
    events: File,
    artifact_files: HashSet<String>,
    closed: bool,
}

impl LocalSink {
    /// File name for artifact `name`, unique within this task.
    fn artifact_file(&mut self, name: &str) -> String {
        let stem = sanitize(name);
        let mut file = format!("{}.json", stem);
        let mut n = 2;
        while self.artifact_files.contains(&file) {
            file = format!("{}-{}.json", stem, n);
            n += 1;
        }
        self.artifact_files.insert(file.clone());
        file
    }

    async fn append(&mut self, event: &ReportEvent) -> Result<(), TrackingError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let path = self.dir.join(EVENTS_FILE);
        self.events
            .write_all(&line)
            .await
            .map_err(|e| TrackingError::io(&path, e))
    }
}

#[async_trait]
impl ReportSink for LocalSink {
    fn task_id(&self) -> Uuid {
        self.info.id
    }

    async fn record(&mut self, event: ReportEvent) -> Result<(), TrackingError> {
        if self.closed {
            return Err(TrackingError::Closed(self.info.id));
        }
        let event = match event {
            ReportEvent::Artifact { name, value } => {
                let file = self.artifact_file(&name);
                let path = self.dir.join(ARTIFACTS_DIR).join(&file);
                let bytes = serde_json::to_vec_pretty(&value)?;
                fs::write(&path, bytes).await.map_err(|e| TrackingError::io(&path, e))?;
                ReportEvent::Artifact {
                    name,
                    value: serde_json::json!({ "file": format!("{}/{}", ARTIFACTS_DIR, file) }),
                }
            }
            other => other,
        };
        self.append(&event).await
    }

    async fn close(&mut self, status: TaskStatus) -> Result<(), TrackingError> {
        if self.closed {
            return Err(TrackingError::Closed(self.info.id));
        }
        let path = self.dir.join(EVENTS_FILE);
        self.events.flush().await.map_err(|e| TrackingError::io(&path, e))?;
        self.info.status = status;
        self.info.finished_at = Some(unix_now());
        write_info(&self.dir, &self.info).await?;
        self.closed = true;
        Ok(())
    }
}
