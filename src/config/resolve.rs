//! Resolution of caller defaults and file overrides into task settings.

use std::collections::BTreeMap;

use crate::config::loader::ConfigError;
use crate::config::schema::FileConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::value::Value;

/// Settings supplied by the code that wraps a function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDefaults {
    pub project: String,
    pub task_name: Option<String>,
    pub tags: Vec<String>,
}

impl TaskDefaults {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            task_name: None,
            tags: Vec::new(),
        }
    }

    pub fn task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Immutable settings for every task opened by one wrapped function.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSettings {
    project: String,
    task_name: String,
    tags: Vec<String>,
    artifacts: BTreeMap<String, Value>,
}

impl TaskSettings {
    /// Merge caller defaults with an optional config file.
    ///
    /// File values win field by field. A file `tags` list replaces the
    /// defaults entirely. The task name falls back to `function_name`.
    pub fn resolve(
        defaults: &TaskDefaults,
        file: Option<&FileConfig>,
        function_name: &str,
    ) -> Result<Self, ConfigError> {
        if let Some(file) = file {
            validate_config(file).map_err(ConfigError::Validation)?;
        }

        let project = file
            .and_then(|f| f.project_name.clone())
            .unwrap_or_else(|| defaults.project.clone());
        let task_name = file
            .and_then(|f| f.task_name.clone())
            .or_else(|| defaults.task_name.clone())
            .unwrap_or_else(|| function_name.to_string());
        let tags = file
            .and_then(|f| f.tags.clone())
            .unwrap_or_else(|| defaults.tags.clone());
        let artifacts = file.map(|f| f.artifacts.clone()).unwrap_or_default();

        let mut errors = Vec::new();
        if project.trim().is_empty() {
            errors.push(ValidationError::EmptyProjectName);
        }
        if task_name.trim().is_empty() {
            errors.push(ValidationError::EmptyTaskName);
        }
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        Ok(Self {
            project,
            task_name,
            tags,
            artifacts,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Values uploaded to every task before the wrapped function runs.
    pub fn artifacts(&self) -> &BTreeMap<String, Value> {
        &self.artifacts
    }
}
