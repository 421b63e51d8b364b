//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject blank names and duplicate tags
//! - Check backend-specific requirements (http needs a URL)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FileConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{FileConfig, TrackerKind};

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("project_name must not be empty")]
    EmptyProjectName,

    #[error("task_name must not be empty")]
    EmptyTaskName,

    #[error("tag at position {0} is blank")]
    BlankTag(usize),

    #[error("tag '{0}' is listed more than once")]
    DuplicateTag(String),

    #[error("artifact names must not be blank")]
    BlankArtifactName,

    #[error("http tracker requires a url")]
    MissingTrackerUrl,

    #[error("invalid tracker url '{0}'")]
    InvalidTrackerUrl(String),

    #[error("tracker timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every violation.
pub fn validate_config(config: &FileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if matches!(&config.project_name, Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::EmptyProjectName);
    }
    if matches!(&config.task_name, Some(t) if t.trim().is_empty()) {
        errors.push(ValidationError::EmptyTaskName);
    }

    if let Some(tags) = &config.tags {
        for (i, tag) in tags.iter().enumerate() {
            if tag.trim().is_empty() {
                errors.push(ValidationError::BlankTag(i));
            } else if tags[..i].contains(tag) {
                errors.push(ValidationError::DuplicateTag(tag.clone()));
            }
        }
    }

    if config.artifacts.keys().any(|name| name.trim().is_empty()) {
        errors.push(ValidationError::BlankArtifactName);
    }

    let tracker = &config.tracker;
    if tracker.kind == TrackerKind::Http {
        match &tracker.url {
            None => errors.push(ValidationError::MissingTrackerUrl),
            Some(raw) => {
                let valid = url::Url::parse(raw)
                    .map(|u| matches!(u.scheme(), "http" | "https"))
                    .unwrap_or(false);
                if !valid {
                    errors.push(ValidationError::InvalidTrackerUrl(raw.clone()));
                }
            }
        }
    }
    if tracker.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
