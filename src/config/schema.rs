//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for tracked runs.
//! All types derive Serde traits for deserialization from YAML or TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Root of a run configuration file.
///
/// Every field is optional; absent task fields fall back to the caller's
/// defaults during resolution.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Tracking project the task is filed under.
    pub project_name: Option<String>,

    /// Task name; defaults to the wrapped function's name.
    pub task_name: Option<String>,

    /// Labels attached to the task. Replaces the caller's tags when present.
    pub tags: Option<Vec<String>>,

    /// Pre-computed values uploaded before the wrapped function runs.
    pub artifacts: BTreeMap<String, Value>,

    /// Tracking backend selection.
    pub tracker: TrackerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which tracking backend receives reports.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    /// Keep reports in process memory (dry run).
    Memory,
    /// Persist reports as JSON files under `root`.
    #[default]
    Local,
    /// Send reports to a tracking server over HTTP.
    Http,
}

impl std::str::FromStr for TrackerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(TrackerKind::Memory),
            "local" => Ok(TrackerKind::Local),
            "http" => Ok(TrackerKind::Http),
            other => Err(format!("unknown tracker kind '{}'", other)),
        }
    }
}

/// Tracking backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Backend kind.
    pub kind: TrackerKind,

    /// Store directory for the local backend.
    pub root: String,

    /// Tracking server base URL for the http backend.
    pub url: Option<String>,

    /// Bearer token sent to the tracking server.
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kind: TrackerKind::Local,
            root: "./tracking".to_string(),
            url: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
