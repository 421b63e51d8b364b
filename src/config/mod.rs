//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FileConfig
//!
//! caller defaults (project, task name, tags)
//!     + FileConfig
//!     → resolve.rs (explicit merge)
//!     → TaskSettings (immutable, shared by every call of one wrapped function)
//! ```
//!
//! # Design Decisions
//! - Settings are resolved once, before any tracking task is opened
//! - File values override caller defaults; nothing is mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod resolve;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use resolve::{TaskDefaults, TaskSettings};
pub use schema::{FileConfig, ObservabilityConfig, TrackerConfig, TrackerKind};
pub use validation::ValidationError;
