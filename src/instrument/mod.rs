//! Instrumentation subsystem.
//!
//! # Data Flow
//! ```text
//! Args (as written by the caller)
//!     → signature.rs (bind against declared parameters, apply defaults)
//!     → InvocationRecord
//!     → Tracker::begin (one task per call)
//!     → report.rs (config artifacts, parameters with category/shape)
//!     → wrapped function
//!     → report.rs (success: result, artifact, table analysis
//!                  failure: error scalar and message)
//!     → ReportSink::close
//!     → caller receives the function's value or error unchanged
//! ```
//!
//! # Design Decisions
//! - The wrapper is a plain value around a typed callable, no macros
//! - Binding happens before the task opens so bad arguments never create tasks
//! - Reporting failures on the success path surface as `CallError::Tracking`;
//!   on the failure path the function's error always wins
//! - Tasks are closed on both paths

pub mod record;
pub mod report;
pub mod signature;
pub mod wrapper;

pub use record::InvocationRecord;
pub use signature::{Args, BindError, Param, Signature};
pub use wrapper::{instrument, CallError, Instrumented, Outcome};
