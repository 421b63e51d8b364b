//! Tracked runs: call any function with its parameters, outcome and results
//! reported to an experiment-tracking backend.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller                                         tracking backend
//!     │                                           (memory/local/http)
//!     │ Args                                             ▲
//!     ▼                                                  │ ReportEvent
//!  ┌──────────────┐   ┌──────────────┐   ┌───────────────┴──┐
//!  │  instrument  │──▶│   wrapped    │──▶│  instrument      │
//!  │ bind + open  │   │   function   │   │  report + close  │
//!  └──────┬───────┘   └──────────────┘   └──────────────────┘
//!         │                                      │
//!         ▼                                      ▼
//!  ┌──────────────┐                      value or error, unchanged
//!  │    config    │
//!  │ file + CLI   │   Cross-cutting: observability (tracing, metrics)
//!  └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let settings = TaskSettings::resolve(&TaskDefaults::new("Lab"), None, "process_data")?;
//! let tracked = instrument(tracker, settings, process_data_signature(), process_data);
//! let filtered = tracked.call(Args::new().arg("dataset.csv").kwarg("threshold", 0.5)).await?;
//! ```

pub mod config;
pub mod data;
pub mod instrument;
pub mod observability;
pub mod tracking;
pub mod value;

pub use config::{TaskDefaults, TaskSettings};
pub use instrument::{instrument, Args, CallError, InvocationRecord, Instrumented, Signature};
pub use tracking::{ReportSink, Tracker};
pub use value::{Table, Value};
