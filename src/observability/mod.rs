//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Instrumented calls produce:
//!     → logging.rs (structured log events, one span per call)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Local observability is separate from the tracking backend: a broken
//!   backend still shows up in logs and metrics

pub mod logging;
pub mod metrics;
