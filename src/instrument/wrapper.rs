//! The instrumentation wrapper.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::Instrument as _;

use super::record::InvocationRecord;
use super::report;
use super::signature::{Args, BindError, Signature};
use crate::config::TaskSettings;
use crate::observability::metrics;
use crate::tracking::{ReportSink, TaskStatus, Tracker, TrackingError};
use crate::value::Value;

/// Why an instrumented call did not return a value.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// The arguments did not fit the signature; nothing was opened or run.
    #[error("argument binding failed: {0}")]
    Binding(#[from] BindError),

    /// The tracking backend failed outside the wrapped function.
    #[error("tracking failed: {0}")]
    Tracking(#[source] TrackingError),

    /// The wrapped function's own error, unchanged.
    #[error("{0}")]
    Execution(E),
}

impl<E> CallError<E> {
    /// The wrapped function's error, if that is what this is.
    pub fn into_execution(self) -> Option<E> {
        match self {
            CallError::Execution(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, CallError::Execution(_))
    }
}

/// Which branch an invocation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// A function wrapped so every call is reported to a tracker.
///
/// Each [`call`](Instrumented::call) opens its own task, reports the
/// resolved parameters, runs the function and reports the outcome, then
/// closes the task. The function's value or error is returned unchanged.
pub struct Instrumented<F> {
    tracker: Arc<dyn Tracker>,
    settings: TaskSettings,
    signature: Signature,
    func: F,
}

/// Wrap `func`, declared with `signature`, so its calls are tracked.
pub fn instrument<F>(
    tracker: Arc<dyn Tracker>,
    settings: TaskSettings,
    signature: Signature,
    func: F,
) -> Instrumented<F> {
    Instrumented {
        tracker,
        settings,
        signature,
        func,
    }
}

impl<F> fmt::Debug for Instrumented<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumented")
            .field("tracker", &self.tracker.name())
            .field("settings", &self.settings)
            .field("signature", &self.signature)
            .finish()
    }
}

impl<F> Instrumented<F> {
    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call the wrapped function with `args`.
    pub async fn call<Fut, E>(&self, args: Args) -> Result<Value, CallError<E>>
    where
        F: Fn(InvocationRecord) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
    {
        let span = tracing::info_span!(
            "tracked.call",
            function = %self.signature.name(),
            project = %self.settings.project(),
            task = %self.settings.task_name(),
        );
        self.call_inner(args).instrument(span).await
    }

    async fn call_inner<Fut, E>(&self, args: Args) -> Result<Value, CallError<E>>
    where
        F: Fn(InvocationRecord) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
    {
        let record = self.signature.bind(&args)?;
        let step = record.lookup("iteration").and_then(Value::as_i64).unwrap_or(0);

        let mut sink = self
            .tracker
            .begin(&self.settings)
            .await
            .map_err(|e| self.tracking_failed(e))?;
        tracing::info!(task_id = %sink.task_id(), backend = self.tracker.name(), "Tracking task opened");

        if let Err(e) = self.prepare(sink.as_mut(), &record).await {
            self.close_quietly(sink.as_mut(), TaskStatus::Failed).await;
            return Err(self.tracking_failed(e));
        }

        let started = Instant::now();
        let result = (self.func)(record).await;
        let elapsed = started.elapsed();

        match result {
            Ok(value) => {
                metrics::record_invocation(self.settings.task_name(), Outcome::Success, elapsed);
                if let Err(e) = report::report_success(sink.as_mut(), &value, step, elapsed).await {
                    self.close_quietly(sink.as_mut(), TaskStatus::Failed).await;
                    return Err(self.tracking_failed(e));
                }
                sink.close(TaskStatus::Completed)
                    .await
                    .map_err(|e| self.tracking_failed(e))?;
                tracing::info!(
                    task_id = %sink.task_id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    result = %value.category(),
                    "Tracked call succeeded"
                );
                Ok(value)
            }
            Err(err) => {
                metrics::record_invocation(self.settings.task_name(), Outcome::Failure, elapsed);
                let message = err.to_string();
                tracing::warn!(task_id = %sink.task_id(), error = %message, "Tracked call failed");
                // The function's error takes precedence over any reporting failure.
                if let Err(e) = report::report_failure(sink.as_mut(), &message, elapsed).await {
                    self.note_lost_report(&e);
                }
                self.close_quietly(sink.as_mut(), TaskStatus::Failed).await;
                Err(CallError::Execution(err))
            }
        }
    }

    /// Upload configured artifacts and report the call parameters.
    async fn prepare(&self, sink: &mut dyn ReportSink, record: &InvocationRecord) -> Result<(), TrackingError> {
        for (name, value) in self.settings.artifacts() {
            sink.upload_artifact(name, value).await?;
        }
        report::report_parameters(sink, record).await
    }

    async fn close_quietly(&self, sink: &mut dyn ReportSink, status: TaskStatus) {
        if let Err(e) = sink.close(status).await {
            self.note_lost_report(&e);
        }
    }

    fn note_lost_report(&self, error: &TrackingError) {
        metrics::record_tracking_error(self.tracker.name());
        tracing::warn!(backend = self.tracker.name(), error = %error, "Tracking report dropped");
    }

    fn tracking_failed<E>(&self, error: TrackingError) -> CallError<E> {
        metrics::record_tracking_error(self.tracker.name());
        tracing::error!(backend = self.tracker.name(), error = %error, "Tracking backend failed");
        CallError::Tracking(error)
    }
}
