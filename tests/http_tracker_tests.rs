//! The HTTP backend against a mock tracking server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tracked_run::config::{TaskDefaults, TaskSettings};
use tracked_run::data::{process_data, process_data_signature};
use tracked_run::instrument::{instrument, Args, CallError};
use tracked_run::tracking::{HttpTracker, TrackingError};

use common::{start_mock_tracker, write_csv, RecordedRequest, TEN_ROWS};

const TASK_ID: &str = "7d3c0a52-93c5-4f6a-8f3e-2f9d4a1b6c01";

fn accept_all(request: &RecordedRequest) -> (u16, String) {
    if request.path == "/api/v1/tasks" {
        (200, format!(r#"{{"id":"{}"}}"#, TASK_ID))
    } else {
        (200, "{}".to_string())
    }
}

fn settings() -> TaskSettings {
    TaskSettings::resolve(
        &TaskDefaults::new("remote").task_name("filter").tags(["http"]),
        None,
        "process_data",
    )
    .unwrap()
}

fn tracker(url: &str) -> HttpTracker {
    HttpTracker::new(url, Some("secret".to_string()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_run_posts_task_lifecycle() {
    let server = start_mock_tracker(accept_all).await;
    let csv = write_csv(TEN_ROWS);
    let tracked = instrument(
        Arc::new(tracker(&server.url())),
        settings(),
        process_data_signature(),
        process_data,
    );

    let result = tracked
        .call(Args::new().arg(csv.path().to_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(result.as_table().unwrap().row_count(), 6);

    let requests = server.recorded();
    let create = &requests[0];
    assert_eq!(create.method, "POST");
    assert_eq!(create.path, "/api/v1/tasks");
    assert_eq!(create.body["project"], "remote");
    assert_eq!(create.body["name"], "filter");
    assert_eq!(create.body["tags"], serde_json::json!(["http"]));

    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() == Some("Bearer secret")));

    let events = format!("/api/v1/tasks/{}/events", TASK_ID);
    let artifacts = format!("/api/v1/tasks/{}/artifacts", TASK_ID);
    let close = format!("/api/v1/tasks/{}/close", TASK_ID);

    assert_eq!(requests[1].path, events);
    assert_eq!(requests[1].body["kind"], "parameters");
    assert!(requests
        .iter()
        .any(|r| r.path == artifacts && r.body["name"] == "processed_data"));
    assert!(requests.iter().any(|r| r.path == events
        && r.body["kind"] == "scalar"
        && r.body["series"] == "rows_count"
        && r.body["value"] == 6.0));

    let last = requests.last().unwrap();
    assert_eq!(last.path, close);
    assert_eq!(last.body["status"], "completed");
}

#[tokio::test]
async fn test_rejected_open_surfaces_status() {
    let server = start_mock_tracker(|_| (503, r#"{"error":"maintenance"}"#.to_string())).await;
    let csv = write_csv(TEN_ROWS);
    let tracked = instrument(
        Arc::new(tracker(&server.url())),
        settings(),
        process_data_signature(),
        process_data,
    );

    let err = tracked
        .call(Args::new().arg(csv.path().to_str().unwrap()))
        .await
        .unwrap_err();
    match err {
        CallError::Tracking(TrackingError::Rejected { status, body }) => {
            assert_eq!(status, 503);
            assert!(body.contains("maintenance"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.recorded().len(), 1);
}

#[tokio::test]
async fn test_failed_call_closes_task_as_failed() {
    let server = start_mock_tracker(accept_all).await;
    let tracked = instrument(
        Arc::new(tracker(&server.url())),
        settings(),
        process_data_signature(),
        process_data,
    );

    let err = tracked
        .call(Args::new().arg("/nonexistent/input.csv"))
        .await
        .unwrap_err();
    assert!(err.is_execution());

    let requests = server.recorded();
    let errors = requests
        .iter()
        .filter(|r| r.body["kind"] == "scalar" && r.body["series"] == "Error")
        .count();
    assert_eq!(errors, 1);
    assert_eq!(requests.last().unwrap().body["status"], "failed");
}

#[tokio::test]
async fn test_reporting_errors_do_not_mask_function_error() {
    // Reject every scalar and the final close.
    let server = start_mock_tracker(|request| {
        if request.body["kind"] == "scalar" || request.path.ends_with("/close") {
            (500, r#"{"error":"storage"}"#.to_string())
        } else {
            accept_all(request)
        }
    })
    .await;
    let tracked = instrument(
        Arc::new(tracker(&server.url())),
        settings(),
        process_data_signature(),
        process_data,
    );

    let err = tracked
        .call(Args::new().arg("/nonexistent/input.csv").kwarg("threshold", 0.2f64))
        .await
        .unwrap_err();
    assert!(err.is_execution());
    assert!(server.recorded().iter().any(|r| r.path.ends_with("/close")));
}
