//! End-to-end runs of the threshold filter under instrumentation.

mod common;

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use tracked_run::config::loader::{parse_config, ConfigFormat};
use tracked_run::config::{TaskDefaults, TaskSettings};
use tracked_run::data::{load_table, process_data, process_data_signature, DataError};
use tracked_run::instrument::{instrument, Args, CallError, InvocationRecord, Signature};
use tracked_run::tracking::figure::Figure;
use tracked_run::tracking::{LocalTracker, MemoryTracker, ReportEvent, TaskStatus, Tracker};
use tracked_run::value::Value;

use common::{write_csv, TEN_ROWS};

fn lab_defaults() -> TaskDefaults {
    TaskDefaults::new("ML_Lab_Experiments")
        .task_name("Data_Processing")
        .tags(["preprocessing", "v1"])
}

fn settings(file: Option<&tracked_run::config::FileConfig>) -> TaskSettings {
    TaskSettings::resolve(&lab_defaults(), file, "process_data").unwrap()
}

#[tokio::test]
async fn test_filter_reports_rows_count() {
    let csv = write_csv(TEN_ROWS);
    let tracker = MemoryTracker::new();
    let tracked = instrument(
        Arc::new(tracker.clone()),
        settings(None),
        process_data_signature(),
        process_data,
    );

    let args = Args::new()
        .arg(csv.path().to_str().unwrap())
        .kwarg("threshold", 0.5f64)
        .kwarg("iteration", 3i64);
    let result = tracked.call(args).await.unwrap();

    let table = result.as_table().unwrap();
    assert_eq!(table.row_count(), 6);
    assert!(table
        .column("score")
        .and_then(|c| c.as_f64())
        .unwrap()
        .iter()
        .all(|s| *s > 0.5));

    let task = &tracker.tasks()[0];
    assert_eq!(task.info.project, "ML_Lab_Experiments");
    assert_eq!(task.info.name, "Data_Processing");
    assert_eq!(task.info.status, TaskStatus::Completed);
    assert_eq!(task.scalars("Data Analysis", "rows_count"), vec![(6.0, 3)]);
    assert!(task.texts().contains(&"Result Type: table"));
    assert!(task.texts().contains(&"Result Shape: (6, 3)"));

    let sample_rows = task.events.iter().find_map(|e| match e {
        ReportEvent::Table { title, rows, .. } if title == "Processed Data Sample" => Some(rows.len()),
        _ => None,
    });
    assert_eq!(sample_rows, Some(5));

    let histograms: Vec<&str> = task
        .events
        .iter()
        .filter_map(|e| match e {
            ReportEvent::Figure {
                title,
                figure: Figure::Histogram { x_label, .. },
                ..
            } if title == "Histograms" => Some(x_label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(histograms, vec!["id", "score"]);
}

#[tokio::test]
async fn test_missing_file_fails_once() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.csv");
    let tracker = MemoryTracker::new();
    let tracked = instrument(
        Arc::new(tracker.clone()),
        settings(None),
        process_data_signature(),
        process_data,
    );

    let err = tracked
        .call(Args::new().arg(missing.to_str().unwrap()))
        .await
        .unwrap_err();
    match err {
        CallError::Execution(DataError::NotFound(path)) => assert_eq!(path, missing),
        other => panic!("unexpected error: {other:?}"),
    }

    let task = &tracker.tasks()[0];
    assert_eq!(task.info.status, TaskStatus::Failed);
    assert_eq!(task.scalars("Execution", "Error"), vec![(1.0, 0)]);
    assert!(task.scalars("Data Analysis", "rows_count").is_empty());
}

#[tokio::test]
async fn test_extra_arguments_are_ignored() {
    let csv = write_csv(TEN_ROWS);
    let tracker = MemoryTracker::new();
    let tracked = instrument(
        Arc::new(tracker.clone()),
        settings(None),
        process_data_signature(),
        process_data,
    );

    let args = Args::new()
        .arg(csv.path().to_str().unwrap())
        .arg(0.9f64)
        .arg("extra")
        .kwarg("note", "ignored");
    let result = tracked.call(args).await.unwrap();
    // 0.9 binds to `threshold` positionally
    assert_eq!(result.as_table().unwrap().row_count(), 2);

    let task = &tracker.tasks()[0];
    let params = task
        .events
        .iter()
        .find_map(|e| match e {
            ReportEvent::Parameters { values } => Some(values.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(params["args"], serde_json::json!(["extra"]));
    assert_eq!(params["kwargs"], serde_json::json!({ "note": "ignored" }));
}

#[tokio::test]
async fn test_config_tags_replace_defaults() {
    let file = parse_config(
        "project_name: Override\ntags: [a, b]\nartifacts:\n  thresholds: [0.1, 0.3]\n",
        ConfigFormat::Yaml,
    )
    .unwrap();
    let csv = write_csv(TEN_ROWS);
    let tracker = MemoryTracker::new();
    let tracked = instrument(
        Arc::new(tracker.clone()),
        settings(Some(&file)),
        process_data_signature(),
        process_data,
    );

    tracked
        .call(Args::new().arg(csv.path().to_str().unwrap()))
        .await
        .unwrap();

    let task = &tracker.tasks()[0];
    assert_eq!(task.info.project, "Override");
    assert_eq!(task.info.name, "Data_Processing");
    assert_eq!(task.info.tags, vec!["a".to_string(), "b".to_string()]);
    assert!(matches!(&task.events[0], ReportEvent::Artifact { name, .. } if name == "thresholds"));
}

#[tokio::test]
async fn test_sweep_opens_one_task_per_threshold() {
    let csv = write_csv(TEN_ROWS);
    let tracker = MemoryTracker::new();
    let tracked = instrument(
        Arc::new(tracker.clone()),
        settings(None),
        process_data_signature(),
        process_data,
    );

    let thresholds = tracked_run::data::threshold_sweep(0.1, 1.0, 0.2);
    let mut kept = Vec::new();
    for (i, threshold) in thresholds.iter().enumerate() {
        let args = Args::new()
            .arg(csv.path().to_str().unwrap())
            .kwarg("threshold", *threshold)
            .kwarg("iteration", i as i64);
        kept.push(tracked.call(args).await.unwrap().as_table().unwrap().row_count());
    }

    assert_eq!(kept, vec![9, 8, 6, 3, 2]);
    let tasks = tracker.tasks();
    assert_eq!(tasks.len(), 5);
    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(
            task.scalars("Data Analysis", "rows_count"),
            vec![(kept[i] as f64, i as i64)]
        );
    }
}

#[tokio::test]
async fn test_local_backend_persists_run() {
    let store = TempDir::new().unwrap();
    let csv = write_csv(TEN_ROWS);
    let tracker = LocalTracker::new(store.path());
    let tracked = instrument(
        Arc::new(tracker.clone()) as Arc<dyn Tracker>,
        settings(None),
        process_data_signature(),
        process_data,
    );

    let result = tracked
        .call(Args::new().arg(csv.path().to_str().unwrap()))
        .await
        .unwrap();
    assert!(matches!(result, Value::Table(_)));

    let tasks = tracker.list_tasks(Some("ML_Lab_Experiments")).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Completed);

    let (info, events) = tracker.read_task(tasks[0].id).await.unwrap();
    assert_eq!(info.tags, vec!["preprocessing".to_string(), "v1".to_string()]);
    assert!(events.iter().any(|e| matches!(
        e,
        ReportEvent::Scalar { title, series, value, .. }
            if title == "Data Analysis" && series == "rows_count" && *value == 6.0
    )));
    let artifact = events.iter().find_map(|e| match e {
        ReportEvent::Artifact { name, value } if name == "processed_data" => Some(value.clone()),
        _ => None,
    });
    assert_eq!(artifact, Some(serde_json::json!({ "file": "artifacts/processed_data.json" })));
}

/// Returns the whole table, missing cells included.
async fn load_only(record: InvocationRecord) -> Result<Value, DataError> {
    let path = record.get("input_file").and_then(Value::as_str).unwrap_or_default();
    load_table(Path::new(path)).await.map(Value::Table)
}

#[tokio::test]
async fn test_missing_scores_read_back_from_local_store() {
    let store = TempDir::new().unwrap();
    let csv = write_csv("id,score\n1,0.5\n2,\n3,0.9\n");
    let tracker = LocalTracker::new(store.path());
    let tracked = instrument(
        Arc::new(tracker.clone()),
        settings(None),
        Signature::new("load_only").param("input_file"),
        load_only,
    );

    let result = tracked
        .call(Args::new().arg(csv.path().to_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(result.as_table().unwrap().row_count(), 3);

    let tasks = tracker.list_tasks(None).await.unwrap();
    let (info, events) = tracker.read_task(tasks[0].id).await.unwrap();
    assert_eq!(info.status, TaskStatus::Completed);

    let points = events.iter().find_map(|e| match e {
        ReportEvent::Figure {
            figure: Figure::Line { points, .. },
            ..
        } => Some(points.clone()),
        _ => None,
    });
    assert_eq!(points, Some(vec![(0.0, 0.5), (2.0, 0.9)]));

    let score_bins = events.iter().find_map(|e| match e {
        ReportEvent::Figure {
            figure: Figure::Histogram { x_label, bins, .. },
            ..
        } if x_label == "score" => Some(bins.iter().map(|b| b.count).sum::<u64>()),
        _ => None,
    });
    assert_eq!(score_bins, Some(2));
}
