use std::path::PathBuf;

use clap::Parser;

use tracked_run::config::{load_config, ObservabilityConfig, TaskDefaults, TaskSettings, TrackerKind};
use tracked_run::data::{process_data, process_data_signature, threshold_sweep};
use tracked_run::instrument::{instrument, Args};
use tracked_run::observability::{logging, metrics};
use tracked_run::tracking::build_tracker;

const DEFAULT_PROJECT: &str = "ML_Lab_Experiments";
const DEFAULT_TASK: &str = "Data_Processing";
const DEFAULT_TAGS: [&str; 2] = ["preprocessing", "v1"];

#[derive(Parser)]
#[command(name = "tracked-run")]
#[command(about = "Filter a scored dataset with every run reported to a tracker", long_about = None)]
struct Cli {
    /// CSV file with a numeric `score` column
    #[arg(short, long)]
    input: PathBuf,

    /// YAML or TOML file overriding project, task name, tags and backend
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_PROJECT)]
    project: String,

    #[arg(long, default_value = DEFAULT_TASK)]
    task_name: String,

    /// Task tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Run once with this threshold instead of sweeping
    #[arg(short, long)]
    threshold: Option<f64>,

    #[arg(long, default_value_t = 0.1)]
    sweep_start: f64,

    #[arg(long, default_value_t = 1.0)]
    sweep_stop: f64,

    #[arg(long, default_value_t = 0.2)]
    sweep_step: f64,

    /// Tracking backend: memory, local or http
    #[arg(long)]
    backend: Option<TrackerKind>,

    /// Store directory for the local backend
    #[arg(long)]
    store: Option<String>,

    /// Tracking server URL for the http backend
    #[arg(long)]
    tracker_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => Some(load_config(path)?),
        None => None,
    };

    let observability = file_config
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_else(ObservabilityConfig::default);
    logging::init_logging(&observability);

    tracing::info!("tracked-run v{} starting", env!("CARGO_PKG_VERSION"));

    if observability.metrics_enabled {
        if let Ok(addr) = observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let mut tracker_config = file_config
        .as_ref()
        .map(|c| c.tracker.clone())
        .unwrap_or_default();
    if let Some(kind) = cli.backend {
        tracker_config.kind = kind;
    }
    if let Some(store) = cli.store {
        tracker_config.root = store;
    }
    if let Some(url) = cli.tracker_url {
        tracker_config.url = Some(url);
    }

    let tags = if cli.tags.is_empty() {
        DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
    } else {
        cli.tags
    };
    let defaults = TaskDefaults::new(cli.project).task_name(cli.task_name).tags(tags);
    let signature = process_data_signature();
    let settings = TaskSettings::resolve(&defaults, file_config.as_ref(), signature.name())?;

    tracing::info!(
        project = %settings.project(),
        task = %settings.task_name(),
        tags = ?settings.tags(),
        backend = ?tracker_config.kind,
        "Configuration loaded"
    );

    let tracker = build_tracker(&tracker_config)?;
    let tracked = instrument(tracker, settings, signature, process_data);

    let thresholds = match cli.threshold {
        Some(t) => vec![t],
        None => threshold_sweep(cli.sweep_start, cli.sweep_stop, cli.sweep_step),
    };
    if thresholds.is_empty() {
        return Err("threshold sweep is empty; check --sweep-start/--sweep-stop/--sweep-step".into());
    }

    let input = cli.input.to_string_lossy().into_owned();
    for (i, threshold) in thresholds.iter().enumerate() {
        let args = Args::new()
            .arg(input.as_str())
            .kwarg("threshold", *threshold)
            .kwarg("iteration", i as i64);

        match tracked.call(args).await {
            Ok(result) => {
                let rows = result.as_table().map(|t| t.row_count()).unwrap_or(0);
                println!("run {}: threshold={:.2} rows={}", i, threshold, rows);
            }
            Err(e) => {
                tracing::error!(iteration = i, threshold, error = %e, "Run failed");
                return Err(e.into());
            }
        }
    }

    tracing::info!(runs = thresholds.len(), "All runs complete");
    Ok(())
}
