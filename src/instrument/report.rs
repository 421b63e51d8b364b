//! What gets reported for parameters, results and failures.

use std::time::Duration;

use crate::tracking::figure::{Figure, HISTOGRAM_BINS};
use crate::tracking::{ReportSink, TrackingError};
use crate::value::{Table, Value};

use super::record::InvocationRecord;

pub const EXECUTION_TITLE: &str = "Execution";
pub const SUCCESS_SERIES: &str = "Success";
pub const ERROR_SERIES: &str = "Error";
pub const DURATION_SERIES: &str = "duration_ms";
pub const RESULT_ARTIFACT: &str = "processed_data";
pub const ANALYSIS_TITLE: &str = "Data Analysis";
pub const ROWS_COUNT_SERIES: &str = "rows_count";
pub const SAMPLE_TITLE: &str = "Processed Data Sample";
pub const SAMPLE_ROWS: usize = 5;
pub const PLOTTED_COLUMN: &str = "score";

pub(crate) async fn report_parameters(
    sink: &mut dyn ReportSink,
    record: &InvocationRecord,
) -> Result<(), TrackingError> {
    sink.connect_parameters(serde_json::to_value(record)?).await?;
    for (name, value) in record.iter() {
        sink.log_text(format!("Input Parameter \"{}\" Type: {}", name, value.category()))
            .await?;
        if let Some(shape) = value.shape() {
            sink.log_text(format!("Input Parameter \"{}\" Shape: {}", name, shape))
                .await?;
        }
    }
    Ok(())
}

pub(crate) async fn report_success(
    sink: &mut dyn ReportSink,
    result: &Value,
    step: i64,
    elapsed: Duration,
) -> Result<(), TrackingError> {
    sink.log_scalar(EXECUTION_TITLE, SUCCESS_SERIES, 1.0, 0).await?;
    sink.log_scalar(EXECUTION_TITLE, DURATION_SERIES, elapsed.as_secs_f64() * 1000.0, 0)
        .await?;

    sink.log_text(format!("Result Type: {}", result.category())).await?;
    if let Some(shape) = result.shape() {
        sink.log_text(format!("Result Shape: {}", shape)).await?;
    }

    sink.upload_artifact(RESULT_ARTIFACT, result).await?;

    if let Some(table) = result.as_table() {
        report_table(sink, table, step).await?;
    }
    Ok(())
}

async fn report_table(sink: &mut dyn ReportSink, table: &Table, step: i64) -> Result<(), TrackingError> {
    for column in table.numeric_columns() {
        if let Some(values) = column.as_f64() {
            let figure = Figure::histogram(column.name(), &values, HISTOGRAM_BINS);
            sink.log_figure("Histograms", "Dataset", figure).await?;
        }
    }

    if let Some(values) = table.column(PLOTTED_COLUMN).and_then(|c| c.as_f64()) {
        sink.log_figure("Data Plot", "Dataset", Figure::line(PLOTTED_COLUMN, &values))
            .await?;
    }

    sink.log_scalar(ANALYSIS_TITLE, ROWS_COUNT_SERIES, table.row_count() as f64, step)
        .await?;
    sink.log_table(SAMPLE_TITLE, "Data", &table.head(SAMPLE_ROWS)).await?;
    Ok(())
}

pub(crate) async fn report_failure(
    sink: &mut dyn ReportSink,
    message: &str,
    elapsed: Duration,
) -> Result<(), TrackingError> {
    sink.log_scalar(EXECUTION_TITLE, ERROR_SERIES, 1.0, 0).await?;
    sink.log_scalar(EXECUTION_TITLE, DURATION_SERIES, elapsed.as_secs_f64() * 1000.0, 0)
        .await?;
    sink.log_text(message.to_string()).await
}
