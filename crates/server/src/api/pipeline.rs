//! Pipeline trigger endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use tracing::{error, info};

use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "Pipeline executed successfully!";
pub const FAILURE_PREFIX: &str = "Pipeline execution failed";

/// `GET /`: run every job and report the outcome as plain text.
///
/// The run lives on its own task, so a caller that disconnects does not
/// stop it partway through.
pub async fn run_pipeline(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    info!("Starting pipeline run");

    let pipeline = state.pipeline.clone();
    let outcome = tokio::spawn(async move { pipeline.run().await }).await;

    match outcome {
        Ok(Ok(report)) => {
            info!(
                jobs = report.jobs.len(),
                rows = report.total_rows(),
                elapsed_ms = report.elapsed_ms,
                "Pipeline run succeeded"
            );
            (StatusCode::OK, SUCCESS_MESSAGE.to_string())
        }
        Ok(Err(err)) => {
            error!(
                kind = ?err.kind(),
                destination = %err.destination(),
                error = %err,
                details = ?err,
                "Pipeline run failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{FAILURE_PREFIX}: {err}"),
            )
        }
        Err(join_err) => {
            error!(error = %join_err, "Pipeline task did not complete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{FAILURE_PREFIX}: {join_err}"),
            )
        }
    }
}
