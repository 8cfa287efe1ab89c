//! Sequential execution of the configured query jobs.
//!
//! Each job is submitted, polled until terminal, fetched from the output
//! location Athena reports and loaded into its destination with
//! `WRITE_TRUNCATE`. The first failure aborts the run; tables loaded by
//! earlier jobs stay loaded.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, info_span, Instrument};

use silver_athena::{
    ensure_succeeded, fetch_result_table, wait_for_completion, AthenaError, PollPolicy,
    QueryEngine, ResultStore,
};
use silver_bigquery::{WarehouseLoader, WriteDisposition};

use crate::error::PipelineError;
use crate::job::{JobStage, QueryJob};

/// Outcome of one completed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub name: String,
    pub destination: String,
    pub query_id: String,
    pub rows: usize,
    pub columns: usize,
    pub bytes_scanned: u64,
    pub load_job_id: String,
    pub elapsed_ms: u64,
    pub stage: JobStage,
}

/// Outcome of a full run, jobs in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub jobs: Vec<JobReport>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.jobs.iter().map(|j| j.rows).sum()
    }
}

pub struct Pipeline {
    engine: Arc<dyn QueryEngine>,
    store: Arc<dyn ResultStore>,
    loader: Arc<dyn WarehouseLoader>,
    poll: PollPolicy,
    jobs: Vec<QueryJob>,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        store: Arc<dyn ResultStore>,
        loader: Arc<dyn WarehouseLoader>,
        poll: PollPolicy,
        jobs: Vec<QueryJob>,
    ) -> Self {
        Self {
            engine,
            store,
            loader,
            poll,
            jobs,
        }
    }

    pub fn jobs(&self) -> &[QueryJob] {
        &self.jobs
    }

    /// Run every job in order, stopping at the first failure.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let mut report = RunReport::default();

        for job in &self.jobs {
            match self.run_job(job).await {
                Ok(job_report) => report.jobs.push(job_report),
                Err(err) => {
                    error!(
                        job = %job.name,
                        destination = %job.destination,
                        kind = ?err.kind(),
                        completed = report.jobs.len(),
                        error = %err,
                        "Pipeline run aborted"
                    );
                    return Err(err);
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            jobs = report.jobs.len(),
            rows = report.total_rows(),
            elapsed_ms = report.elapsed_ms,
            "Pipeline run complete"
        );
        Ok(report)
    }

    /// Run one job through submit, poll, fetch and load.
    pub async fn run_job(&self, job: &QueryJob) -> Result<JobReport, PipelineError> {
        let span = info_span!("job", name = %job.name, destination = %job.destination);
        self.run_job_inner(job).instrument(span).await
    }

    async fn run_job_inner(&self, job: &QueryJob) -> Result<JobReport, PipelineError> {
        let start = Instant::now();
        let query_err = |error: AthenaError| PipelineError::Query {
            destination: job.destination.clone(),
            error,
        };

        info!(database = %job.database, "Starting query");
        let query_id = self
            .engine
            .start_query(&job.request())
            .await
            .map_err(query_err)?;
        info!(query_id = %query_id, stage = %JobStage::Submitted, "Query submitted");

        info!(query_id = %query_id, stage = %JobStage::Polling, "Waiting for query");
        let execution = wait_for_completion(self.engine.as_ref(), &query_id, &self.poll)
            .await
            .map_err(query_err)?;
        let stage = JobStage::after_query(execution.state());
        info!(query_id = %query_id, stage = %stage, "Query finished");
        let execution = ensure_succeeded(execution).map_err(query_err)?;

        info!(
            query_id = %query_id,
            stage = %JobStage::Fetching,
            output_location = execution.output_location.as_deref().unwrap_or(""),
            "Fetching result"
        );
        let table = fetch_result_table(self.store.as_ref(), &execution)
            .await
            .map_err(|error| PipelineError::Retrieval {
                destination: job.destination.clone(),
                error,
            })?;
        info!(
            query_id = %query_id,
            rows = table.row_count(),
            columns = table.column_count(),
            "Query returned rows"
        );

        info!(stage = %JobStage::Loading, rows = table.row_count(), "Loading table");
        let summary = self
            .loader
            .load_table(table.batch(), &job.destination, WriteDisposition::WriteTruncate)
            .await
            .map_err(|error| PipelineError::Load {
                destination: job.destination.clone(),
                error,
            })?;

        let report = JobReport {
            name: job.name.clone(),
            destination: job.destination.clone(),
            query_id,
            rows: table.row_count(),
            columns: table.column_count(),
            bytes_scanned: execution.bytes_scanned,
            load_job_id: summary.job_id,
            elapsed_ms: start.elapsed().as_millis() as u64,
            stage: JobStage::Done,
        };
        info!(
            load_job_id = %report.load_job_id,
            rows = report.rows,
            output_rows = ?summary.output_rows,
            elapsed_ms = report.elapsed_ms,
            "Table updated"
        );
        Ok(report)
    }
}
