//! AWS Athena query execution client.
//!
//! Provides [`AthenaClient`], the production [`QueryEngine`]: it submits
//! SQL with an explicit database and output location, reads back execution
//! status, and cancels executions that outlive their poll budget.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use chrono::{DateTime, Utc};
use tracing::info;

use silver_core::AthenaConfig;

use crate::engine::{QueryEngine, QueryRequest};
use crate::status::{ExecutionInfo, QueryErrorDetail, QueryState, QueryStatus};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur while executing a query or retrieving its result.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// The execution reached FAILED or CANCELLED. Carries the full status.
    #[error("query {query_id} failed: {status}")]
    QueryFailed { query_id: String, status: QueryStatus },

    /// Polling exceeded the configured maximum wait.
    #[error("query {query_id} did not finish within {waited_secs}s")]
    QueryTimeout { query_id: String, waited_secs: u64 },

    /// Athena reported success but no result location.
    #[error("query {query_id} succeeded without an output location")]
    MissingOutputLocation { query_id: String },

    /// The output location is not of the form `s3://<bucket>/<key>`.
    #[error("invalid output location: {0:?}")]
    InvalidOutputLocation(String),

    /// An Athena SDK error (stringified with its full context).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// Fetching the result object from S3 failed.
    #[error("object store error: {0}")]
    ObjectStore(String),

    /// The result file could not be decoded into a table.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<arrow::error::ArrowError> for AthenaError {
    fn from(e: arrow::error::ArrowError) -> Self {
        AthenaError::Decode(e.to_string())
    }
}

/// Load the shared AWS SDK configuration for `region`.
///
/// Credentials come from the default provider chain (env, profile, IMDS).
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(aws_sdk_athena::config::Region::new(region.to_string()))
        .load()
        .await
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for executing queries against AWS Athena.
pub struct AthenaClient {
    athena_client: aws_sdk_athena::Client,
    workgroup: Option<String>,
}

impl AthenaClient {
    /// Create a client from an already-loaded SDK config.
    pub fn new(sdk_config: &SdkConfig, config: &AthenaConfig) -> Self {
        info!(
            region = %config.region,
            workgroup = config.workgroup.as_deref().unwrap_or("(default)"),
            "AthenaClient initialised"
        );

        Self {
            athena_client: aws_sdk_athena::Client::new(sdk_config),
            workgroup: config.workgroup.clone(),
        }
    }
}

#[async_trait]
impl QueryEngine for AthenaClient {
    async fn start_query(&self, request: &QueryRequest) -> Result<String, AthenaError> {
        let resp = self
            .athena_client
            .start_query_execution()
            .query_string(&request.sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&request.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .set_work_group(self.workgroup.clone())
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(DisplayErrorContext(&e).to_string()))?;

        let query_id = resp
            .query_execution_id()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution ID returned".into()))?
            .to_string();

        Ok(query_id)
    }

    async fn query_execution(&self, query_id: &str) -> Result<ExecutionInfo, AthenaError> {
        let resp = self
            .athena_client
            .get_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(DisplayErrorContext(&e).to_string()))?;

        let qe = resp
            .query_execution()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution in response".into()))?;

        Ok(execution_from_sdk(query_id, qe))
    }

    async fn cancel_query(&self, query_id: &str) -> Result<(), AthenaError> {
        info!(query_id = %query_id, "Cancelling query");

        self.athena_client
            .stop_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SDK conversion
// ---------------------------------------------------------------------------

fn state_from_sdk(state: Option<&QueryExecutionState>) -> QueryState {
    match state {
        // No state yet: the execution has only just been accepted.
        None | Some(QueryExecutionState::Queued) => QueryState::Queued,
        Some(QueryExecutionState::Running) => QueryState::Running,
        Some(QueryExecutionState::Succeeded) => QueryState::Succeeded,
        Some(QueryExecutionState::Failed) => QueryState::Failed,
        Some(QueryExecutionState::Cancelled) => QueryState::Cancelled,
        Some(_) => QueryState::Unknown,
    }
}

fn datetime_from_sdk(dt: &aws_sdk_athena::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Convert an SDK `QueryExecution` into our [`ExecutionInfo`].
pub(crate) fn execution_from_sdk(
    query_id: &str,
    qe: &aws_sdk_athena::types::QueryExecution,
) -> ExecutionInfo {
    let sdk_status = qe.status();
    let stats = qe.statistics();

    let status = QueryStatus {
        state: state_from_sdk(sdk_status.and_then(|s| s.state())),
        state_change_reason: sdk_status
            .and_then(|s| s.state_change_reason())
            .map(str::to_string),
        submitted_at: sdk_status
            .and_then(|s| s.submission_date_time())
            .and_then(datetime_from_sdk),
        completed_at: sdk_status
            .and_then(|s| s.completion_date_time())
            .and_then(datetime_from_sdk),
        error: sdk_status.and_then(|s| s.athena_error()).map(|e| QueryErrorDetail {
            error_category: e.error_category(),
            error_message: e.error_message().map(str::to_string),
        }),
    };

    ExecutionInfo {
        query_id: query_id.to_string(),
        status,
        output_location: qe
            .result_configuration()
            .and_then(|rc| rc.output_location())
            .map(str::to_string),
        bytes_scanned: stats
            .and_then(|s| s.data_scanned_in_bytes())
            .unwrap_or(0)
            .max(0) as u64,
        execution_time_ms: stats
            .and_then(|s| s.engine_execution_time_in_millis())
            .unwrap_or(0)
            .max(0) as u64,
    }
}

// ---------------------------------------------------------------------------
// Tests: conversion logic only, no AWS calls
// ---------------------------------------------------------------------------
