//! BigQuery load-job client.
//!
//! Provides [`BigQueryClient`], the production [`WarehouseLoader`]. A load
//! uploads the table as Parquet through a multipart `jobs.insert` call and
//! then polls `jobs.get` at a fixed interval until the job is DONE.

use std::sync::Arc;
use std::time::Duration;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info};
use uuid::Uuid;

use silver_core::BigQueryConfig;

use crate::auth::{MetadataServerToken, StaticToken, TokenProvider};
use crate::encode::encode_parquet;
use crate::job::{Job, JobReference, LoadJobRequest, WriteDisposition};
use crate::table_id::TableId;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BigQueryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("load job {job_id} failed: {reason}: {message}")]
    JobFailed {
        job_id: String,
        reason: String,
        message: String,
    },

    #[error("invalid table id: {0:?}")]
    InvalidTableId(String),

    #[error("failed to encode load payload: {0}")]
    Encode(String),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl From<parquet::errors::ParquetError> for BigQueryError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        BigQueryError::Encode(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Outcome of a completed load job.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub job_id: String,
    pub destination: TableId,
    /// Rows BigQuery reports as written, when it reports them.
    pub output_rows: Option<u64>,
}

/// Columnar warehouse that accepts whole-table loads.
#[async_trait]
pub trait WarehouseLoader: Send + Sync {
    /// Load `batch` into `destination`, blocking until the load finishes.
    async fn load_table(
        &self,
        batch: &RecordBatch,
        destination: &str,
        disposition: WriteDisposition,
    ) -> Result<LoadSummary, BigQueryError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct BigQueryClient {
    http: reqwest::Client,
    endpoint: String,
    project: String,
    poll_interval: Duration,
    tokens: Arc<dyn TokenProvider>,
}

impl BigQueryClient {
    pub fn new(config: &BigQueryConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_http(reqwest::Client::new(), config, tokens)
    }

    /// Build a client whose credentials follow the config: the static token
    /// when one is set, the metadata server otherwise.
    pub fn from_config(config: &BigQueryConfig) -> Self {
        let http = reqwest::Client::new();
        let tokens: Arc<dyn TokenProvider> = match &config.access_token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(MetadataServerToken::new(http.clone())),
        };
        Self::with_http(http, config, tokens)
    }

    fn with_http(
        http: reqwest::Client,
        config: &BigQueryConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        info!(
            project = %config.project,
            endpoint = %config.endpoint,
            "BigQueryClient initialised"
        );
        Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            poll_interval: config.poll_interval(),
            tokens,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Submit a Parquet load job via multipart upload.
    async fn insert_load_job(
        &self,
        payload: Vec<u8>,
        destination: &TableId,
        disposition: WriteDisposition,
    ) -> Result<Job, BigQueryError> {
        let job_reference = JobReference {
            project_id: self.project.clone(),
            job_id: format!("silver_sync_load_{}", Uuid::new_v4().simple()),
            location: None,
        };
        let request = LoadJobRequest::parquet(job_reference, destination, disposition);
        let metadata = serde_json::to_vec(&request).map_err(|e| BigQueryError::Encode(e.to_string()))?;

        let boundary = format!("silver_sync_{}", Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &metadata, &payload);

        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs?uploadType=multipart",
            self.endpoint, self.project
        );
        debug!(url = %url, bytes = body.len(), "Submitting load job");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.tokens.access_token().await?)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        parse_job(response).await
    }

    async fn get_job(&self, reference: &JobReference) -> Result<Job, BigQueryError> {
        let base = format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.endpoint, reference.project_id, reference.job_id
        );
        let url = match &reference.location {
            Some(location) => Url::parse_with_params(&base, &[("location", location)]),
            None => Url::parse(&base),
        }
        .map_err(|e| BigQueryError::Parse(format!("bad job URL {base}: {e}")))?;

        let response = self
            .http
            .get(url)
            .bearer_auth(self.tokens.access_token().await?)
            .send()
            .await?;

        parse_job(response).await
    }

    /// Poll until the job is DONE; a DONE job with `errorResult` is an error.
    async fn wait_for_job(&self, mut job: Job) -> Result<Job, BigQueryError> {
        let reference = job
            .job_reference
            .clone()
            .ok_or_else(|| BigQueryError::Parse("job without jobReference".into()))?;

        while !job.status.is_done() {
            debug!(job_id = %reference.job_id, state = %job.status.state, "Polling load job");
            tokio::time::sleep(self.poll_interval).await;
            job = self.get_job(&reference).await?;
        }

        if let Some(error) = &job.status.error_result {
            return Err(BigQueryError::JobFailed {
                job_id: reference.job_id,
                reason: error.reason.clone().unwrap_or_else(|| "unknown".into()),
                message: error.message.clone().unwrap_or_default(),
            });
        }

        Ok(job)
    }
}

#[async_trait]
impl WarehouseLoader for BigQueryClient {
    async fn load_table(
        &self,
        batch: &RecordBatch,
        destination: &str,
        disposition: WriteDisposition,
    ) -> Result<LoadSummary, BigQueryError> {
        let destination = TableId::parse(destination, &self.project)?;
        let payload = encode_parquet(batch, &[("silver.destination", destination.to_string())])?;

        let job = self.insert_load_job(payload, &destination, disposition).await?;
        let job = self.wait_for_job(job).await?;

        let job_id = job
            .job_reference
            .as_ref()
            .map(|r| r.job_id.clone())
            .unwrap_or_default();

        Ok(LoadSummary {
            job_id,
            destination,
            output_rows: job.output_rows(),
        })
    }
}

async fn parse_job(response: reqwest::Response) -> Result<Job, BigQueryError> {
    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let body = response.text().await.unwrap_or_default();
        return Err(BigQueryError::Api { status, body });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| BigQueryError::Parse(format!("{e}: {text}")))
}

/// Build a `multipart/related` body: JSON job metadata, then the media.
pub(crate) fn multipart_related(boundary: &str, metadata: &[u8], media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
