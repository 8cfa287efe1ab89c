use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;
use tracing::debug;

use crate::client::AthenaError;
use crate::location::S3Location;
use crate::status::ExecutionInfo;
use crate::table::ResultTable;

/// Object storage holding query results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Fetch the whole object at `location`.
    async fn get_object(&self, location: &S3Location) -> Result<Bytes, AthenaError>;
}

/// [`ResultStore`] backed by Amazon S3.
pub struct S3ResultStore {
    client: aws_sdk_s3::Client,
}

impl S3ResultStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ResultStore for S3ResultStore {
    async fn get_object(&self, location: &S3Location) -> Result<Bytes, AthenaError> {
        let resp = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| {
                AthenaError::ObjectStore(format!("{location}: {}", DisplayErrorContext(&e)))
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| AthenaError::ObjectStore(format!("{location}: {e}")))?
            .into_bytes();

        debug!(location = %location, bytes = body.len(), "Fetched result object");
        Ok(body)
    }
}

/// Fetch and decode the result of a succeeded execution.
///
/// The location comes from the execution itself, not from the request:
/// Athena appends `<query_id>.csv` to the configured prefix. A malformed
/// location fails before any fetch is attempted.
pub async fn fetch_result_table(
    store: &dyn ResultStore,
    execution: &ExecutionInfo,
) -> Result<ResultTable, AthenaError> {
    let raw = execution
        .output_location
        .as_deref()
        .ok_or_else(|| AthenaError::MissingOutputLocation {
            query_id: execution.query_id.clone(),
        })?;
    let location: S3Location = raw.parse()?;

    let data = store.get_object(&location).await?;
    ResultTable::from_csv(&data)
}
