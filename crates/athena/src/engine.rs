use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::AthenaError;
use crate::status::ExecutionInfo;

/// A query submission: SQL text, the database it runs in, and the S3
/// prefix the engine writes its result to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
    pub database: String,
    pub output_location: String,
}

/// Asynchronous SQL engine. [`AthenaClient`](crate::AthenaClient) in
/// production; in-memory fakes in tests.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a query and return its execution ID.
    async fn start_query(&self, request: &QueryRequest) -> Result<String, AthenaError>;

    /// Read the current status and result metadata of an execution.
    async fn query_execution(&self, query_id: &str) -> Result<ExecutionInfo, AthenaError>;

    /// Ask the engine to stop an execution.
    async fn cancel_query(&self, query_id: &str) -> Result<(), AthenaError>;
}
