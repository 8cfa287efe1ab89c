use std::fmt;

use serde::Serialize;

use silver_athena::{QueryRequest, QueryState};

/// One pipeline step: a query, where it runs, and the table it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryJob {
    /// Short name used in logs.
    pub name: String,
    pub sql: String,
    /// Athena database the query runs in.
    pub database: String,
    /// S3 prefix Athena writes the result under.
    pub output_location: String,
    /// BigQuery table, `project.dataset.table`.
    pub destination: String,
}

impl QueryJob {
    pub fn new(
        name: impl Into<String>,
        sql: impl Into<String>,
        database: impl Into<String>,
        output_location: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            database: database.into(),
            output_location: output_location.into(),
            destination: destination.into(),
        }
    }

    pub fn request(&self) -> QueryRequest {
        QueryRequest {
            sql: self.sql.clone(),
            database: self.database.clone(),
            output_location: self.output_location.clone(),
        }
    }
}

/// Where a job is in its submit-poll-fetch-load cycle.
///
/// `Done`, `Failed` and `Cancelled` are terminal; nothing leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    Submitted,
    Polling,
    Succeeded,
    Fetching,
    Loading,
    Done,
    Failed,
    Cancelled,
}

impl JobStage {
    /// The stage a terminal query state leads to.
    pub fn after_query(state: QueryState) -> Self {
        match state {
            QueryState::Succeeded => Self::Succeeded,
            QueryState::Cancelled => Self::Cancelled,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Polling => "POLLING",
            Self::Succeeded => "SUCCEEDED",
            Self::Fetching => "FETCHING",
            Self::Loading => "LOADING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_query_fields() {
        let job = QueryJob::new("q", "SELECT 1", "datalake", "s3://b/p/", "p.d.t");
        let request = job.request();
        assert_eq!(request.sql, "SELECT 1");
        assert_eq!(request.database, "datalake");
        assert_eq!(request.output_location, "s3://b/p/");
    }

    #[test]
    fn stage_after_query() {
        assert_eq!(JobStage::after_query(QueryState::Succeeded), JobStage::Succeeded);
        assert_eq!(JobStage::after_query(QueryState::Failed), JobStage::Failed);
        assert_eq!(JobStage::after_query(QueryState::Cancelled), JobStage::Cancelled);
        assert!(JobStage::Failed.is_terminal());
        assert!(JobStage::Done.is_terminal());
        assert!(!JobStage::Succeeded.is_terminal());
        assert_eq!(JobStage::Loading.to_string(), "LOADING");
    }
}
