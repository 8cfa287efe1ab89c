use serde::Serialize;

use silver_athena::AthenaError;
use silver_bigquery::BigQueryError;

/// Coarse failure class, as exposed to callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Submission failed, the query ended FAILED/CANCELLED, or polling gave up.
    QueryExecution,
    /// Athena reported no usable S3 location.
    OutputLocation,
    /// The result object could not be fetched or decoded.
    Retrieval,
    /// The BigQuery load was rejected or failed.
    Load,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("query for {destination} failed: {error}")]
    Query {
        destination: String,
        error: AthenaError,
    },

    #[error("fetching result for {destination} failed: {error}")]
    Retrieval {
        destination: String,
        error: AthenaError,
    },

    #[error("loading {destination} failed: {error}")]
    Load {
        destination: String,
        error: BigQueryError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Query { .. } => ErrorKind::QueryExecution,
            Self::Retrieval { error, .. } => match error {
                AthenaError::MissingOutputLocation { .. } | AthenaError::InvalidOutputLocation(_) => {
                    ErrorKind::OutputLocation
                }
                _ => ErrorKind::Retrieval,
            },
            Self::Load { .. } => ErrorKind::Load,
        }
    }

    /// Destination table of the job that failed.
    pub fn destination(&self) -> &str {
        match self {
            Self::Query { destination, .. }
            | Self::Retrieval { destination, .. }
            | Self::Load { destination, .. } => destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = PipelineError::Retrieval {
            destination: "p.d.t".into(),
            error: AthenaError::InvalidOutputLocation("bucket/key".into()),
        };
        assert_eq!(err.kind(), ErrorKind::OutputLocation);

        let err = PipelineError::Retrieval {
            destination: "p.d.t".into(),
            error: AthenaError::ObjectStore("NoSuchKey".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Retrieval);

        let err = PipelineError::Load {
            destination: "p.d.t".into(),
            error: BigQueryError::Auth("no token".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Load);
        assert_eq!(err.destination(), "p.d.t");
    }

    #[test]
    fn message_carries_inner_error() {
        let err = PipelineError::Query {
            destination: "asksuite-salesops.Silver.company_id_by_products".into(),
            error: AthenaError::AwsSdk("AccessDeniedException".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("asksuite-salesops.Silver.company_id_by_products"));
        assert!(msg.contains("AccessDeniedException"));
    }
}
