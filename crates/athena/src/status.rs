use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an Athena query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    /// A state this build does not know about. Treated as still in flight.
    Unknown,
}

impl QueryState {
    /// `true` for SUCCEEDED, FAILED and CANCELLED. Polling stops here.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Error details Athena attaches to a failed execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The status block of a query execution, as reported by Athena.
///
/// `Display` renders the whole payload as JSON so that failure messages
/// carry everything Athena said about the execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStatus {
    pub state: QueryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_change_reason: Option<String>,
    #[serde(rename = "SubmissionDateTime", skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(rename = "CompletionDateTime", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "AthenaError", skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryErrorDetail>,
}

impl QueryStatus {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            state_change_reason: None,
            submitted_at: None,
            completed_at: None,
            error: None,
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Snapshot of one query execution: its status plus result metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionInfo {
    /// Athena query execution ID.
    pub query_id: String,
    pub status: QueryStatus,
    /// S3 URI Athena wrote the result CSV to, if reported.
    pub output_location: Option<String>,
    /// Total bytes scanned during execution.
    pub bytes_scanned: u64,
    /// Engine execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl ExecutionInfo {
    pub fn state(&self) -> QueryState {
        self.status.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn terminal_states() {
        assert!(QueryState::Succeeded.is_terminal());
        assert!(QueryState::Failed.is_terminal());
        assert!(QueryState::Cancelled.is_terminal());
        assert!(!QueryState::Queued.is_terminal());
        assert!(!QueryState::Running.is_terminal());
        assert!(!QueryState::Unknown.is_terminal());
    }

    #[test]
    fn status_display_is_full_payload() {
        let status = QueryStatus {
            state: QueryState::Failed,
            state_change_reason: Some("SYNTAX_ERROR: line 1:8: Column 'x' cannot be resolved".into()),
            submitted_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
            completed_at: None,
            error: Some(QueryErrorDetail {
                error_category: Some(2),
                error_message: Some("Column 'x' cannot be resolved".into()),
            }),
        };

        let rendered = status.to_string();
        assert!(rendered.contains(r#""State":"FAILED""#));
        assert!(rendered.contains("SYNTAX_ERROR"));
        assert!(rendered.contains(r#""SubmissionDateTime":"2025-03-01T12:00:00Z""#));
        assert!(rendered.contains(r#""ErrorCategory":2"#));
        assert!(!rendered.contains("CompletionDateTime"));
    }

    #[test]
    fn minimal_status_display() {
        let status = QueryStatus::new(QueryState::Cancelled);
        assert_eq!(status.to_string(), r#"{"State":"CANCELLED"}"#);
        assert_eq!(QueryState::Cancelled.to_string(), "CANCELLED");
    }
}
