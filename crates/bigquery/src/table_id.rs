use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::BigQueryError;

/// Fully qualified BigQuery table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId {
    #[serde(rename = "projectId")]
    pub project: String,
    #[serde(rename = "datasetId")]
    pub dataset: String,
    #[serde(rename = "tableId")]
    pub table: String,
}

impl TableId {
    /// Parse `project.dataset.table`, or `dataset.table` qualified with
    /// `default_project`.
    pub fn parse(s: &str, default_project: &str) -> Result<Self, BigQueryError> {
        let invalid = || BigQueryError::InvalidTableId(s.to_string());

        let parts: Vec<&str> = s.split('.').collect();
        let (project, dataset, table) = match parts.as_slice() {
            [project, dataset, table] => (*project, *dataset, *table),
            [dataset, table] => (default_project, *dataset, *table),
            _ => return Err(invalid()),
        };

        if [project, dataset, table].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}
