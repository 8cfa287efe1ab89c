//! In-memory result tables decoded from Athena's CSV output.
//!
//! Athena writes every result as CSV with a header row, all fields quoted
//! and NULL as an empty field. The CSV is read into string columns first,
//! then each column is narrowed to the tightest of `Int64`, `Float64` or
//! `Boolean` that every non-null value fits, and otherwise stays `Utf8`.

mod csv;
mod narrow;


use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::client::AthenaError;

/// A decoded query result: one Arrow [`RecordBatch`] holding every row.
#[derive(Debug, Clone)]
pub struct ResultTable {
    batch: RecordBatch,
}

impl ResultTable {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Decode Athena result CSV bytes.
    pub fn from_csv(data: &[u8]) -> Result<Self, AthenaError> {
        let strings = csv::read_string_batch(data)?;
        let batch = narrow::narrow_batch(&strings)?;
        Ok(Self { batch })
    }

    pub fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_count(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }
}
