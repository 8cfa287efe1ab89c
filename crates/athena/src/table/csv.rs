//! CSV bytes to an all-`Utf8` record batch.

use std::io::Cursor;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::client::AthenaError;

const BATCH_SIZE: usize = 8192;

/// Read the header for column names, then every record as nullable strings.
/// Empty fields become NULL.
pub(crate) fn read_string_batch(data: &[u8]) -> Result<RecordBatch, AthenaError> {
    let format = Format::default().with_header(true);
    let (header, _) = format.infer_schema(Cursor::new(data), Some(0))?;

    if header.fields().is_empty() {
        return Err(AthenaError::Decode("result file has no header row".into()));
    }

    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(Cursor::new(data))?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}
