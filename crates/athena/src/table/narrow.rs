//! Per-column type narrowing for string batches.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::client::AthenaError;

/// Candidate types, tightest first.
const NARROWING_ORDER: [DataType; 3] = [DataType::Int64, DataType::Float64, DataType::Boolean];

pub(crate) fn narrow_batch(batch: &RecordBatch) -> Result<RecordBatch, AthenaError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let strings = column
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                AthenaError::Decode(format!("column {} is not a string column", field.name()))
            })?;

        let narrowed = narrow_column(blank_to_null(strings));
        fields.push(Field::new(field.name(), narrowed.data_type().clone(), true));
        columns.push(narrowed);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Athena cannot tell an empty string from NULL in CSV; both are NULL here.
fn blank_to_null(strings: &StringArray) -> StringArray {
    strings
        .iter()
        .map(|v| v.filter(|s| !s.is_empty()))
        .collect()
}

/// Pick the first type in [`NARROWING_ORDER`] every non-null value casts to.
/// Columns with no values at all stay `Utf8`.
fn narrow_column(strings: StringArray) -> ArrayRef {
    if strings.null_count() == strings.len() {
        return Arc::new(strings);
    }

    let literal_booleans = all_boolean_literals(&strings);
    let array: ArrayRef = Arc::new(strings);
    let strict = CastOptions {
        safe: false,
        ..Default::default()
    };

    NARROWING_ORDER
        .iter()
        .filter(|target| **target != DataType::Boolean || literal_booleans)
        .find_map(|target| cast_with_options(&array, target, &strict).ok())
        .unwrap_or(array)
}

/// Arrow's string cast also takes `y`, `no`, `on`, `t` and friends; only
/// `true`/`false` in any case count as booleans here.
fn all_boolean_literals(strings: &StringArray) -> bool {
    strings
        .iter()
        .flatten()
        .all(|s| s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false"))
}
