//! Arrow batch to in-memory Parquet, the upload format for load jobs.
//!
//! Parquet keeps column types intact across the upload, so BigQuery derives
//! INTEGER/FLOAT/BOOLEAN/STRING columns from the Arrow schema directly.

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use tracing::debug;

use crate::client::BigQueryError;

/// Encode `batch` as a ZSTD-compressed Parquet file.
///
/// `metadata` pairs land in the file footer as key-value metadata.
pub fn encode_parquet(
    batch: &RecordBatch,
    metadata: &[(&str, String)],
) -> Result<Vec<u8>, BigQueryError> {
    let key_values = metadata
        .iter()
        .map(|(k, v)| KeyValue::new(k.to_string(), Some(v.clone())))
        .collect();

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .set_key_value_metadata(Some(key_values))
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    debug!(rows = batch.num_rows(), bytes = buf.len(), "Encoded Parquet payload");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use bytes::Bytes;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use parquet::file::reader::{FileReader, SerializedFileReader};

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("company_id", DataType::Int64, true),
            Field::new("askflowname", DataType::Utf8, true),
            Field::new("total_brl_90_days", DataType::Float64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![Some(1044), Some(2010), None])),
                Arc::new(StringArray::from(vec![Some("Hotel A"), None, Some("Pousada B")])),
                Arc::new(Float64Array::from(vec![Some(5400.5), Some(200.25), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn preserves_rows_types_and_nulls() {
        let batch = sample_batch();
        let encoded = encode_parquet(&batch, &[]).unwrap();

        // Parquet magic bytes at both ends.
        assert_eq!(&encoded[..4], b"PAR1");
        assert_eq!(&encoded[encoded.len() - 4..], b"PAR1");

        let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(encoded))
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>().unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 3);

        let read = &batches[0];
        assert_eq!(read.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(read.schema().field(1).data_type(), &DataType::Utf8);
        assert_eq!(read.schema().field(2).data_type(), &DataType::Float64);
        assert!(read.column(0).is_null(2));
        assert!(read.column(1).is_null(1));
    }

    #[test]
    fn writes_footer_metadata() {
        let encoded = encode_parquet(
            &sample_batch(),
            &[("silver.query_id", "q-123".to_string())],
        )
        .unwrap();

        let reader = SerializedFileReader::new(Bytes::from(encoded)).unwrap();
        let kv = reader
            .metadata()
            .file_metadata()
            .key_value_metadata()
            .cloned()
            .unwrap_or_default();
        assert!(kv
            .iter()
            .any(|e| e.key == "silver.query_id" && e.value.as_deref() == Some("q-123")));
    }

    #[test]
    fn empty_batch_is_valid_parquet() {
        let batch = RecordBatch::new_empty(sample_batch().schema());
        let encoded = encode_parquet(&batch, &[]).unwrap();

        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(encoded)).unwrap();
        assert_eq!(builder.metadata().file_metadata().num_rows(), 0);
        assert_eq!(builder.schema().fields().len(), 3);
    }
}
