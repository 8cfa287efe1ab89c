pub mod auth;
pub mod client;
pub mod encode;
pub mod job;
pub mod table_id;

pub use auth::{MetadataServerToken, StaticToken, TokenProvider};
pub use client::{BigQueryClient, BigQueryError, LoadSummary, WarehouseLoader};
pub use encode::encode_parquet;
pub use job::WriteDisposition;
pub use table_id::TableId;
