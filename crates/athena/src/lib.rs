pub mod client;
pub mod engine;
pub mod location;
pub mod poll;
pub mod status;
pub mod store;
pub mod table;

pub use client::{load_sdk_config, AthenaClient, AthenaError};
pub use engine::{QueryEngine, QueryRequest};
pub use location::S3Location;
pub use poll::{ensure_succeeded, wait_for_completion, PollPolicy};
pub use status::{ExecutionInfo, QueryErrorDetail, QueryState, QueryStatus};
pub use store::{fetch_result_table, ResultStore, S3ResultStore};
pub use table::ResultTable;
