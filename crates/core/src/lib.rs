pub mod config;

pub use config::{AthenaConfig, BigQueryConfig, Config, ServerConfig};
