mod health;
mod pipeline;

pub use health::{health, HealthResponse};
pub use pipeline::{run_pipeline, FAILURE_PREFIX, SUCCESS_MESSAGE};
