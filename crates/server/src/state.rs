use std::sync::Arc;

use silver_pipeline::Pipeline;

/// Shared handler state. The pipeline holds no per-run data, so concurrent
/// requests each drive their own run through it.
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
