pub mod definitions;
pub mod error;
pub mod job;
pub mod runner;

pub use definitions::silver_jobs;
pub use error::{ErrorKind, PipelineError};
pub use job::{JobStage, QueryJob};
pub use runner::{JobReport, Pipeline, RunReport};
