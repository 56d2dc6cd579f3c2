//! Pipeline execution engine

pub mod engine;

pub use engine::{EngineError, PipelineRun, PipelineRunner, StepError};
