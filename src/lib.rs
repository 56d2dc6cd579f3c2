//! dossier - a declarative investigation pipeline engine

pub mod activity;
pub mod cli;
pub mod core;
pub mod dispatch;
pub mod events;
pub mod execution;
pub mod resolve;

// Re-export commonly used types
pub use activity::{ActivityBinding, ActivityError, ActivityExecutor, StubServiceClient};
pub use core::{ExecutionStatus, PipelineSpec, RetryConfig, RunState, StepSpec, StepType};
pub use dispatch::{ActivityRegistry, DispatchError, RetryPolicy, StepDispatcher};
pub use events::{EventPublisher, LogPublisher, PublishError};
pub use execution::{EngineError, PipelineRun, PipelineRunner, StepError};
pub use resolve::{resolve_inputs, resolve_template_value, ResolveError};
