//! Step dispatch: routing a step to its external activity
//!
//! A step's `type` plus `method`/`model` selects a binding from the
//! [`ActivityRegistry`]; the [`StepDispatcher`] then runs the bound call
//! under the step's retry policy. Placeholder step kinds short-circuit to
//! marker results without any external call.

pub mod dispatcher;
pub mod registry;
pub mod retry;

use crate::activity::ActivityError;
use thiserror::Error;

pub use dispatcher::StepDispatcher;
pub use registry::{ActivityRegistry, Placeholder, StepBinding};
pub use retry::RetryPolicy;

/// Errors surfaced by step dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The step spec names a method or model nothing is registered for.
    /// A specification error; never retried.
    #[error("unknown {kind}: {value}")]
    UnknownStepKind { kind: &'static str, value: String },

    /// The external call failed after all retry attempts.
    #[error("activity call failed after {attempts} attempt(s): {source}")]
    ExternalCall {
        attempts: u32,
        #[source]
        source: ActivityError,
    },
}
