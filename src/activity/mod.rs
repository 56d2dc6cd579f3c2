//! External activity boundary
//!
//! Every dispatched step turns into one remote call: a single input mapping
//! in, a single JSON value out. The engine only assumes request/response
//! semantics with a timeout; the concrete transport lives behind
//! [`ActivityExecutor`] so tests can swap in fakes.

pub mod http;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

pub use http::StubServiceClient;

/// A concrete activity binding: where the call goes and how long it may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityBinding {
    /// Activity name, for logs and errors
    pub name: &'static str,

    /// Route under the activity service base URL
    pub route: &'static str,

    /// Per-call timeout
    pub timeout: Duration,
}

impl ActivityBinding {
    pub const fn new(name: &'static str, route: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            route,
            timeout,
        }
    }
}

/// Why an activity call failed. All variants are retryable.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("request to '{activity}' failed: {reason}")]
    Transport { activity: String, reason: String },

    #[error("'{activity}' returned status {status}: {body}")]
    Status {
        activity: String,
        status: u16,
        body: String,
    },

    #[error("'{activity}' timed out after {timeout:?}")]
    Timeout {
        activity: String,
        timeout: Duration,
    },
}

/// Trait for invoking external activities - allows for different transports.
#[async_trait]
pub trait ActivityExecutor: Send + Sync {
    /// Invoke the bound activity with resolved inputs.
    async fn invoke(
        &self,
        binding: &ActivityBinding,
        inputs: &Map<String, Value>,
    ) -> Result<Value, ActivityError>;
}
