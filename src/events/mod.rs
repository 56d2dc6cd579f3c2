//! Lifecycle event publishing
//!
//! The engine reports progress through a `(event_type, payload)` side
//! channel. Delivery is best-effort: a failed publish is logged by the
//! engine and never aborts the run.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

/// Event type strings, matched by downstream consumers.
pub mod types {
    pub const EXECUTION_STARTED: &str = "pipeline.execution.started";
    pub const STEP_STARTED: &str = "pipeline.step.started";
    pub const STEP_COMPLETED: &str = "pipeline.step.completed";
    pub const STEP_FAILED: &str = "pipeline.step.failed";
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
}

/// Event delivery failed.
#[derive(Debug, Clone, Error)]
#[error("event delivery failed: {0}")]
pub struct PublishError(pub String);

/// Trait for publishing lifecycle events - allows for different channels.
///
/// Payloads always carry `pipeline_id` and, for step-scoped events,
/// `step_id`; the engine stamps a `timestamp` before handing the payload
/// over. Implementations must be safe to share across concurrent runs.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        event_type: &str,
        payload: Map<String, Value>,
    ) -> Result<(), PublishError>;
}

/// Publisher that writes events to the tracing log.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(
        &self,
        event_type: &str,
        payload: Map<String, Value>,
    ) -> Result<(), PublishError> {
        let payload = Value::Object(payload);
        info!(
            target: "dossier::events",
            event = event_type,
            payload = %payload,
            "pipeline event"
        );
        Ok(())
    }
}
