//! Pipeline orchestrator - drives one run from spec to terminal status
//!
//! Steps run strictly sequentially in declaration order: resolve inputs
//! against the accumulated result map, dispatch, store the result under the
//! step id, emit lifecycle events. Any step failure aborts the remaining
//! steps (fail-fast). The result map lives and dies with the run.

use crate::activity::ActivityExecutor;
use crate::core::{ExecutionStatus, PipelineSpec, RunState, StepSpec};
use crate::dispatch::{DispatchError, StepDispatcher};
use crate::events::{types, EventPublisher};
use crate::resolve::{resolve_inputs, ResolveError};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Why a single step failed.
#[derive(Debug, Error)]
pub enum StepError {
    /// Input template resolution failed. Never retried: the template does
    /// not match the shape of prior results.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Routing failed or the external call exhausted its retries.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A failed or cancelled pipeline run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("step '{step_id}' failed: {source}")]
    StepFailed {
        step_id: String,
        #[source]
        source: StepError,
    },

    #[error("pipeline run cancelled")]
    Cancelled,
}

/// Terminal result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub pipeline_id: String,
    pub status: ExecutionStatus,
    pub results: Map<String, Value>,
}

/// Orchestrates one pipeline run.
///
/// A runner drives a single run; create a fresh one per submission.
/// Concurrent runs are independent runner values that share only the
/// activity transport and the event publisher.
pub struct PipelineRunner<A> {
    dispatcher: StepDispatcher<A>,
    publisher: Arc<dyn EventPublisher>,
    cancelled: Arc<AtomicBool>,
}

impl<A: ActivityExecutor> PipelineRunner<A> {
    pub fn new(dispatcher: StepDispatcher<A>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            dispatcher,
            publisher,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that cancels the run at the next step boundary. An in-flight
    /// dispatch is bounded by its own per-call timeout.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// The activity executor behind the dispatcher.
    pub fn activities(&self) -> &A {
        self.dispatcher.activities()
    }

    /// Execute the pipeline.
    pub async fn run(&self, spec: &PipelineSpec) -> Result<PipelineRun, EngineError> {
        let mut state = RunState::new();
        state.start();

        info!(
            execution_id = %state.execution_id,
            pipeline = %spec.pipeline_id,
            steps = spec.steps.len(),
            "starting pipeline"
        );
        self.emit(
            types::EXECUTION_STARTED,
            serde_json::json!({
                "pipeline_id": spec.pipeline_id,
                "workspace_id": spec.workspace_id,
            }),
        )
        .await;

        let mut results: Map<String, Value> = Map::new();

        for step in &spec.steps {
            if self.cancelled.load(Ordering::SeqCst) {
                state.cancel();
                warn!(pipeline = %spec.pipeline_id, step = %step.id, "run cancelled before step");
                return Err(EngineError::Cancelled);
            }

            info!(step = %step.id, kind = %step.kind, "executing step");
            self.emit(
                types::STEP_STARTED,
                serde_json::json!({
                    "pipeline_id": spec.pipeline_id,
                    "step_id": step.id,
                }),
            )
            .await;

            match self.execute_step(step, &results).await {
                Ok(result) => {
                    self.emit(
                        types::STEP_COMPLETED,
                        serde_json::json!({
                            "pipeline_id": spec.pipeline_id,
                            "step_id": step.id,
                            "result": result,
                        }),
                    )
                    .await;
                    results.insert(step.id.clone(), result);
                }
                Err(step_error) => {
                    state.fail();
                    error!(step = %step.id, error = %step_error, "step failed, aborting run");
                    self.emit(
                        types::STEP_FAILED,
                        serde_json::json!({
                            "pipeline_id": spec.pipeline_id,
                            "step_id": step.id,
                            "error": step_error.to_string(),
                        }),
                    )
                    .await;
                    return Err(EngineError::StepFailed {
                        step_id: step.id.clone(),
                        source: step_error,
                    });
                }
            }
        }

        state.complete();
        self.emit(
            types::PIPELINE_COMPLETED,
            serde_json::json!({
                "pipeline_id": spec.pipeline_id,
                "workspace_id": spec.workspace_id,
                "results": results,
            }),
        )
        .await;
        info!(pipeline = %spec.pipeline_id, "pipeline completed");

        Ok(PipelineRun {
            pipeline_id: spec.pipeline_id.clone(),
            status: state.status,
            results,
        })
    }

    async fn execute_step(
        &self,
        step: &StepSpec,
        results: &Map<String, Value>,
    ) -> Result<Value, StepError> {
        let resolved = resolve_inputs(&step.inputs, results)?;
        Ok(self.dispatcher.dispatch(step, &resolved).await?)
    }

    /// Best-effort event emission: a publish failure is logged, never fatal.
    async fn emit(&self, event_type: &str, payload: Value) {
        let mut payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("payload".to_string(), other);
                map
            }
        };
        payload.insert(
            "timestamp".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );

        if let Err(publish_error) = self.publisher.publish(event_type, payload).await {
            warn!(event = event_type, error = %publish_error, "event publish failed, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityBinding, ActivityError};
    use crate::dispatch::ActivityRegistry;
    use crate::events::LogPublisher;
    use async_trait::async_trait;
    use serde_json::json;

    /// Activity that echoes its inputs back under an "echo" key.
    struct EchoActivity;

    #[async_trait]
    impl ActivityExecutor for EchoActivity {
        async fn invoke(
            &self,
            _binding: &ActivityBinding,
            inputs: &Map<String, Value>,
        ) -> Result<Value, ActivityError> {
            Ok(json!({"echo": inputs}))
        }
    }

    #[tokio::test]
    async fn test_execute_simple_pipeline() {
        let yaml = r#"
pipeline_id: "p1"
workspace_id: "w1"
steps:
  - id: "lookup"
    type: "function"
    method: "breach_db_lookup"
    inputs:
      email: "alice@example.com"
"#;
        let spec = PipelineSpec::from_yaml(yaml).unwrap();
        let dispatcher = StepDispatcher::new(ActivityRegistry::builtin(), EchoActivity);
        let runner = PipelineRunner::new(dispatcher, Arc::new(LogPublisher));

        let run = runner.run(&spec).await.unwrap();
        assert_eq!(run.status, ExecutionStatus::Completed);
        assert_eq!(run.results["lookup"], json!({"echo": {"email": "alice@example.com"}}));
    }

    #[tokio::test]
    async fn test_cancel_before_first_step() {
        let yaml = r#"
pipeline_id: "p1"
workspace_id: "w1"
steps:
  - id: "lookup"
    type: "function"
    method: "breach_db_lookup"
"#;
        let spec = PipelineSpec::from_yaml(yaml).unwrap();
        let dispatcher = StepDispatcher::new(ActivityRegistry::builtin(), EchoActivity);
        let runner = PipelineRunner::new(dispatcher, Arc::new(LogPublisher));

        runner.cancel_flag().store(true, Ordering::SeqCst);
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
