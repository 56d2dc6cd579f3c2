//! Step dispatcher - runs one step's external call under its retry policy

use crate::activity::ActivityExecutor;
use crate::core::StepSpec;
use crate::dispatch::{ActivityRegistry, DispatchError, RetryPolicy, StepBinding};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Dispatches steps to their bound activities.
pub struct StepDispatcher<A> {
    registry: ActivityRegistry,
    activities: A,
    initial_interval: Duration,
    max_interval: Duration,
}

impl<A: ActivityExecutor> StepDispatcher<A> {
    pub fn new(registry: ActivityRegistry, activities: A) -> Self {
        Self {
            registry,
            activities,
            initial_interval: RetryPolicy::DEFAULT_INITIAL_INTERVAL,
            max_interval: RetryPolicy::DEFAULT_MAX_INTERVAL,
        }
    }

    /// Override the backoff intervals. Tests use this to keep retries fast.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max;
        self
    }

    /// The underlying activity executor.
    pub fn activities(&self) -> &A {
        &self.activities
    }

    /// Execute a step with already-resolved inputs and return the raw
    /// activity result.
    pub async fn dispatch(
        &self,
        step: &StepSpec,
        inputs: &Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        match self.registry.lookup(step)? {
            StepBinding::Placeholder(placeholder) => {
                debug!(step = %step.id, ?placeholder, "placeholder step, returning marker");
                Ok(placeholder.marker_result())
            }
            StepBinding::Activity(binding) => {
                let policy = RetryPolicy::for_step(step)
                    .with_intervals(self.initial_interval, self.max_interval);

                let mut attempt = 1;
                loop {
                    match self.activities.invoke(binding, inputs).await {
                        Ok(result) => {
                            info!(
                                step = %step.id,
                                activity = binding.name,
                                attempt,
                                "activity call succeeded"
                            );
                            return Ok(result);
                        }
                        Err(err) if attempt < policy.max_attempts => {
                            let backoff = policy.delay_before(attempt + 1);
                            warn!(
                                step = %step.id,
                                activity = binding.name,
                                attempt,
                                max_attempts = policy.max_attempts,
                                ?backoff,
                                error = %err,
                                "activity call failed, retrying"
                            );
                            tokio::time::sleep(backoff).await;
                            attempt += 1;
                        }
                        Err(err) => {
                            return Err(DispatchError::ExternalCall {
                                attempts: attempt,
                                source: err,
                            })
                        }
                    }
                }
            }
        }
    }
}
