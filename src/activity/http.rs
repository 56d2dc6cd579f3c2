//! HTTP activity client
//!
//! Posts the resolved input mapping as JSON to the activity's route on the
//! stub service. The per-binding timeout bounds each attempt; retries are the
//! dispatcher's concern.

use crate::activity::{ActivityBinding, ActivityError, ActivityExecutor};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

/// Activity client for the consolidated crawler/ML/function stub service.
#[derive(Debug, Clone)]
pub struct StubServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl StubServiceClient {
    /// Create a client against a base URL such as `http://localhost:18086`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ActivityExecutor for StubServiceClient {
    async fn invoke(
        &self,
        binding: &ActivityBinding,
        inputs: &Map<String, Value>,
    ) -> Result<Value, ActivityError> {
        let url = format!("{}{}", self.base_url, binding.route);
        debug!(activity = binding.name, %url, "invoking activity");

        let response = self
            .http
            .post(&url)
            .json(inputs)
            .timeout(binding.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ActivityError::Timeout {
                        activity: binding.name.to_string(),
                        timeout: binding.timeout,
                    }
                } else {
                    ActivityError::Transport {
                        activity: binding.name.to_string(),
                        reason: err.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ActivityError::Status {
                activity: binding.name.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|err| ActivityError::Transport {
            activity: binding.name.to_string(),
            reason: format!("invalid JSON response: {err}"),
        })
    }
}
