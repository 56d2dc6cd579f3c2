//! Pipeline specification model
//!
//! Field names are the wire contract with the spec producer and must match
//! exactly: `pipeline_id`, `workspace_id`, `steps[]`, and per step `id`,
//! `type`, `method`, `model`, `inputs`, `retry_policy`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A pipeline specification. Immutable once execution starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline identifier
    pub pipeline_id: String,

    /// Workspace the pipeline belongs to
    pub workspace_id: String,

    /// Ordered steps, executed in declaration order
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// One step of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step identifier, unique within the pipeline
    pub id: String,

    /// What kind of work the step performs
    #[serde(rename = "type")]
    pub kind: StepType,

    /// Concrete method for crawler and function steps
    #[serde(default)]
    pub method: Option<String>,

    /// Model name for ml_model steps (matched by containment)
    #[serde(default)]
    pub model: Option<String>,

    /// Input template; values wrapped in `{"from": ...}` are resolved
    /// against prior step results
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Retry configuration for the external call
    #[serde(default)]
    pub retry_policy: Option<RetryConfig>,

    /// Declared dependencies. Accepted and validated, but execution is
    /// strictly sequential in declaration order for now.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Reserved error-policy slot. Parsed but not acted on: failure
    /// handling is always fail-fast.
    #[serde(default)]
    pub on_error: Option<String>,
}

/// Step kinds. `Loop`, `Validation`, `Output` and `DataTransform` are
/// placeholders that dispatch to marker results rather than real work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Crawler,
    MlModel,
    Function,
    Loop,
    Validation,
    Output,
    DataTransform,
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepType::Crawler => "crawler",
            StepType::MlModel => "ml_model",
            StepType::Function => "function",
            StepType::Loop => "loop",
            StepType::Validation => "validation",
            StepType::Output => "output",
            StepType::DataTransform => "data_transform",
        };
        f.write_str(name)
    }
}

/// Per-step retry configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first (default 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl StepSpec {
    /// Effective attempt budget for this step's external call.
    pub fn max_attempts(&self) -> u32 {
        self.retry_policy
            .map(|policy| policy.max_attempts)
            .unwrap_or_else(default_max_attempts)
    }
}

impl PipelineSpec {
    /// Load a pipeline specification from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a pipeline specification from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let spec: PipelineSpec = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the specification before execution.
    ///
    /// The engine itself does not check id uniqueness; a duplicate id would
    /// silently overwrite the earlier step's result, so it is rejected here.
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
        }

        let step_ids: std::collections::HashSet<_> = self.steps.iter().map(|s| &s.id).collect();
        for step in &self.steps {
            for dep in &step.depends_on {
                if !step_ids.contains(dep) {
                    anyhow::bail!(
                        "Step '{}' depends on non-existent step '{}'",
                        step.id,
                        dep
                    );
                }
            }

            match step.kind {
                StepType::Crawler | StepType::Function => {
                    if step.method.is_none() {
                        anyhow::bail!(
                            "Step '{}' has type '{}' but no method",
                            step.id,
                            step.kind
                        );
                    }
                }
                StepType::MlModel => {
                    if step.model.is_none() {
                        anyhow::bail!("Step '{}' has type 'ml_model' but no model", step.id);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}
