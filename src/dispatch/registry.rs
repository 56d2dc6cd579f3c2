//! Activity routing registry
//!
//! Maps `(type, key)` to an activity binding. Crawler and function steps
//! route by exact `method` match; ml_model steps by the first containment
//! match of `model` against an ordered fragment list. The registry is built
//! at startup, so tests can register fake bindings without touching the
//! orchestrator.

use crate::activity::ActivityBinding;
use crate::core::{StepSpec, StepType};
use crate::dispatch::DispatchError;
use serde_json::{json, Value};
use std::time::Duration;

/// Where a step's work goes: a registered activity, or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepBinding<'a> {
    /// Bound external activity
    Activity(&'a ActivityBinding),

    /// Step kind that is not yet implemented; dispatch returns a marker
    Placeholder(Placeholder),
}

/// Step kinds with no real implementation behind them.
///
/// These are explicit in the type system so callers can detect and reject
/// reliance on them; their marker results carry no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Loop,
    Validation,
    Output,
    DataTransform,
}

impl Placeholder {
    /// The fixed marker result the placeholder resolves to.
    pub fn marker_result(&self) -> Value {
        match self {
            Placeholder::Loop => json!({
                "status": "skipped",
                "reason": "Loop not yet implemented",
            }),
            Placeholder::Validation => json!({"status": "passed"}),
            Placeholder::Output => json!({"status": "generated"}),
            Placeholder::DataTransform => json!({
                "status": "skipped",
                "reason": "Data transform not yet implemented",
            }),
        }
    }
}

/// Registry of activity bindings, keyed per step type.
#[derive(Debug, Clone, Default)]
pub struct ActivityRegistry {
    crawlers: Vec<(&'static str, ActivityBinding)>,
    models: Vec<(&'static str, ActivityBinding)>,
    functions: Vec<(&'static str, ActivityBinding)>,
}

impl ActivityRegistry {
    /// An empty registry. Mostly useful for tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// The production route table of the activity stub service.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register_crawler(
            "crawler_twitter_profile",
            ActivityBinding::new(
                "crawl_twitter",
                "/crawlers/twitter/profile",
                Duration::from_secs(30),
            ),
        );
        registry.register_crawler(
            "crawler_facebook_profile",
            ActivityBinding::new(
                "crawl_facebook",
                "/crawlers/facebook/profile",
                Duration::from_secs(30),
            ),
        );
        registry.register_crawler(
            "crawler_linkedin_profile",
            ActivityBinding::new(
                "crawl_linkedin",
                "/crawlers/linkedin/profile",
                Duration::from_secs(30),
            ),
        );

        // Order matters: first containment match on the model name wins.
        registry.register_model(
            "face_recognition",
            ActivityBinding::new(
                "run_face_recognition",
                "/ml/face_recognition",
                Duration::from_secs(60),
            ),
        );
        registry.register_model(
            "sentiment",
            ActivityBinding::new(
                "run_sentiment_analysis",
                "/ml/sentiment_analysis",
                Duration::from_secs(30),
            ),
        );
        registry.register_model(
            "ner",
            ActivityBinding::new("run_ner", "/ml/ner", Duration::from_secs(30)),
        );

        registry.register_function(
            "breach_db_lookup",
            ActivityBinding::new(
                "lookup_breach_db",
                "/breach/lookup",
                Duration::from_secs(20),
            ),
        );

        registry
    }

    /// Register a crawler method (exact match).
    pub fn register_crawler(&mut self, method: &'static str, binding: ActivityBinding) {
        self.crawlers.push((method, binding));
    }

    /// Register an ML model fragment (ordered containment match).
    pub fn register_model(&mut self, fragment: &'static str, binding: ActivityBinding) {
        self.models.push((fragment, binding));
    }

    /// Register a function method (exact match).
    pub fn register_function(&mut self, method: &'static str, binding: ActivityBinding) {
        self.functions.push((method, binding));
    }

    /// Route a step to its binding.
    pub fn lookup(&self, step: &StepSpec) -> Result<StepBinding<'_>, DispatchError> {
        match step.kind {
            StepType::Crawler => {
                let method = step.method.as_deref().unwrap_or_default();
                self.crawlers
                    .iter()
                    .find(|(key, _)| *key == method)
                    .map(|(_, binding)| StepBinding::Activity(binding))
                    .ok_or_else(|| DispatchError::UnknownStepKind {
                        kind: "crawler method",
                        value: method.to_string(),
                    })
            }
            StepType::MlModel => {
                let model = step.model.as_deref().unwrap_or_default();
                self.models
                    .iter()
                    .find(|(fragment, _)| model.contains(fragment))
                    .map(|(_, binding)| StepBinding::Activity(binding))
                    .ok_or_else(|| DispatchError::UnknownStepKind {
                        kind: "ML model",
                        value: model.to_string(),
                    })
            }
            StepType::Function => {
                let method = step.method.as_deref().unwrap_or_default();
                self.functions
                    .iter()
                    .find(|(key, _)| *key == method)
                    .map(|(_, binding)| StepBinding::Activity(binding))
                    .ok_or_else(|| DispatchError::UnknownStepKind {
                        kind: "function method",
                        value: method.to_string(),
                    })
            }
            StepType::Loop => Ok(StepBinding::Placeholder(Placeholder::Loop)),
            StepType::Validation => Ok(StepBinding::Placeholder(Placeholder::Validation)),
            StepType::Output => Ok(StepBinding::Placeholder(Placeholder::Output)),
            StepType::DataTransform => Ok(StepBinding::Placeholder(Placeholder::DataTransform)),
        }
    }
}
