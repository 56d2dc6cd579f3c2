//! Reference resolution for step input templates
//!
//! Step inputs may reference results of earlier steps through `{{path}}`
//! expressions wrapped in a `{"from": ...}` object. This module parses those
//! expressions and substitutes them against the accumulated result map.

pub mod path;
pub mod resolver;
pub mod template;

use thiserror::Error;

pub use path::{Segment, TemplatePath};
pub use resolver::{resolve_inputs, resolve_template_value};
pub use template::{TemplatePart, TemplateString};

/// Errors produced while resolving a template against a result map.
///
/// None of these are retried by the engine: each one points at a mismatch
/// between the pipeline spec and the actual shape of prior results.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("step '{step_id}' not found in previous results. Available steps: {available:?}")]
    UnknownStepReference {
        step_id: String,
        available: Vec<String>,
    },

    #[error("cannot access field '{field}' on null value in '{path}'")]
    NullDereference { field: String, path: String },

    #[error("cannot access field '{field}' on {actual} at '{path}'")]
    TypeMismatch {
        field: String,
        actual: &'static str,
        path: String,
    },

    #[error("field '{field}' not found at '{path}'. Available fields: {available:?}")]
    FieldNotFound {
        field: String,
        path: String,
        available: Vec<String>,
    },

    #[error("field '{field}' is not an array at '{path}', cannot apply [*]. Got {actual}")]
    NotAnArray {
        field: String,
        actual: &'static str,
        path: String,
    },

    #[error("cannot navigate into {actual} with segment '{segment}' at '{path}'")]
    InvalidNavigation {
        segment: String,
        actual: &'static str,
        path: String,
    },

    #[error("step reference '{step_id}[*]' cannot carry an array marker")]
    WildcardStepReference { step_id: String },

    #[error("empty template path")]
    EmptyPath,
}

/// Shape name used in error messages.
pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
