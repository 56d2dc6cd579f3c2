//! Substitution of template references against the result map

use crate::resolve::{value_kind, ResolveError, Segment, TemplatePart, TemplatePath, TemplateString};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Resolve one step's input mapping against prior step results.
///
/// Only values wrapped in a `{"from": ...}` object take part in template
/// resolution; everything else passes through untouched. The opt-in keeps
/// literal strings from ever being mistaken for templates, and keys are
/// never scanned.
pub fn resolve_inputs(
    inputs: &Map<String, Value>,
    results: &Map<String, Value>,
) -> Result<Map<String, Value>, ResolveError> {
    let mut resolved = Map::new();

    for (key, value) in inputs {
        match reference_payload(value) {
            Some(template) => {
                let substituted = resolve_template_value(template, results)?;
                debug!(input = %key, "resolved templated input");
                resolved.insert(key.clone(), substituted);
            }
            None => {
                resolved.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(resolved)
}

/// The `from` payload of a reference object, if `value` is one.
fn reference_payload(value: &Value) -> Option<&Value> {
    value.as_object().and_then(|object| object.get("from"))
}

/// Resolve a template value of any shape.
///
/// Lists and maps recurse, preserving order, length and keys. Strings are
/// scanned for `{{path}}` markers: a string that is exactly one marker
/// resolves to the referenced value in its native type, while a string with
/// embedded or multiple markers resolves by textual substitution. Other
/// scalars pass through unchanged.
pub fn resolve_template_value(
    value: &Value,
    results: &Map<String, Value>,
) -> Result<Value, ResolveError> {
    match value {
        Value::Array(items) => {
            let resolved = items
                .iter()
                .map(|item| resolve_template_value(item, results))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(resolved))
        }
        Value::Object(entries) => {
            let mut resolved = Map::new();
            for (key, entry) in entries {
                resolved.insert(key.clone(), resolve_template_value(entry, results)?);
            }
            Ok(Value::Object(resolved))
        }
        Value::String(text) => resolve_template_string(text, results),
        _ => Ok(value.clone()),
    }
}

fn resolve_template_string(
    text: &str,
    results: &Map<String, Value>,
) -> Result<Value, ResolveError> {
    let template = TemplateString::parse(text)?;

    if !template.has_references() {
        return Ok(Value::String(text.to_string()));
    }

    // A string that is exactly one reference keeps the native value type.
    if let Some(path) = template.as_sole_reference() {
        return resolve_path(path, results);
    }

    // Embedded or multiple references: substitute left to right as text.
    let mut rendered = String::new();
    for part in template.parts() {
        match part {
            TemplatePart::Literal(literal) => rendered.push_str(literal),
            TemplatePart::Reference(path) => {
                let resolved = resolve_path(path, results)?;
                rendered.push_str(&render_text(&resolved));
            }
        }
    }
    Ok(Value::String(rendered))
}

/// Natural text form of a resolved value, for in-string substitution.
fn render_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        // Containers render as compact JSON
        other => other.to_string(),
    }
}

/// Resolve a parsed path: look up the step result, then navigate the
/// remaining segments left to right.
pub fn resolve_path(
    path: &TemplatePath,
    results: &Map<String, Value>,
) -> Result<Value, ResolveError> {
    let step_id = path.step_id();
    let Some(root) = results.get(step_id) else {
        return Err(ResolveError::UnknownStepReference {
            step_id: step_id.to_string(),
            available: results.keys().cloned().collect(),
        });
    };

    let mut current = root.clone();
    for segment in path.tail() {
        current = navigate_segment(current, segment, path)?;
    }

    Ok(current)
}

/// Apply one segment to the current value.
///
/// A wildcard segment asserts its field holds an array and returns the array
/// unchanged; distribution over the elements happens when the *next* plain
/// segment meets a list. A plain segment applied to a list maps the field
/// over every element, skipping elements that lack it.
fn navigate_segment(
    current: Value,
    segment: &Segment,
    path: &TemplatePath,
) -> Result<Value, ResolveError> {
    if segment.wildcard {
        let entries = match current {
            Value::Null => {
                return Err(ResolveError::NullDereference {
                    field: segment.name.clone(),
                    path: path.raw().to_string(),
                })
            }
            Value::Object(entries) => entries,
            other => {
                return Err(ResolveError::TypeMismatch {
                    field: segment.name.clone(),
                    actual: value_kind(&other),
                    path: path.raw().to_string(),
                })
            }
        };

        let Some(field_value) = entries.get(&segment.name) else {
            return Err(ResolveError::FieldNotFound {
                field: segment.name.clone(),
                path: path.raw().to_string(),
                available: entries.keys().cloned().collect(),
            });
        };

        return match field_value {
            Value::Array(_) => Ok(field_value.clone()),
            other => Err(ResolveError::NotAnArray {
                field: segment.name.clone(),
                actual: value_kind(other),
                path: path.raw().to_string(),
            }),
        };
    }

    match current {
        Value::Null => Err(ResolveError::NullDereference {
            field: segment.name.clone(),
            path: path.raw().to_string(),
        }),
        Value::Object(entries) => match entries.get(&segment.name) {
            Some(field_value) => Ok(field_value.clone()),
            None => Err(ResolveError::FieldNotFound {
                field: segment.name.clone(),
                path: path.raw().to_string(),
                available: entries.keys().cloned().collect(),
            }),
        },
        Value::Array(items) => {
            // A prior wildcard produced this list; map the field over it.
            let mut extracted = Vec::new();
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(mut entry) => match entry.remove(&segment.name) {
                        Some(field_value) => extracted.push(field_value),
                        None => {
                            warn!(
                                field = %segment.name,
                                index,
                                path = %path,
                                "field missing from array item, skipping"
                            );
                        }
                    },
                    other => {
                        return Err(ResolveError::InvalidNavigation {
                            segment: segment.name.clone(),
                            actual: value_kind(&other),
                            path: path.raw().to_string(),
                        })
                    }
                }
            }
            Ok(Value::Array(extracted))
        }
        other => Err(ResolveError::InvalidNavigation {
            segment: segment.name.clone(),
            actual: value_kind(&other),
            path: path.raw().to_string(),
        }),
    }
}
