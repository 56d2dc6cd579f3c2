//! Template path grammar
//!
//! A path is a dot-separated segment list: `step_id.field.items[*].text`.
//! The `[*]` suffix marks the field as an array boundary; any segment that
//! follows is mapped over the array's elements. The wildcard is parsed once
//! into a structural flag so navigation never re-inspects the raw string.

use crate::resolve::ResolveError;

/// One parsed segment of a template path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Field name, without any wildcard suffix
    pub name: String,

    /// Whether the segment carried a `[*]` array marker
    pub wildcard: bool,
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, ResolveError> {
        let (name, wildcard) = match raw.strip_suffix("[*]") {
            Some(name) => (name, true),
            None => (raw, false),
        };
        if name.is_empty() {
            return Err(ResolveError::EmptyPath);
        }
        Ok(Segment {
            name: name.to_string(),
            wildcard,
        })
    }
}

/// A fully parsed template path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePath {
    raw: String,
    segments: Vec<Segment>,
}

impl TemplatePath {
    /// Parse a path like `twitter.recent_posts[*].text`.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::EmptyPath);
        }

        let segments = trimmed
            .split('.')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        // The first segment names a step, and step results are objects, not
        // arrays. A marker there would otherwise be silently dropped.
        if segments[0].wildcard {
            return Err(ResolveError::WildcardStepReference {
                step_id: segments[0].name.clone(),
            });
        }

        Ok(TemplatePath {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// The step id the path starts from.
    pub fn step_id(&self) -> &str {
        &self.segments[0].name
    }

    /// Segments after the step id.
    pub fn tail(&self) -> &[Segment] {
        &self.segments[1..]
    }

    /// The original path text, for diagnostics.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
