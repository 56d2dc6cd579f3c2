//! Parsed form of a template string
//!
//! A string like `"report for {{twitter.username}}"` is scanned once into an
//! ordered list of literal and reference parts. The distinction between a
//! string that *is* a single reference (resolved to the native value) and a
//! string that merely *contains* references (resolved by substitution) is a
//! structural property of the parsed parts, not a string comparison.

use crate::resolve::{ResolveError, TemplatePath};
use regex::Regex;
use std::sync::OnceLock;

/// Matches one `{{path}}` occurrence. Braces cannot nest.
fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\{\{([^{}]+?)\}\}").expect("valid template regex"))
}

/// One part of a scanned template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text, passed through verbatim
    Literal(String),

    /// A `{{path}}` reference to a prior step's result
    Reference(TemplatePath),
}

/// An ordered sequence of literal and reference parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateString {
    parts: Vec<TemplatePart>,
}

impl TemplateString {
    /// Scan a string left to right for `{{path}}` markers.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let mut parts = Vec::new();
        let mut cursor = 0;

        for captures in marker_regex().captures_iter(input) {
            let whole = captures.get(0).expect("match always has a group 0");
            if whole.start() > cursor {
                parts.push(TemplatePart::Literal(input[cursor..whole.start()].to_string()));
            }
            let path = TemplatePath::parse(&captures[1])?;
            parts.push(TemplatePart::Reference(path));
            cursor = whole.end();
        }

        if cursor < input.len() {
            parts.push(TemplatePart::Literal(input[cursor..].to_string()));
        }

        Ok(TemplateString { parts })
    }

    /// Whether the string contains any reference at all.
    pub fn has_references(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, TemplatePart::Reference(_)))
    }

    /// If the whole string is exactly one reference with no surrounding
    /// literal text, return its path. This is the case that resolves to the
    /// referenced value in its native type.
    pub fn as_sole_reference(&self) -> Option<&TemplatePath> {
        match self.parts.as_slice() {
            [TemplatePart::Reference(path)] => Some(path),
            _ => None,
        }
    }

    /// The scanned parts in order.
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }
}
