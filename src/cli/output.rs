//! CLI output formatting

use crate::events::{types, EventPublisher, PublishError};
use async_trait::async_trait;
use console::Emoji;
use serde_json::{Map, Value};

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Publisher that renders lifecycle events to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ConsolePublisher;

#[async_trait]
impl EventPublisher for ConsolePublisher {
    async fn publish(
        &self,
        event_type: &str,
        payload: Map<String, Value>,
    ) -> Result<(), PublishError> {
        println!("{}", format_event(event_type, &payload));
        Ok(())
    }
}

/// One human-readable line per lifecycle event.
pub fn format_event(event_type: &str, payload: &Map<String, Value>) -> String {
    let field = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string()
    };

    match event_type {
        types::EXECUTION_STARTED => format!(
            "{} Starting pipeline {} (workspace {})",
            ROCKET,
            style(field("pipeline_id")).bold(),
            style(field("workspace_id")).dim()
        ),
        types::STEP_STARTED => format!("  {} Step {}", INFO, style(field("step_id")).cyan()),
        types::STEP_COMPLETED => format!("  {} Step {}", CHECK, style(field("step_id")).green()),
        types::STEP_FAILED => format!(
            "  {} Step {}: {}",
            CROSS,
            style(field("step_id")).red(),
            field("error")
        ),
        types::PIPELINE_COMPLETED => format!(
            "{} Pipeline {} completed",
            CHECK,
            style(field("pipeline_id")).bold()
        ),
        other => format!("  {} {}", INFO, other),
    }
}
