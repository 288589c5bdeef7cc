//! Human-readable rendering of validation errors.

use crate::error::ValidationError;
use phial_definitions::Value;

/// Renders errors in a compact terminal format.
///
/// Produces output like:
/// ```text
/// error[reference]: The parameter 'db.host' does not exist (parameter: connection)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    /// Creates a new renderer.
    pub fn new() -> Self {
        Self
    }

    /// Renders a single error.
    pub fn render(&self, error: &ValidationError) -> String {
        let level = if error.is_warning() { "warning" } else { "error" };
        let mut out = format!("{level}[{}]: {}", error.kind, error.message);
        if !error.context.is_empty() {
            let context: Vec<String> = error
                .context
                .iter()
                .map(|(key, value)| format!("{key}: {}", render_value(value)))
                .collect();
            out.push_str(&format!(" ({})", context.join(", ")));
        }
        out
    }

    /// Renders a batch of errors, one per line.
    pub fn render_all(&self, errors: &[ValidationError]) -> String {
        errors
            .iter()
            .map(|error| self.render(error))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
