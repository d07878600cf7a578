//! CLI Output Formatting.
//!
//! Renders [`CommandOutput`] either as styled text or as JSON.

use console::style;
use serde::{Deserialize, Serialize};

use super::CommandOutput;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Single-line JSON
    Json,
    /// Indented JSON
    JsonPretty,
}

impl OutputFormat {
    /// Whether this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-pretty" | "pretty" => Ok(Self::JsonPretty),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
        };
        f.write_str(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMATTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Output formatter for CLI
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create new formatter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Get format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render a command result as the lines to print
    pub fn render(&self, output: &CommandOutput) -> String {
        if self.format.is_json() {
            let json = serde_json::json!({
                "status": if output.success { "success" } else { "error" },
                "message": output.message,
                "data": output.data,
                "warnings": output.warnings,
            });
            return self.json(&json);
        }

        let mut lines = Vec::new();
        let marker = if output.success {
            style("✓").green()
        } else {
            style("✗").red()
        };
        lines.push(format!("{} {}", marker, output.message));

        if let Some(data) = &output.data {
            render_text(data, 1, &mut lines);
        }
        for warning in &output.warnings {
            lines.push(format!("{} {}", style("⚠").yellow(), warning));
        }
        lines.join("\n")
    }

    /// Render an error message
    pub fn render_error(&self, message: &str) -> String {
        if self.format.is_json() {
            return self.json(&serde_json::json!({ "status": "error", "message": message }));
        }
        format!("{} {}", style("Error:").red().bold(), message)
    }

    fn json(&self, value: &serde_json::Value) -> String {
        let rendered = match self.format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(value),
            _ => serde_json::to_string(value),
        };
        rendered.unwrap_or_else(|_| value.to_string())
    }
}

fn render_text(value: &serde_json::Value, indent: usize, lines: &mut Vec<String>) {
    let prefix = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                match value {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        lines.push(format!("{}{}:", prefix, style(key).bold()));
                        render_text(value, indent + 1, lines);
                    }
                    _ => lines.push(format!("{}{}: {}", prefix, style(key).bold(), format_value(value))),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                lines.push(format!("{}[{}]", prefix, i));
                render_text(item, indent + 1, lines);
            }
        }
        _ => lines.push(format!("{}{}", prefix, format_value(value))),
    }
}

/// Format a JSON scalar for text output
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".into(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
