use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::Result;

/// Render a task result for display.
///
/// `plain_text` is the primary text of the result (transcript, summary, or
/// extraction); `raw` switches to the full result object.
pub fn render<T: Serialize>(
    result: &T,
    plain_text: &str,
    format: &OutputFormat,
    raw: bool,
) -> Result<String> {
    match format {
        OutputFormat::Text => {
            if raw {
                let value = serde_json::to_value(result)?;
                Ok(format_key_values(&value))
            } else {
                Ok(plain_text.to_string())
            }
        }
        OutputFormat::Json => {
            if raw {
                Ok(serde_json::to_string_pretty(result)?)
            } else {
                Ok(serde_json::to_string(&serde_json::json!({ "result": plain_text }))?)
            }
        }
    }
}

fn format_key_values(value: &serde_json::Value) -> String {
    match value.as_object() {
        Some(map) => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, display_value(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        None => value.to_string(),
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// Save rendered output to a file
pub fn save_to_file(content: &str, path: &Path) -> Result<()> {
    fs_err::write(path, content)?;
    Ok(())
}
