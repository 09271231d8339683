use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;
use crate::pipeline::{GenerationSpec, Pipeline, ProgressReporter};
use crate::schemas::KnownSchema;
use crate::{EarshotError, Result};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Model override; falls back to the library default
    pub model: Option<String>,

    /// Request JSON output and parse it into `structured_data`
    pub structured: bool,

    /// Steer structured output toward a named response shape
    pub schema: Option<KnownSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOutput {
    pub extraction: String,

    /// Parsed JSON, when structured output was requested and parseable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
}

fn build_prompt(prompt: &str, structured: bool) -> String {
    if structured {
        format!(
            "{} Please format your response as structured data that can be parsed as JSON.",
            prompt
        )
    } else {
        prompt.to_string()
    }
}

fn parse_structured(raw_text: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(raw_text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to parse structured extraction output as JSON: {}", e);
            None
        }
    }
}

/// Extract caller-specified information from an audio source
pub async fn extract(
    pipeline: &Pipeline,
    source: &str,
    prompt: &str,
    options: &ExtractOptions,
    progress: &mut ProgressReporter,
) -> Result<ExtractOutput> {
    if prompt.trim().is_empty() {
        return Err(EarshotError::InvalidInput("prompt cannot be empty".into()).into());
    }

    // A named schema implies structured output
    let structured = options.structured || options.schema.is_some();

    let model = options
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let spec = GenerationSpec {
        model,
        prompt: build_prompt(prompt, structured),
        response_mime_type: structured.then(|| "application/json".to_string()),
        response_schema: options.schema.map(|schema| schema.response_schema()),
    };

    let extraction = pipeline.run(source, &spec, progress).await?;

    let output = ExtractOutput {
        structured_data: if structured {
            parse_structured(&extraction)
        } else {
            None
        },
        extraction,
    };
    progress.report("Done", 1.0);

    Ok(output)
}
