use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;
use crate::pipeline::{GenerationSpec, Pipeline, ProgressReporter};
use crate::{EarshotError, Result};

#[derive(Debug, Clone, Default)]
pub struct SummarizeOptions {
    /// Model override; falls back to the library default
    pub model: Option<String>,

    /// Maximum summary length in characters
    pub max_length: Option<usize>,

    /// Language for the summary output (default English)
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeOutput {
    pub summary: String,
    pub word_count: usize,
}

fn build_prompt(language: &str, max_length: Option<usize>) -> String {
    let mut prompt = format!(
        "You are an expert meeting assistant. Listen to the attached audio, generate a concise \
         summary that covers the primary goals, decisions, action items, and any risks. Focus on \
         factual content. Respond only with the summary text in the {} language.",
        language
    );

    if let Some(max_length) = max_length {
        prompt.push_str(&format!(
            " Limit the summary to {} characters while preserving the most critical information.",
            max_length
        ));
    }

    prompt
}

/// Summarize an audio source
pub async fn summarize(
    pipeline: &Pipeline,
    source: &str,
    options: &SummarizeOptions,
    progress: &mut ProgressReporter,
) -> Result<SummarizeOutput> {
    if options.max_length == Some(0) {
        return Err(
            EarshotError::InvalidInput("max_length must be a positive number".into()).into(),
        );
    }

    let language = options.language.as_deref().unwrap_or("English");
    if language.trim().is_empty() {
        return Err(EarshotError::InvalidInput("language cannot be empty".into()).into());
    }

    let model = options
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let spec = GenerationSpec::plain(model, build_prompt(language, options.max_length));

    let summary = pipeline.run(source, &spec, progress).await?;

    let output = SummarizeOutput {
        word_count: summary.split_whitespace().count(),
        summary,
    };
    progress.report("Done", 1.0);

    Ok(output)
}
