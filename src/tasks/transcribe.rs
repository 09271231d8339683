use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;
use crate::pipeline::{GenerationSpec, Pipeline, ProgressReporter};
use crate::Result;

const VERBATIM_PROMPT: &str = "You are a meticulous transcription engine. Listen to the audio \
     and provide a verbatim transcript with accurate punctuation and speaker cues when available.";

const CLEAN_PROMPT: &str = "You are a world-class transcription engine. Listen to the audio and \
     return a polished transcript without disfluencies (um, uh, etc.), filler words, or repeated \
     fragments. Preserve speaker meaning and punctuation where possible.";

#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    /// Model override; falls back to the library default
    pub model: Option<String>,

    /// Remove disfluencies and filler words instead of transcribing verbatim
    pub clean: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    pub transcription: String,

    /// Confidence score, when the model reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Audio duration in seconds, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

fn build_prompt(clean: bool) -> &'static str {
    if clean {
        CLEAN_PROMPT
    } else {
        VERBATIM_PROMPT
    }
}

/// Transcribe an audio source
pub async fn transcribe(
    pipeline: &Pipeline,
    source: &str,
    options: &TranscribeOptions,
    progress: &mut ProgressReporter,
) -> Result<TranscriptionOutput> {
    let model = options
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let spec = GenerationSpec::plain(model, build_prompt(options.clean));

    let transcription = pipeline.run(source, &spec, progress).await?;

    let output = TranscriptionOutput {
        transcription,
        confidence: None,
        duration_seconds: None,
    };
    progress.report("Done", 1.0);

    Ok(output)
}
