//! Earshot - transcribe, summarize, and extract information from audio
//!
//! This library sends audio from local files or YouTube URLs to Google's
//! Gemini models and returns plain or structured text results. Remote audio
//! is fetched with yt-dlp, uploaded through the Gemini Files API, and
//! processed with configurable prompts and response schemas.

pub mod cli;
pub mod config;
pub mod gemini;
pub mod output;
pub mod pipeline;
pub mod schemas;
pub mod sources;
pub mod tasks;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use gemini::GeminiClient;
pub use pipeline::{Pipeline, ProcessingProgress, ProgressReporter};
pub use tasks::{
    extract, summarize, transcribe, ExtractOptions, ExtractOutput, SummarizeOptions,
    SummarizeOutput, TranscribeOptions, TranscriptionOutput,
};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to audio processing
#[derive(thiserror::Error, Debug)]
pub enum EarshotError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Audio download failed: {0}")]
    DownloadFailed(String),

    #[error("Audio upload failed: {0}")]
    UploadFailed(String),

    #[error("Model inference failed: {0}")]
    InferenceFailed(String),

    #[error("A Gemini API key is required. Set GOOGLE_API_KEY or GEMINI_API_KEY in your environment")]
    MissingApiKey,

    #[error("File operation failed: {0}")]
    FileError(String),

    #[error("Audio processing failed: {0}")]
    ProcessingFailed(String),
}
