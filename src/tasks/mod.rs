//! The three audio operations: transcription, summarization, and extraction.
//!
//! Each operation validates its inputs, builds a prompt and generation
//! settings, runs the shared pipeline, and shapes the generated text into a
//! typed output.

pub mod extract;
pub mod summarize;
pub mod transcribe;

pub use extract::{extract, ExtractOptions, ExtractOutput};
pub use summarize::{summarize, SummarizeOptions, SummarizeOutput};
pub use transcribe::{transcribe, TranscribeOptions, TranscriptionOutput};
