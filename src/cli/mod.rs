use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "earshot",
    about = "Earshot - Transcribe, summarize, and extract information from audio with Google Gemini",
    version,
    long_about = "A CLI tool for processing audio with Google's Gemini models. Accepts local \
audio files and YouTube URLs, and returns transcripts, summaries, or custom extractions as \
plain text or JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Gemini model to use (overrides the configured default)
    #[arg(short, long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print the full result object instead of just the text
    #[arg(long, global = true)]
    pub raw: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe audio from a file or YouTube URL
    Transcribe {
        /// Path to an audio file or YouTube URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Remove disfluencies and filler words from the transcript
        #[arg(long)]
        clean: bool,
    },

    /// Summarize audio from a file or YouTube URL
    Summarize {
        /// Path to an audio file or YouTube URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Maximum length of the summary in characters
        #[arg(long, value_name = "CHARS")]
        max_length: Option<usize>,

        /// Language for the summary (overrides the configured default)
        #[arg(long, value_name = "LANG")]
        language: Option<String>,
    },

    /// Extract information from audio with a custom prompt
    Extract {
        /// Path to an audio file or YouTube URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Custom prompt specifying what information to extract
        #[arg(short, long)]
        prompt: String,

        /// Return structured JSON data when possible
        #[arg(long)]
        structured: bool,

        /// Steer structured output with a named response schema (implies --structured)
        #[arg(long, value_name = "NAME")]
        schema: Option<String>,
    },

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported audio sources and response schemas
    Sources,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_transcribe() {
        let cli = Cli::try_parse_from(["earshot", "transcribe", "audio.mp3", "--clean"]).unwrap();
        match cli.command {
            Commands::Transcribe { source, clean } => {
                assert_eq!(source, "audio.mp3");
                assert!(clean);
            }
            _ => panic!("expected transcribe"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "earshot",
            "summarize",
            "audio.mp3",
            "--max-length",
            "200",
            "--format",
            "json",
            "--raw",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.raw);
        match cli.command {
            Commands::Summarize { max_length, .. } => assert_eq!(max_length, Some(200)),
            _ => panic!("expected summarize"),
        }
    }

    #[test]
    fn test_cli_extract_requires_prompt() {
        assert!(Cli::try_parse_from(["earshot", "extract", "audio.mp3"]).is_err());
    }
}
