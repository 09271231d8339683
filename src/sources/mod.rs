use std::path::{Path, PathBuf};
use url::Url;

use crate::{EarshotError, Result};

pub mod local;
pub mod youtube;

/// Audio file extensions accepted as direct input
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    M4a,
    Ogg,
    Flac,
    Aac,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::Aac => "aac",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "m4a" => Some(AudioFormat::M4a),
            "ogg" => Some(AudioFormat::Ogg),
            "flac" => Some(AudioFormat::Flac),
            "aac" => Some(AudioFormat::Aac),
            _ => None,
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::M4a | AudioFormat::Aac => "audio/mp4",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Flac => "audio/flac",
        }
    }
}

/// A classified audio input: either a file on disk or a YouTube URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    LocalFile(PathBuf),
    YouTube(String),
}

/// Classify an input string as a local audio file or a YouTube URL.
///
/// Anything that is neither a supported audio file nor a YouTube URL is
/// rejected up front, before any network or filesystem work happens.
pub fn resolve(input: &str) -> Result<ResolvedSource> {
    if input.trim().is_empty() {
        return Err(EarshotError::InvalidInput("audio source cannot be empty".into()).into());
    }

    if is_youtube_url(input) {
        return Ok(ResolvedSource::YouTube(input.to_string()));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return Err(EarshotError::InvalidInput(format!(
            "only YouTube URLs are supported for remote audio: {}",
            input
        ))
        .into());
    }

    let path = Path::new(input);
    if !has_supported_extension(path) {
        return Err(EarshotError::InvalidInput(format!(
            "audio file must end with one of {:?} or be a YouTube URL: {}",
            SUPPORTED_EXTENSIONS, input
        ))
        .into());
    }

    local::validate_file(path)?;
    Ok(ResolvedSource::LocalFile(path.to_path_buf()))
}

/// Check if the given URL points at YouTube
pub fn is_youtube_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    matches!(
        parsed.host_str(),
        Some("youtube.com") | Some("www.youtube.com") | Some("m.youtube.com") | Some("youtu.be")
    )
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Determine the MIME type to report for an audio file.
///
/// Unknown extensions fall back to audio/mpeg, which is what the download
/// step produces.
pub fn detect_mime_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioFormat::from_extension)
        .map(|format| format.mime_type())
        .unwrap_or("audio/mpeg")
}
