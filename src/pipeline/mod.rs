use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::sources::youtube::YoutubeDownloader;
use crate::sources::{self, ResolvedSource};
use crate::{EarshotError, Result};

/// A stage label and completion fraction reported during processing
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingProgress {
    pub stage: String,
    pub progress: f64,
}

pub type ProgressCallback = Box<dyn FnMut(ProcessingProgress) + Send>;

/// Wraps an optional caller-supplied progress callback so pipeline stages can
/// report unconditionally.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// A reporter that drops every event
    pub fn disabled() -> Self {
        Self { callback: None }
    }

    pub fn report(&mut self, stage: &str, progress: f64) {
        if let Some(callback) = self.callback.as_mut() {
            callback(ProcessingProgress {
                stage: stage.to_string(),
                progress,
            });
        }
    }
}

/// What to ask the model for: prompt, model name, and optional structured
/// response configuration.
#[derive(Debug, Clone)]
pub struct GenerationSpec {
    pub model: String,
    pub prompt: String,
    pub response_mime_type: Option<String>,
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationSpec {
    pub fn plain(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response_mime_type: None,
            response_schema: None,
        }
    }
}

/// Seam between the pipeline and the inference service: upload prepared audio
/// and return the generated text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn generate_from_audio(
        &self,
        audio_path: &Path,
        mime_type: &str,
        spec: &GenerationSpec,
        progress: &mut ProgressReporter,
    ) -> Result<String>;
}

/// Sequential audio processing pipeline.
///
/// One invocation per call: resolve the source, download remote audio if
/// needed, hand the file to the backend, and clean up temporary files on
/// every exit path.
pub struct Pipeline {
    backend: Box<dyn AudioBackend>,
    downloader: YoutubeDownloader,
    temp_dir: TempDir,
    keep_audio: bool,
}

impl Pipeline {
    /// Create a pipeline backed by the Gemini API
    pub fn new(config: &Config) -> Result<Self> {
        let backend = GeminiClient::new(config)?;
        let mut pipeline = Self::with_backend(Box::new(backend), config.app.temp_dir.as_deref())?;
        pipeline.keep_audio = config.app.keep_audio;
        Ok(pipeline)
    }

    /// Create a pipeline over any backend (used in tests)
    pub fn with_backend(
        backend: Box<dyn AudioBackend>,
        temp_dir_override: Option<&Path>,
    ) -> Result<Self> {
        let temp_dir = match temp_dir_override {
            Some(parent) => TempDir::new_in(parent),
            None => TempDir::new(),
        }
        .map_err(|e| EarshotError::ProcessingFailed(format!("cannot create temp directory: {}", e)))?;

        Ok(Self {
            backend,
            downloader: YoutubeDownloader::new(),
            temp_dir,
            keep_audio: false,
        })
    }

    /// Run the full pipeline for one input and return the generated text
    pub async fn run(
        &self,
        input: &str,
        spec: &GenerationSpec,
        progress: &mut ProgressReporter,
    ) -> Result<String> {
        progress.report("Starting processing", 0.0);

        let source = sources::resolve(input)?;
        let (audio_path, temp_audio) = match source {
            ResolvedSource::YouTube(url) => {
                tracing::info!("Processing YouTube URL: {}", url);
                progress.report("Downloading YouTube audio", 0.0);
                let path = self
                    .downloader
                    .download(&url, self.temp_dir.path(), progress)
                    .await?;
                (path.clone(), Some(path))
            }
            ResolvedSource::LocalFile(path) => {
                tracing::info!("Processing local audio file: {}", path.display());
                (path, None)
            }
        };

        let mime_type = sources::detect_mime_type(&audio_path);

        progress.report("Processing with AI model", 0.5);
        let generated = self
            .backend
            .generate_from_audio(&audio_path, mime_type, spec, progress)
            .await;

        // Temporary audio is removed whether generation succeeded or not;
        // the TempDir guard catches anything left behind on early exits.
        if let Some(temp_path) = temp_audio {
            if self.keep_audio {
                match self.preserve_audio(&temp_path) {
                    Ok(saved) => tracing::info!("Audio saved to {}", saved.display()),
                    Err(e) => tracing::warn!("Failed to preserve audio: {}", e),
                }
            }
            if let Err(e) = fs_err::remove_file(&temp_path) {
                tracing::warn!(
                    "Failed to clean up temporary file {}: {}",
                    temp_path.display(),
                    e
                );
            } else {
                tracing::debug!("Cleaned up temporary file {}", temp_path.display());
            }
        }

        let text = generated?;
        progress.report("Processing complete", 0.95);

        Ok(text)
    }

    fn preserve_audio(&self, temp_path: &Path) -> Result<PathBuf> {
        let filename = format!("audio_{}.mp3", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
        let output_path = std::env::current_dir()
            .map_err(|e| EarshotError::FileError(format!("cannot resolve working directory: {}", e)))?
            .join(filename);
        fs_err::copy(temp_path, &output_path)
            .map_err(|e| EarshotError::FileError(format!("cannot preserve audio: {}", e)))?;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn capture_progress() -> (ProgressReporter, Arc<Mutex<Vec<ProcessingProgress>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::new(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        (reporter, events)
    }

    fn audio_fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".mp3")
            .tempfile()
            .unwrap();
        file.write_all(b"fake audio bytes").unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_local_file_progress_sequence() {
        let file = audio_fixture();
        let input = file.path().to_string_lossy().to_string();

        let mut backend = MockAudioBackend::new();
        backend
            .expect_generate_from_audio()
            .times(1)
            .returning(|_, _, _, _| Ok("generated text".to_string()));

        let pipeline = Pipeline::with_backend(Box::new(backend), None).unwrap();
        let (mut reporter, events) = capture_progress();
        let spec = GenerationSpec::plain("gemini-1.5-flash", "transcribe");

        let text = pipeline.run(&input, &spec, &mut reporter).await.unwrap();
        assert_eq!(text, "generated text");

        let events = events.lock().unwrap();
        let stages: Vec<(&str, f64)> = events
            .iter()
            .map(|e| (e.stage.as_str(), e.progress))
            .collect();
        assert_eq!(
            stages,
            vec![
                ("Starting processing", 0.0),
                ("Processing with AI model", 0.5),
                ("Processing complete", 0.95),
            ]
        );
    }

    #[tokio::test]
    async fn test_backend_sees_detected_mime_type() {
        let mut file = tempfile::Builder::new()
            .suffix(".wav")
            .tempfile()
            .unwrap();
        file.write_all(b"RIFF").unwrap();
        file.flush().unwrap();
        let input = file.path().to_string_lossy().to_string();

        let mut backend = MockAudioBackend::new();
        backend
            .expect_generate_from_audio()
            .withf(|_, mime, _, _| mime == "audio/wav")
            .times(1)
            .returning(|_, _, _, _| Ok("ok".to_string()));

        let pipeline = Pipeline::with_backend(Box::new(backend), None).unwrap();
        let spec = GenerationSpec::plain("gemini-1.5-flash", "transcribe");
        pipeline
            .run(&input, &spec, &mut ProgressReporter::disabled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_backend() {
        let mut backend = MockAudioBackend::new();
        backend.expect_generate_from_audio().times(0);

        let pipeline = Pipeline::with_backend(Box::new(backend), None).unwrap();
        let spec = GenerationSpec::plain("gemini-1.5-flash", "transcribe");
        let err = pipeline
            .run("notes.txt", &spec, &mut ProgressReporter::disabled())
            .await
            .unwrap_err();

        match err.downcast_ref::<EarshotError>() {
            Some(EarshotError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_error_propagates_without_completion() {
        let file = audio_fixture();
        let input = file.path().to_string_lossy().to_string();

        let mut backend = MockAudioBackend::new();
        backend.expect_generate_from_audio().returning(|_, _, _, _| {
            Err(EarshotError::InferenceFailed("model exploded".into()).into())
        });

        let pipeline = Pipeline::with_backend(Box::new(backend), None).unwrap();
        let (mut reporter, events) = capture_progress();
        let spec = GenerationSpec::plain("gemini-1.5-flash", "transcribe");

        let err = pipeline.run(&input, &spec, &mut reporter).await.unwrap_err();
        assert!(err.to_string().contains("model exploded"));

        let events = events.lock().unwrap();
        assert!(events.iter().all(|e| e.stage != "Processing complete"));
    }

    #[test]
    fn test_disabled_reporter_is_silent() {
        let mut reporter = ProgressReporter::disabled();
        reporter.report("anything", 0.5);
    }
}
