use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::time::sleep;

use crate::config::Config;
use crate::pipeline::{AudioBackend, GenerationSpec, ProgressReporter};
use crate::utils::format_file_size;
use crate::{EarshotError, Result};

pub mod types;

pub use types::{
    default_safety_settings, Content, FileData, FileState, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, Part, RemoteFile, SafetySetting, UploadResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const MAX_ACTIVATION_CHECKS: u64 = 30;

/// Process-wide memoization of uploads, keyed by absolute path and mtime.
/// Re-processing an unchanged file skips the upload round-trip.
fn upload_cache() -> &'static Mutex<HashMap<(PathBuf, SystemTime), RemoteFile>> {
    static CACHE: OnceLock<Mutex<HashMap<(PathBuf, SystemTime), RemoteFile>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Drop all memoized uploads (used in tests)
pub fn clear_upload_cache() {
    upload_cache().lock().expect("upload cache poisoned").clear();
}

fn cache_key(path: &Path) -> Result<(PathBuf, SystemTime)> {
    let absolute = fs_err::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let modified = fs_err::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| EarshotError::FileError(format!("cannot stat {}: {}", path.display(), e)))?;
    Ok((absolute, modified))
}

/// Client for the Gemini Files and generateContent endpoints
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client from configuration, resolving the API key and any
    /// endpoint override from the environment.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_endpoint(config.api_key()?, config.api_endpoint()))
    }

    /// Create a client against an explicit endpoint (used in tests)
    pub fn with_endpoint(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload an audio file through the resumable upload protocol.
    ///
    /// The protocol is two requests: a "start" request carrying metadata that
    /// returns a session URL in a header, then a single "upload, finalize"
    /// request with the file bytes.
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        progress: &mut ProgressReporter,
    ) -> Result<RemoteFile> {
        let key = cache_key(path)?;
        if let Some(cached) = upload_cache().lock().expect("upload cache poisoned").get(&key) {
            tracing::debug!("Reusing cached upload for {}", path.display());
            return Ok(cached.clone());
        }

        let content = fs_err::read(path)
            .map_err(|e| EarshotError::FileError(format!("cannot read {}: {}", path.display(), e)))?;
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        progress.report("Uploading audio", 0.6);
        tracing::info!(
            "Uploading {} ({}) to Gemini",
            display_name,
            format_file_size(content.len() as u64)
        );

        let start_url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let start_response = self
            .http
            .post(&start_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", content.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({"file": {"display_name": display_name}}))
            .send()
            .await
            .map_err(|e| EarshotError::UploadFailed(format!("upload start request failed: {}", e)))?;

        if !start_response.status().is_success() {
            return Err(EarshotError::UploadFailed(format!(
                "upload start rejected: HTTP {}",
                start_response.status()
            ))
            .into());
        }

        let session_url = start_response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
            .ok_or_else(|| {
                EarshotError::UploadFailed("upload start response carried no session URL".into())
            })?;

        let upload_response = self
            .http
            .post(&session_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(content)
            .send()
            .await
            .map_err(|e| EarshotError::UploadFailed(format!("upload request failed: {}", e)))?;

        if !upload_response.status().is_success() {
            return Err(EarshotError::UploadFailed(format!(
                "upload rejected: HTTP {}",
                upload_response.status()
            ))
            .into());
        }

        let uploaded: UploadResponse = upload_response
            .json()
            .await
            .map_err(|e| EarshotError::UploadFailed(format!("unreadable upload response: {}", e)))?;

        upload_cache()
            .lock()
            .expect("upload cache poisoned")
            .insert(key, uploaded.file.clone());

        Ok(uploaded.file)
    }

    /// Fetch current metadata for an uploaded file
    pub async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| EarshotError::InferenceFailed(format!("file status request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EarshotError::InferenceFailed(format!(
                "file status rejected: HTTP {}",
                response.status()
            ))
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| EarshotError::InferenceFailed(format!("unreadable file status: {}", e)).into())
    }

    /// Poll an uploaded file until the server finishes processing it.
    ///
    /// Uploaded audio starts in PROCESSING and must reach ACTIVE before it
    /// can be referenced from a generation request.
    pub async fn wait_until_active(&self, mut file: RemoteFile) -> Result<RemoteFile> {
        let mut check_count = 0u64;

        loop {
            match file.state {
                FileState::Active => return Ok(file),
                FileState::Failed => {
                    return Err(EarshotError::InferenceFailed(format!(
                        "server-side processing failed for {}",
                        file.name
                    ))
                    .into());
                }
                _ => {}
            }

            check_count += 1;
            if check_count > MAX_ACTIVATION_CHECKS {
                return Err(EarshotError::InferenceFailed(format!(
                    "file {} did not become ready after {} checks",
                    file.name, MAX_ACTIVATION_CHECKS
                ))
                .into());
            }

            let wait = std::cmp::min(1 + check_count / 2, 8);
            tracing::debug!(
                "File {} is {:?}, polling again in {}s (check #{})",
                file.name,
                file.state,
                wait,
                check_count
            );
            sleep(Duration::from_secs(wait)).await;

            file = self.get_file(&file.name).await?;
        }
    }

    /// Call generateContent on the given model
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        tracing::debug!("Requesting generation from model {}", model);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| EarshotError::InferenceFailed(format!("generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(300).collect();
            return Err(EarshotError::InferenceFailed(format!(
                "generation rejected: HTTP {}: {}",
                status,
                detail.trim()
            ))
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| {
                EarshotError::InferenceFailed(format!("unreadable generation response: {}", e)).into()
            })
    }
}

/// Build a generation request pairing the prompt text with the uploaded audio
pub fn build_generate_request(spec: &GenerationSpec, file: &RemoteFile) -> GenerateContentRequest {
    let mime_type = file
        .mime_type
        .clone()
        .unwrap_or_else(|| "audio/mpeg".to_string());

    let generation_config =
        if spec.response_mime_type.is_some() || spec.response_schema.is_some() {
            Some(GenerationConfig {
                response_mime_type: spec.response_mime_type.clone(),
                response_schema: spec.response_schema.clone(),
            })
        } else {
            None
        };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::text(spec.prompt.clone()),
                Part::file(file.uri.clone(), mime_type),
            ],
        }],
        generation_config,
        safety_settings: default_safety_settings(),
    }
}

#[async_trait]
impl AudioBackend for GeminiClient {
    async fn generate_from_audio(
        &self,
        audio_path: &Path,
        mime_type: &str,
        spec: &GenerationSpec,
        progress: &mut ProgressReporter,
    ) -> Result<String> {
        let uploaded = self.upload_file(audio_path, mime_type, progress).await?;
        let active = self.wait_until_active(uploaded).await?;

        progress.report("Generating response", 0.75);
        let request = build_generate_request(spec, &active);
        let response = self.generate(&spec.model, &request).await?;

        response.text()
    }
}
