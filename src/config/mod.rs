use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::gemini::DEFAULT_BASE_URL;
use crate::{EarshotError, Result};

/// Model used when neither the CLI nor the config file names one
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Environment variables checked for the API key, in order
const API_KEY_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY", "GENAI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API settings
    pub gemini: GeminiConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Default model for all operations
    pub model: String,

    /// Optional API endpoint override (regional routing, proxies)
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language used for summaries unless overridden
    pub default_language: String,

    /// Keep downloaded audio files after processing
    pub keep_audio: bool,

    /// Temporary directory for downloads
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig {
                model: DEFAULT_MODEL.to_string(),
                api_endpoint: None,
            },
            app: AppConfig {
                default_language: "English".to_string(),
                keep_audio: false,
                temp_dir: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // A config.yaml in the working directory takes precedence
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("earshot").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.gemini.model.trim().is_empty() {
            anyhow::bail!("A default model must be configured");
        }
        Ok(())
    }

    /// Resolve the API key from the environment.
    ///
    /// Keys are never stored in the config file.
    pub fn api_key(&self) -> Result<String> {
        for var in API_KEY_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return Ok(value);
                }
            }
        }
        Err(EarshotError::MissingApiKey.into())
    }

    /// Resolve the API endpoint: environment override, then config, then the
    /// public endpoint.
    pub fn api_endpoint(&self) -> String {
        if let Ok(endpoint) = std::env::var("GEMINI_API_ENDPOINT") {
            if !endpoint.is_empty() {
                return endpoint;
            }
        }
        self.gemini
            .api_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Model to use, preferring an explicit CLI override
    pub fn model_for(&self, override_model: Option<&str>) -> String {
        override_model
            .map(|model| model.to_string())
            .unwrap_or_else(|| self.gemini.model.clone())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Model: {}", self.gemini.model);
        if let Some(endpoint) = &self.gemini.api_endpoint {
            println!("  API Endpoint: {}", endpoint);
        }
        println!("  Summary Language: {}", self.app.default_language);
        println!("  Keep Audio: {}", self.app.keep_audio);
        if let Some(temp_dir) = &self.app.temp_dir {
            println!("  Temp Dir: {}", temp_dir.display());
        }
        println!("  API key: read from GOOGLE_API_KEY / GEMINI_API_KEY / GENAI_API_KEY");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.app.default_language, "English");
        assert!(!config.app.keep_audio);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = Config::default();
        config.gemini.model = "gemini-1.5-pro".to_string();
        config.app.keep_audio = true;

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.gemini.model, "gemini-1.5-pro");
        assert!(parsed.app.keep_audio);
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.gemini.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_for_prefers_override() {
        let config = Config::default();
        assert_eq!(config.model_for(Some("gemini-1.5-pro")), "gemini-1.5-pro");
        assert_eq!(config.model_for(None), DEFAULT_MODEL);
    }
}
