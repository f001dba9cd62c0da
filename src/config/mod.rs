use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote speech-recognition settings
    pub transcription: TranscriptionConfig,

    /// Local LLM runner settings
    pub summarizer: SummarizerConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// OpenAI-compatible transcription endpoint
    pub endpoint: String,

    /// Recognition model name sent with the upload
    pub model: String,

    /// Bearer token; falls back to OPENAI_API_KEY when unset
    pub api_key: Option<String>,

    /// Language hint for recognition (auto-detect if unset)
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// LLM runner executable
    pub program: String,

    /// Pinned model identifier passed to the runner
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Diagnostic log file, overwritten at startup
    pub log_file: PathBuf,

    /// Keep the downloaded audio after the run
    pub keep_audio: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcription: TranscriptionConfig {
                endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
                model: "whisper-1".to_string(),
                api_key: None,
                language: None,
            },
            summarizer: SummarizerConfig {
                program: "ollama".to_string(),
                model: "llama3.1:8b".to_string(),
            },
            app: AppConfig {
                log_file: PathBuf::from("vidsum.log"),
                keep_audio: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("vidsum").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.transcription.endpoint.is_empty() {
            anyhow::bail!("Transcription endpoint must be configured");
        }

        if self.summarizer.model.is_empty() {
            anyhow::bail!("Summarizer model must be configured");
        }

        Ok(())
    }

    /// Bearer token for the transcription endpoint, config first then env
    pub fn transcription_api_key(&self) -> Option<String> {
        self.transcription
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.summarizer.program, "ollama");
        assert_eq!(config.summarizer.model, "llama3.1:8b");
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.transcription.endpoint, config.transcription.endpoint);
        assert_eq!(parsed.app.log_file, config.app.log_file);
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = Config::default();
        config.summarizer.model.clear();
        assert!(config.validate().is_err());
    }
}
