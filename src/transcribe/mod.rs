//! Speech recognition stage.
//!
//! The whole waveform file is uploaded in one multipart request to an
//! OpenAI-compatible `audio/transcriptions` endpoint. No chunking, no
//! streaming; very long recordings are bounded only by what the service
//! itself accepts.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::config::TranscriptionConfig;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("request to recognition service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("recognition service returned {status}: {body}")]
    Service {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response from recognition service: {0}")]
    BadResponse(#[from] serde_json::Error),

    #[error("no speech recognized in the recording")]
    NoSpeech,
}

/// Response shape shared by OpenAI-compatible transcription APIs
#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Uploads a waveform file to a remote speech-recognition API.
pub struct Transcriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
    api_key: Option<String>,
}

impl Transcriber {
    pub fn new(config: TranscriptionConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key,
        }
    }

    /// Transcribe the entire recording at `wav_path` as one request.
    pub async fn transcribe(&self, wav_path: &Path) -> Result<String, TranscribeError> {
        let audio_data = fs_err::read(wav_path)?;
        let filename = wav_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        tracing::info!(
            "Uploading {} ({} bytes) to {}",
            filename,
            audio_data.len(),
            self.config.endpoint
        );

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.set_message("Transcribing audio...");
        progress.enable_steady_tick(std::time::Duration::from_millis(100));

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.config.model.clone())
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio_data)
                    .file_name(filename)
                    .mime_str("audio/wav")?,
            );

        if let Some(lang) = self.config.language.clone() {
            form = form.text("language", lang);
        }

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            progress.finish_with_message("Transcription failed");
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Service { status, body });
        }

        let body = response.text().await?;
        let text = parse_transcript(&body)?;

        progress.finish_with_message("Transcription complete");

        tracing::debug!("Recognized {} characters", text.len());
        Ok(text)
    }
}

/// Extract the recognized text from a response body; silence or corrupt
/// audio comes back as an empty transcript and is an error here.
fn parse_transcript(body: &str) -> Result<String, TranscribeError> {
    let parsed: TranscriptionResponse = serde_json::from_str(body)?;

    if parsed.text.trim().is_empty() {
        return Err(TranscribeError::NoSpeech);
    }

    Ok(parsed.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let text = parse_transcript(r#"{"text": "hello world this is a test"}"#).unwrap();
        assert_eq!(text, "hello world this is a test");
    }

    #[test]
    fn test_response_parsing_rejects_missing_field() {
        let err = parse_transcript(r#"{"transcript": "x"}"#).unwrap_err();
        assert!(matches!(err, TranscribeError::BadResponse(_)));
    }

    #[test]
    fn test_empty_transcript_is_no_speech() {
        let err = parse_transcript(r#"{"text": ""}"#).unwrap_err();
        assert!(matches!(err, TranscribeError::NoSpeech));

        let err = parse_transcript(r#"{"text": "   \n"}"#).unwrap_err();
        assert!(matches!(err, TranscribeError::NoSpeech));
    }

    #[tokio::test]
    async fn test_missing_file_surfaces_io_error() {
        let transcriber = Transcriber::new(
            TranscriptionConfig {
                endpoint: "http://localhost:0/v1/audio/transcriptions".to_string(),
                model: "whisper-1".to_string(),
                api_key: None,
                language: None,
            },
            None,
        );

        let err = transcriber
            .transcribe(Path::new("/nonexistent/audio.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscribeError::Io(_)));
    }
}
