//! Audio download stage, backed by yt-dlp.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::utils;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("yt-dlp is not available, install it from https://github.com/yt-dlp/yt-dlp")]
    ToolMissing,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("no audio stream available for: {0}")]
    NoAudioStream(String),

    #[error("yt-dlp failed: {0}")]
    ToolFailed(String),

    #[error("downloaded file missing or empty: {0}")]
    EmptyDownload(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads the audio-only stream of a video with yt-dlp.
pub struct Fetcher {
    yt_dlp_path: String,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        let output = Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        matches!(output, Ok(out) if out.status.success())
    }

    /// Download the best audio-only stream of `url` as MP3 into `output_path`.
    ///
    /// Returns the path of the downloaded file. The file lands wherever the
    /// caller points it; the pipeline owns the directory lifetime.
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<PathBuf, FetchError> {
        let url = utils::validate_and_normalize_url(url)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if !self.check_availability().await {
            return Err(FetchError::ToolMissing);
        }

        tracing::info!("Downloading audio for: {}", url);

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.set_message("Downloading audio with yt-dlp...");
        progress.enable_steady_tick(std::time::Duration::from_millis(100));

        let output_arg = output_path.to_string_lossy();
        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                output_arg.as_ref(),
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                "--newline",
                url.as_str(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            progress.finish_with_message("Download failed");
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_yt_dlp_error(&stderr, &url));
        }

        progress.finish_with_message("Download complete");

        let size = fs_err::metadata(output_path).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(FetchError::EmptyDownload(output_path.to_path_buf()));
        }

        tracing::info!(
            "Audio downloaded successfully: {} ({})",
            output_path.display(),
            utils::format_file_size(size)
        );

        Ok(output_path.to_path_buf())
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Map yt-dlp stderr onto a typed error.
fn classify_yt_dlp_error(stderr: &str, url: &str) -> FetchError {
    if stderr.contains("is not a valid URL") || stderr.contains("Unsupported URL") {
        FetchError::InvalidUrl(url.to_string())
    } else if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        FetchError::VideoUnavailable(url.to_string())
    } else if stderr.contains("No video formats") || stderr.contains("requested format not available") {
        FetchError::NoAudioStream(url.to_string())
    } else {
        FetchError::ToolFailed(stderr.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_invalid_url() {
        let err = classify_yt_dlp_error("ERROR: 'abc' is not a valid URL.", "abc");
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn test_classify_unavailable() {
        let err = classify_yt_dlp_error("ERROR: Video unavailable", "https://youtu.be/x");
        assert!(matches!(err, FetchError::VideoUnavailable(_)));
    }

    #[test]
    fn test_classify_no_formats() {
        let err = classify_yt_dlp_error(
            "ERROR: No video formats found!",
            "https://youtu.be/x",
        );
        assert!(matches!(err, FetchError::NoAudioStream(_)));
    }

    #[test]
    fn test_classify_fallback() {
        let err = classify_yt_dlp_error("ERROR: something else entirely", "https://youtu.be/x");
        assert!(matches!(err, FetchError::ToolFailed(_)));
    }

    #[tokio::test]
    async fn test_download_rejects_malformed_url_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("audio.mp3");
        let err = Fetcher::new().download("not a url", &out).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
