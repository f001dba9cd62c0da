//! Waveform conversion stage, backed by ffmpeg.
//!
//! The transcription endpoint gets plain PCM WAV at 16 kHz mono, the usual
//! interchange rate for speech recognition. The input is read as MP3 first
//! and as MP4 on a second attempt, mirroring what the downloader can yield.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("ffmpeg is not available, install it first")]
    ToolMissing,

    #[error("could not read {path} as mp3 or mp4: {stderr}")]
    UnreadableInput { path: PathBuf, stderr: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formats the converter will try to demux the input as, in order.
const INPUT_FORMATS: [&str; 2] = ["mp3", "mp4"];

/// Converts downloaded audio to canonical WAV.
pub struct Converter {
    ffmpeg_path: String,
}

impl Converter {
    pub fn new() -> Self {
        Self::with_ffmpeg_path("ffmpeg")
    }

    /// Use a specific ffmpeg executable instead of the one on PATH.
    pub fn with_ffmpeg_path(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Check if ffmpeg is available
    pub async fn check_availability(&self) -> bool {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        matches!(output, Ok(out) if out.status.success())
    }

    /// Re-encode `input` into an uncompressed WAV next to it.
    ///
    /// Tries the input as MP3 and falls back to MP4 demuxing before giving
    /// up; the second failure carries ffmpeg's stderr.
    pub async fn to_wav(&self, input: &Path) -> Result<PathBuf, ConvertError> {
        if !self.check_availability().await {
            return Err(ConvertError::ToolMissing);
        }

        let output_path = wav_output_path(input);
        let mut last_stderr = String::new();

        for format in INPUT_FORMATS {
            tracing::debug!(
                "Converting {} to WAV, demuxing as {}",
                input.display(),
                format
            );

            let input_arg = input.to_string_lossy();
            let output_arg = output_path.to_string_lossy();
            let output = Command::new(&self.ffmpeg_path)
                .args([
                    "-hide_banner",
                    "-loglevel",
                    "error",
                    "-f",
                    format,
                    "-i",
                    input_arg.as_ref(),
                    "-ac",
                    "1",
                    "-ar",
                    "16000",
                    "-c:a",
                    "pcm_s16le",
                    "-y",
                    output_arg.as_ref(),
                ])
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await?;

            if output.status.success() {
                tracing::info!("Audio converted to: {}", output_path.display());
                return Ok(output_path);
            }

            last_stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!("ffmpeg failed demuxing as {}: {}", format, last_stderr);
        }

        Err(ConvertError::UnreadableInput {
            path: input.to_path_buf(),
            stderr: last_stderr,
        })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the WAV output path by replacing the input's extension.
fn wav_output_path(input: &Path) -> PathBuf {
    input.with_extension("wav")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_output_path_replaces_extension() {
        assert_eq!(
            wav_output_path(Path::new("./audio.mp3")),
            PathBuf::from("./audio.wav")
        );
        assert_eq!(
            wav_output_path(Path::new("/tmp/clip.m4a")),
            PathBuf::from("/tmp/clip.wav")
        );
    }

    #[test]
    fn test_wav_output_path_without_extension() {
        assert_eq!(
            wav_output_path(Path::new("/tmp/audio")),
            PathBuf::from("/tmp/audio.wav")
        );
    }

    /// Build a fake ffmpeg that records every demux format it was asked for
    /// in `attempts` and then runs `body`.
    #[cfg(unix)]
    fn stub_ffmpeg(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let attempts = dir.join("attempts");
        let path = dir.join("fake-ffmpeg");
        fs_err::write(
            &path,
            format!(
                "#!/bin/sh\n\
                 if [ \"$1\" = \"-version\" ]; then exit 0; fi\n\
                 echo \"$5\" >> \"{}\"\n\
                 {body}\n",
                attempts.display()
            ),
        )
        .unwrap();
        let mut perms = fs_err::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs_err::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn demux_attempts(dir: &Path) -> Vec<String> {
        fs_err::read_to_string(dir.join("attempts"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_first_format_success_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), "exit 0");
        let input = dir.path().join("audio.mp3");
        fs_err::write(&input, b"not really audio").unwrap();

        let converter = Converter::with_ffmpeg_path(ffmpeg);
        let wav = converter.to_wav(&input).await.unwrap();

        assert_eq!(wav, dir.path().join("audio.wav"));
        assert_eq!(demux_attempts(dir.path()), ["mp3"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_mp3_failure_falls_back_to_mp4() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(
            dir.path(),
            r#"if [ "$5" = "mp3" ]; then echo "invalid mp3 header" >&2; exit 1; fi; exit 0"#,
        );
        let input = dir.path().join("audio.mp3");
        fs_err::write(&input, b"not really audio").unwrap();

        let converter = Converter::with_ffmpeg_path(ffmpeg);
        let wav = converter.to_wav(&input).await.unwrap();

        assert_eq!(wav, dir.path().join("audio.wav"));
        assert_eq!(demux_attempts(dir.path()), ["mp3", "mp4"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_both_formats_failing_reports_last_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), r#"echo "cannot demux as $5" >&2; exit 1"#);
        let input = dir.path().join("audio.mp3");
        fs_err::write(&input, b"not really audio").unwrap();

        let converter = Converter::with_ffmpeg_path(ffmpeg);
        let err = converter.to_wav(&input).await.unwrap_err();

        match err {
            ConvertError::UnreadableInput { path, stderr } => {
                assert_eq!(path, input);
                assert_eq!(stderr, "cannot demux as mp4");
            }
            other => panic!("expected UnreadableInput, got {other:?}"),
        }
        assert_eq!(demux_attempts(dir.path()), ["mp3", "mp4"]);
    }
}
