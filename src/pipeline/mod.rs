//! The four-stage pipeline and its sequencing.
//!
//! Stages run strictly in order with no retries and no skipping. All
//! intermediate files live inside a scoped temporary directory that is
//! removed when the pipeline is dropped, on success and failure alike.

use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

use crate::config::Config;
use crate::convert::Converter;
use crate::fetch::Fetcher;
use crate::summarize::Summarizer;
use crate::transcribe::Transcriber;
use crate::{utils, StageError};

/// Progress through the pipeline, in execution order.
///
/// `Idle` is the state before `run` is entered; any stage error moves the
/// run to `Failed`, every other transition is strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Downloading,
    Converting,
    Transcribing,
    Summarizing,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Idle => write!(f, "idle"),
            PipelineStage::Downloading => write!(f, "downloading"),
            PipelineStage::Converting => write!(f, "converting"),
            PipelineStage::Transcribing => write!(f, "transcribing"),
            PipelineStage::Summarizing => write!(f, "summarizing"),
            PipelineStage::Done => write!(f, "done"),
            PipelineStage::Failed => write!(f, "failed"),
        }
    }
}

/// What a completed run hands back to the driver.
#[derive(Debug)]
pub struct SummaryOutcome {
    /// The generated summary
    pub summary: String,

    /// Downloaded audio, copied out of the temp dir when keep-audio is set
    pub preserved_audio: Option<PathBuf>,
}

/// Sequences fetch, convert, transcribe and summarize over one video URL.
pub struct SummaryPipeline {
    config: Config,
    fetcher: Fetcher,
    converter: Converter,
    transcriber: Transcriber,
    summarizer: Summarizer,
    temp_dir: TempDir,
}

impl SummaryPipeline {
    pub fn new(config: Config) -> crate::Result<Self> {
        let api_key = config.transcription_api_key();
        let transcriber = Transcriber::new(config.transcription.clone(), api_key);
        let summarizer = Summarizer::new(
            config.summarizer.program.clone(),
            config.summarizer.model.clone(),
        );

        let temp_dir = TempDir::new()?;
        tracing::debug!("Temp directory: {}", temp_dir.path().display());

        Ok(Self {
            config,
            fetcher: Fetcher::new(),
            converter: Converter::new(),
            transcriber,
            summarizer,
            temp_dir,
        })
    }

    /// Run the full pipeline for `url`.
    ///
    /// The first stage error aborts the run; later stages are never entered.
    pub async fn run(&self, url: &str) -> Result<SummaryOutcome, StageError> {
        match self.execute(url).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let stage = PipelineStage::Failed;
                tracing::error!(
                    %stage,
                    "Pipeline failed during {}: {}",
                    err.stage_name(),
                    err
                );
                Err(err)
            }
        }
    }

    async fn execute(&self, url: &str) -> Result<SummaryOutcome, StageError> {
        let mut stage = PipelineStage::Downloading;
        tracing::info!(%stage, "Downloading audio...");
        println!("Downloading video...");

        let audio_filename = format!("audio_{}.mp3", &Uuid::new_v4().to_string()[..8]);
        let audio_path = self.temp_dir.path().join(audio_filename);
        let audio_path = self.fetcher.download(url, &audio_path).await?;
        println!("Video downloaded successfully.");
        println!();

        stage = PipelineStage::Converting;
        tracing::info!(%stage, "Converting audio...");
        println!("Converting audio...");

        let wav_path = self.converter.to_wav(&audio_path).await?;
        println!("Audio converted successfully.");
        println!();

        stage = PipelineStage::Transcribing;
        tracing::info!(%stage, "Transcribing audio...");
        println!("Transcribing audio...");

        let transcript = self.transcriber.transcribe(&wav_path).await?;
        println!("{}", transcript);
        println!("Audio transcribed successfully.");
        println!();

        stage = PipelineStage::Summarizing;
        tracing::info!(%stage, "Summarizing transcription...");
        println!("Summarizing transcription...");

        let summary = self.summarizer.summarize(&transcript).await?;
        println!("Summary generated successfully.");
        println!();

        let preserved_audio = if self.config.app.keep_audio {
            Some(self.preserve_audio(&audio_path)?)
        } else {
            None
        };

        stage = PipelineStage::Done;
        tracing::info!(%stage, "Pipeline complete");

        Ok(SummaryOutcome {
            summary,
            preserved_audio,
        })
    }

    /// Copy the downloaded audio out of the temp dir before it is deleted.
    fn preserve_audio(&self, audio_path: &std::path::Path) -> Result<PathBuf, StageError> {
        let filename = audio_path
            .file_name()
            .map(|n| utils::sanitize_filename(&n.to_string_lossy()))
            .unwrap_or_else(|| {
                format!("audio_{}.mp3", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
            });

        let output_path = std::env::current_dir()?.join(filename);
        fs_err::copy(audio_path, &output_path)?;

        tracing::info!("Audio preserved at: {}", output_path.display());
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_order() {
        let stages = [
            PipelineStage::Idle,
            PipelineStage::Downloading,
            PipelineStage::Converting,
            PipelineStage::Transcribing,
            PipelineStage::Summarizing,
            PipelineStage::Done,
            PipelineStage::Failed,
        ];
        let names: Vec<String> = stages.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            [
                "idle",
                "downloading",
                "converting",
                "transcribing",
                "summarizing",
                "done",
                "failed"
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_url_fails_in_download_stage() {
        let pipeline = SummaryPipeline::new(Config::default()).unwrap();
        let err = pipeline.run("definitely not a url").await.unwrap_err();
        assert_eq!(err.stage_name(), "download");
    }
}
