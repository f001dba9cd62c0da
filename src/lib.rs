//! Vidsum - a CLI tool that turns a video URL into a text summary
//!
//! This library wires together four external capabilities into one sequential
//! pipeline: audio download (yt-dlp), waveform conversion (ffmpeg), speech
//! recognition (a remote transcription API), and summarization (a local LLM
//! runner such as ollama).

pub mod cli;
pub mod config;
pub mod convert;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod summarize;
pub mod transcribe;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use pipeline::{PipelineStage, SummaryOutcome, SummaryPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Top-level pipeline error: one variant per stage, so the driver can
/// pattern-match on where the run fell over instead of unwinding blindly.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("audio download failed: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("audio conversion failed: {0}")]
    Convert(#[from] convert::ConvertError),

    #[error("transcription failed: {0}")]
    Transcribe(#[from] transcribe::TranscribeError),

    #[error("summarization failed: {0}")]
    Summarize(#[from] summarize::SummarizeError),

    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Name of the pipeline stage this error belongs to, for diagnostics.
    pub fn stage_name(&self) -> &'static str {
        match self {
            StageError::Fetch(_) => "download",
            StageError::Convert(_) => "convert",
            StageError::Transcribe(_) => "transcribe",
            StageError::Summarize(_) => "summarize",
            StageError::Io(_) => "io",
        }
    }
}
