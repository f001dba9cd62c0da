//! Summarization stage, backed by a local LLM runner subprocess.
//!
//! The runner is invoked with an argument list (never through a shell), so a
//! transcript full of quotes and whitespace goes through unmangled. A failing
//! runner is reported as a distinct error carrying its exit code and stderr,
//! never passed off as a summary. No timeout is enforced; a hung runner
//! blocks the run.

use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

const PROMPT_PREFIX: &str = "Summarize this context: ";

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("LLM runner '{0}' is not available, install it and pull the model first")]
    ToolMissing(String),

    #[error("could not launch LLM runner: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("LLM runner exited with {code:?}: {stderr}")]
    RunnerFailed {
        code: Option<i32>,
        stderr: String,
    },

    #[error("LLM runner produced no output")]
    EmptySummary,
}

/// Runs a pinned model through the local LLM runner to condense a transcript.
pub struct Summarizer {
    program: String,
    model: String,
}

impl Summarizer {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    /// Check if the runner is available
    pub async fn check_availability(&self) -> bool {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        matches!(output, Ok(out) if out.status.success())
    }

    /// Summarize `transcript`, returning the runner's stdout.
    pub async fn summarize(&self, transcript: &str) -> Result<String, SummarizeError> {
        if !self.check_availability().await {
            return Err(SummarizeError::ToolMissing(self.program.clone()));
        }

        let prompt = build_prompt(transcript);

        tracing::info!(
            "Invoking {} run {} ({} character prompt)",
            self.program,
            self.model,
            prompt.len()
        );

        let output = Command::new(&self.program)
            .args(["run", &self.model, &prompt])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("Error in summarization: {}", stderr);
            return Err(SummarizeError::RunnerFailed {
                code: output.status.code(),
                stderr,
            });
        }

        let summary = String::from_utf8_lossy(&output.stdout).into_owned();
        if summary.trim().is_empty() {
            return Err(SummarizeError::EmptySummary);
        }

        tracing::info!("Summarization successful");
        Ok(summary)
    }
}

/// Fixed prompt template fed to the runner.
fn build_prompt(transcript: &str) -> String {
    format!("{PROMPT_PREFIX}{transcript}")
}
