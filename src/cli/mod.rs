use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vidsum",
    about = "Vidsum - Download, transcribe, and summarize a video with a local LLM",
    version,
    long_about = "A CLI tool that downloads the audio of a video, converts it to WAV, \
transcribes it through a remote speech-recognition API, and produces a summary with a \
locally installed language-model runner (ollama). Run without arguments to be prompted \
for a URL."
)]
pub struct Cli {
    /// Video URL to summarize (prompted on stdin if omitted)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Override the summarization model passed to the LLM runner
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Keep the downloaded audio file instead of deleting it with the temp dir
    #[arg(long)]
    pub keep_audio: bool,

    /// Path of the diagnostic log file (overwritten on every run)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Also mirror log output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
