use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use vidsum::{logging, utils, Cli, Config, SummaryPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().await?;
    if let Some(model) = cli.model {
        config.summarizer.model = model;
    }
    if cli.keep_audio {
        config.app.keep_audio = true;
    }
    let log_file = cli.log_file.unwrap_or_else(|| config.app.log_file.clone());

    logging::init(&log_file, cli.verbose)?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies().await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let url = match cli.url {
        Some(url) => url,
        None => prompt_for_url()?,
    };

    tracing::info!("Starting summary pipeline for URL: {}", url);
    let started = std::time::Instant::now();

    let pipeline = SummaryPipeline::new(config)?;

    match pipeline.run(&url).await {
        Ok(outcome) => {
            println!("\nSummary:\n{}", outcome.summary);
            if let Some(audio_path) = outcome.preserved_audio {
                println!("Audio saved to: {}", audio_path.display());
            }
            tracing::info!(
                "Pipeline finished in {}",
                utils::format_duration(started.elapsed().as_secs_f64())
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("Error during {}: {}", err.stage_name(), err);
            std::process::exit(1);
        }
    }
}

/// Interactive fallback: read the video URL from stdin.
fn prompt_for_url() -> Result<String> {
    println!("Welcome to the Video Summarizer CLI Tool!");
    print!("Please enter the video URL: ");
    std::io::stdout().flush()?;

    let mut url = String::new();
    std::io::stdin()
        .read_line(&mut url)
        .context("Failed to read URL from stdin")?;

    Ok(url.trim().to_string())
}
