//! Analyze command implementation.

use super::preflight;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidsageError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the analyze command.
pub async fn run_analyze(
    video: &str,
    duration: Option<u64>,
    owner: &str,
    settings: Settings,
) -> Result<()> {
    preflight(Operation::Analyze, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Analyzing transcript...");
    let result = orchestrator.analyze_video(owner, video, duration).await;
    spinner.finish_and_clear();

    let analysis = match result {
        Ok(analysis) => analysis,
        Err(VidsageError::NotFound(_)) => {
            Output::info("No transcript ingested for this video. Use 'vidsage ingest' first.");
            return Ok(());
        }
        Err(e) => {
            Output::error(&format!("Failed to analyze video: {}", e));
            return Err(e.into());
        }
    };

    Output::header(&analysis.video_title);
    println!("\n{}", analysis.description);

    if analysis.qa_pairs.is_empty() {
        Output::warning("The model returned no usable Q&A pairs.");
        return Ok(());
    }

    Output::header("Q&A");
    for (i, pair) in analysis.qa_pairs.iter().enumerate() {
        println!("\n  {}. {}", i + 1, pair.question);
        println!("     {}", pair.answer);
    }

    Ok(())
}
