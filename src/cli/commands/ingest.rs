//! Ingest command implementations.

use super::{preflight, read_input};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::comments::CommentRecord;
use crate::config::Settings;
use crate::content::ContentType;
use crate::ingest::IngestRequest;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};

/// Run the ingest command.
pub async fn run_ingest(
    input: &str,
    content_type: ContentType,
    source: &str,
    title: Option<String>,
    replace: bool,
    owner: &str,
    settings: Settings,
) -> Result<()> {
    if content_type == ContentType::Comment {
        anyhow::bail!("Use 'vidsage ingest-comments' to ingest comments");
    }
    preflight(Operation::Ingest, &settings)?;

    let text = read_input(input)?;
    let orchestrator = Orchestrator::new(settings)?;

    let request = IngestRequest::new(
        owner,
        content_type,
        source,
        title.unwrap_or_else(|| source.to_string()),
        text,
    )
    .replacing(replace);

    let spinner = Output::spinner(&format!("Ingesting {}...", content_type));
    let result = orchestrator.ingest(request).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => Output::ingest_report(&report),
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Run the ingest-comments command.
pub async fn run_ingest_comments(
    input: &str,
    video: &str,
    title: Option<String>,
    owner: &str,
    settings: Settings,
) -> Result<()> {
    preflight(Operation::Ingest, &settings)?;

    let json = read_input(input)?;
    let comments: Vec<CommentRecord> =
        serde_json::from_str(&json).context("Expected a JSON array of comments")?;

    let orchestrator = Orchestrator::new(settings)?;
    let title = title.unwrap_or_else(|| video.to_string());

    let spinner = Output::spinner(&format!("Ingesting {} comments...", comments.len()));
    let result = orchestrator
        .ingest_comments(owner, video, &title, &comments)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => Output::ingest_report(&report),
        Err(e) => {
            Output::error(&format!("Comment ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
