//! Search command implementation.

use super::preflight;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::content::ContentType;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    content_type: ContentType,
    source: Option<&str>,
    limit: Option<usize>,
    owner: &str,
    settings: Settings,
) -> Result<()> {
    preflight(Operation::Search, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator
        .search(content_type, owner, query, source, limit)
        .await;
    spinner.finish_and_clear();

    match results {
        Ok(sources) => {
            if sources.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", sources.len()));

                for (i, source) in sources.iter().enumerate() {
                    Output::search_result(i + 1, source);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
