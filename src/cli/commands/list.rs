//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(owner: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.list_sources(owner).await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("Nothing ingested yet. Use 'vidsage ingest <file>' to add content.");
            } else {
                Output::header(&format!("Ingested Sources ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(source);
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total sources", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sources: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
