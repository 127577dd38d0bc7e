//! Delete command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::content::ContentType;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the delete command.
pub async fn run_delete(
    source: &str,
    content_type: Option<ContentType>,
    owner: &str,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.delete_source(owner, source, content_type).await {
        Ok(0) => Output::warning(&format!("Nothing to delete for {}", source)),
        Ok(deleted) => Output::success(&format!("Deleted {} chunks of {}", deleted, source)),
        Err(e) => {
            Output::error(&format!("Delete failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
