//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{Result, VidsageError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Ingestion embeds text.
    Ingest,
    /// Asking questions embeds the question and calls the chat model.
    Ask,
    /// Search embeds the query.
    Search,
    /// Analysis reads stored chunks and calls the chat model.
    Analyze,
    /// Listing, deleting and insights only touch the store.
    Manage,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    let embeds_with_openai = settings.embedding.provider == EmbeddingProvider::OpenAI;

    let needs_api_key = match operation {
        Operation::Ingest | Operation::Search => embeds_with_openai,
        Operation::Ask => settings.uses_openai(),
        Operation::Analyze => settings.chat.provider.eq_ignore_ascii_case("openai"),
        Operation::Manage => false,
    };

    if needs_api_key {
        check_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())?;
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key(key: Option<&str>) -> Result<()> {
    match key {
        Some(key) if !key.is_empty() => Ok(()),
        Some(_) => Err(VidsageError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(VidsageError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
