//! Owner-scoped retrieval of context chunks.

use super::Query;
use crate::config::{FilterMode, RetrievalSettings};
use crate::embedding::Embedder;
use crate::error::{Result, VidsageError};
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Finds the chunks most similar to a question.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    filter_mode: FilterMode,
    over_fetch_factor: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            filter_mode: settings.filter_mode,
            over_fetch_factor: settings.over_fetch_factor.max(1),
        }
    }

    /// Whether the filter is evaluated inside the store.
    pub fn uses_native_filter(&self) -> bool {
        self.filter_mode == FilterMode::Native && self.vector_store.supports_native_filter()
    }

    /// Nearest chunks for the query, best first, never from another owner.
    #[instrument(skip(self, query), fields(owner = %query.owner_id(), content_type = %query.content_type()))]
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<SearchResult>> {
        let embedding = self
            .embedder
            .embed(query.question())
            .await
            .map_err(|e| VidsageError::Retrieval(format!("Failed to embed question: {}", e)))?;

        let filter = query.filter();
        let results = if self.uses_native_filter() {
            self.vector_store
                .search(&embedding, query.limit(), Some(&filter))
                .await
        } else {
            self.vector_store
                .search(&embedding, query.limit() * self.over_fetch_factor, None)
                .await
        }
        .map_err(|e| VidsageError::Retrieval(format!("Vector search failed: {}", e)))?;

        let fetched = results.len();
        let mut matching: Vec<SearchResult> = results
            .into_iter()
            .filter(|r| filter.matches(&r.chunk.metadata))
            .collect();
        matching.truncate(query.limit());

        debug!("Kept {} of {} fetched chunks", matching.len(), fetched);
        Ok(matching)
    }
}
