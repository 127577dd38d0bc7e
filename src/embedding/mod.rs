//! Embedding generation for semantic search and retrieval.

mod ollama;
mod openai;

pub use ollama::{OllamaEmbedder, DEFAULT_OLLAMA_URL};
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
///
/// Ingestion and retrieval must share one embedder; vectors from different
/// models are not comparable.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder described by the settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let dimensions = settings.embedding.dimensions as usize;
    let embedder: Arc<dyn Embedder> = match settings.embedding.provider {
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::with_timeout(
            &settings.embedding.model,
            dimensions,
            std::time::Duration::from_secs(settings.openai.timeout_secs),
        )?),
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::with_timeout(
            &settings.embedding.ollama_url,
            &settings.embedding.model,
            dimensions,
            std::time::Duration::from_secs(settings.openai.timeout_secs),
        )?),
    };
    Ok(embedder)
}
