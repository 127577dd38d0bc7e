//! Vector store abstraction for vidsage.
//!
//! Provides a trait-based interface for different vector database backends.
//! Every stored chunk carries its owner; stores that can evaluate a
//! [`SearchFilter`] natively report it through
//! [`VectorStore::supports_native_filter`].

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::content::ContentType;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Owner of the chunk; retrieval never crosses owners.
    pub owner_id: String,
    /// Kind of content the chunk came from.
    pub content_type: ContentType,
    /// Video or document id.
    pub source_id: String,
    /// Video or document title.
    pub source_title: String,
    /// Position of the chunk within its ingestion call.
    pub chunk_index: u32,
    /// When the chunk was ingested.
    pub ingested_at: DateTime<Utc>,
    /// Content-type-specific fields (e.g. `sentiment`, `author`, `likeCount`).
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl StoredChunk {
    /// Create a new chunk with a fresh id.
    pub fn new(content: String, embedding: Vec<f32>, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            embedding,
            metadata,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: StoredChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Metadata predicate for searches and scans.
///
/// `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub owner_id: Option<String>,
    pub content_type: Option<ContentType>,
    pub source_id: Option<String>,
}

impl SearchFilter {
    /// Filter matching everything one owner has stored.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Check a chunk's metadata against the filter.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        self.owner_id.as_ref().map_or(true, |o| *o == metadata.owner_id)
            && self.content_type.map_or(true, |t| t == metadata.content_type)
            && self.source_id.as_ref().map_or(true, |s| *s == metadata.source_id)
    }
}

/// Summary information about one ingested source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedSource {
    pub source_id: String,
    pub source_title: String,
    pub content_type: ContentType,
    /// Number of stored chunks.
    pub chunk_count: u32,
    /// Most recent ingestion time.
    pub ingested_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a single chunk.
    async fn insert(&self, chunk: &StoredChunk) -> Result<()>;

    /// Store a batch of chunks, returning how many were written.
    async fn insert_batch(&self, chunks: &[StoredChunk]) -> Result<usize>;

    /// Nearest neighbours of `query_embedding`, best first.
    ///
    /// When `filter` is given the store only considers matching chunks.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Whether `search` evaluates the filter inside the store.
    fn supports_native_filter(&self) -> bool;

    /// All chunks matching a filter, in ingestion order.
    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<StoredChunk>>;

    /// Delete one owner's chunks for a source, returning how many were removed.
    async fn delete_source(
        &self,
        owner_id: &str,
        source_id: &str,
        content_type: Option<ContentType>,
    ) -> Result<usize>;

    /// Delete specific chunks of one owner, returning how many were removed.
    ///
    /// Ids belonging to other owners are ignored.
    async fn delete_chunks(&self, owner_id: &str, ids: &[Uuid]) -> Result<usize>;

    /// List the sources one owner has ingested, most recent first.
    async fn list_sources(&self, owner_id: &str) -> Result<Vec<IndexedSource>>;

    /// Number of chunks matching a filter.
    async fn chunk_count(&self, filter: &SearchFilter) -> Result<usize>;
}

/// Create the vector store described by the settings.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    };
    Ok(store)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by descending score; ties keep their incoming order.
pub(crate) fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn metadata(owner: &str, content_type: ContentType, source: &str) -> ChunkMetadata {
        ChunkMetadata {
            owner_id: owner.to_string(),
            content_type,
            source_id: source.to_string(),
            source_title: format!("Title of {}", source),
            chunk_index: 0,
            ingested_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn chunk(
        owner: &str,
        content_type: ContentType,
        source: &str,
        content: &str,
        embedding: Vec<f32>,
    ) -> StoredChunk {
        StoredChunk::new(content.to_string(), embedding, metadata(owner, content_type, source))
    }
}
