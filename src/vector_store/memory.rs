//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, rank, IndexedSource, SearchFilter, SearchResult, StoredChunk, VectorStore};
use crate::content::ContentType;
use crate::error::{Result, VidsageError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// In-memory vector store.
///
/// Chunks are kept in insertion order so equal scores rank deterministically.
pub struct MemoryVectorStore {
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .read()
            .map_err(|e| VidsageError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .write()
            .map_err(|e| VidsageError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert(&self, chunk: &StoredChunk) -> Result<()> {
        self.write()?.push(chunk.clone());
        Ok(())
    }

    async fn insert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        self.write()?.extend_from_slice(chunks);
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let chunks = self.read()?;

        let results: Vec<SearchResult> = chunks
            .iter()
            .filter(|c| filter.map_or(true, |f| f.matches(&c.metadata)))
            .map(|chunk| SearchResult {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        Ok(rank(results, limit))
    }

    fn supports_native_filter(&self) -> bool {
        true
    }

    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<StoredChunk>> {
        let chunks = self.read()?;
        Ok(chunks
            .iter()
            .filter(|c| filter.matches(&c.metadata))
            .cloned()
            .collect())
    }

    async fn delete_source(
        &self,
        owner_id: &str,
        source_id: &str,
        content_type: Option<ContentType>,
    ) -> Result<usize> {
        let mut filter = SearchFilter::owner(owner_id).with_source(source_id);
        filter.content_type = content_type;

        let mut chunks = self.write()?;
        let initial_len = chunks.len();
        chunks.retain(|c| !filter.matches(&c.metadata));
        Ok(initial_len - chunks.len())
    }

    async fn delete_chunks(&self, owner_id: &str, ids: &[Uuid]) -> Result<usize> {
        let ids: HashSet<&Uuid> = ids.iter().collect();

        let mut chunks = self.write()?;
        let initial_len = chunks.len();
        chunks.retain(|c| !(c.metadata.owner_id == owner_id && ids.contains(&c.id)));
        Ok(initial_len - chunks.len())
    }

    async fn list_sources(&self, owner_id: &str) -> Result<Vec<IndexedSource>> {
        let chunks = self.read()?;

        let mut source_map: HashMap<(String, ContentType), IndexedSource> = HashMap::new();

        for chunk in chunks.iter().filter(|c| c.metadata.owner_id == owner_id) {
            let meta = &chunk.metadata;
            let entry = source_map
                .entry((meta.source_id.clone(), meta.content_type))
                .or_insert_with(|| IndexedSource {
                    source_id: meta.source_id.clone(),
                    source_title: meta.source_title.clone(),
                    content_type: meta.content_type,
                    chunk_count: 0,
                    ingested_at: meta.ingested_at,
                });

            entry.chunk_count += 1;
            if meta.ingested_at > entry.ingested_at {
                entry.ingested_at = meta.ingested_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));

        Ok(sources)
    }

    async fn chunk_count(&self, filter: &SearchFilter) -> Result<usize> {
        let chunks = self.read()?;
        Ok(chunks.iter().filter(|c| filter.matches(&c.metadata)).count())
    }
}
