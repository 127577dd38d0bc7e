//! In-crate fakes for exercising the pipeline without network access.

use crate::chat::ChatModel;
use crate::content::ContentType;
use crate::embedding::Embedder;
use crate::error::{Result, VidsageError};
use crate::vector_store::{
    IndexedSource, MemoryVectorStore, SearchFilter, SearchResult, StoredChunk, VectorStore,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Deterministic lexical embedder: lowercase word tokens hashed into signed
/// buckets, then L2-normalized. Texts sharing words score higher.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let hash = token
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
                    (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
                });
            let bucket = (hash % self.dimensions as u64) as usize;
            vector[bucket] += if hash >> 63 == 0 { 1.0 } else { -1.0 };
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Chat model that records prompts and replies from a script.
///
/// Replies are used in order; the last one repeats.
pub struct RecordingChat {
    replies: Vec<String>,
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl RecordingChat {
    pub fn new(reply: &str) -> Self {
        Self::with_replies(&[reply])
    }

    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatModel for RecordingChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        if self.fail {
            return Err(VidsageError::OpenAI("model unavailable".to_string()));
        }
        Ok(self
            .replies
            .get(call)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or_default())
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// Embedder whose `embed_batch` fails on selected calls (1-based).
///
/// Single-text `embed` always succeeds unless `fail_all` is set.
pub struct FailingEmbedder {
    inner: HashingEmbedder,
    fail_on_calls: Vec<usize>,
    fail_all: bool,
    calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn on_calls(fail_on_calls: Vec<usize>) -> Self {
        Self {
            inner: HashingEmbedder::new(64),
            fail_on_calls,
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always() -> Self {
        Self {
            fail_all: true,
            ..Self::on_calls(Vec::new())
        }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_all {
            return Err(VidsageError::Embedding("embedding service down".to_string()));
        }
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_all || self.fail_on_calls.contains(&call) {
            return Err(VidsageError::Embedding(format!("batch {} rejected", call)));
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Memory store that can reject writes and searches, and whose filtering
/// can be turned off.
pub struct FailingStore {
    inner: MemoryVectorStore,
    fail_inserts_on: Vec<usize>,
    fail_search: bool,
    fail_deletes: bool,
    native_filter: bool,
    honor_filter: bool,
    inserts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryVectorStore::new(),
            fail_inserts_on: Vec::new(),
            fail_search: false,
            fail_deletes: false,
            native_filter: true,
            honor_filter: true,
            inserts: AtomicUsize::new(0),
        }
    }

    /// Direct access to the wrapped store, for seeding and inspection.
    pub fn inner(&self) -> &MemoryVectorStore {
        &self.inner
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Claim native filtering but ignore the filter in `search`.
    pub fn leaking_filter(mut self) -> Self {
        self.honor_filter = false;
        self
    }

    /// Reject the given `insert_batch` calls (1-based).
    pub fn failing_inserts(mut self, calls: Vec<usize>) -> Self {
        self.fail_inserts_on = calls;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Ignore filters in `search` and report no native filtering.
    pub fn without_native_filter(mut self) -> Self {
        self.native_filter = false;
        self.honor_filter = false;
        self
    }
}

#[async_trait]
impl VectorStore for FailingStore {
    async fn insert(&self, chunk: &StoredChunk) -> Result<()> {
        self.inner.insert(chunk).await
    }

    async fn insert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let call = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_inserts_on.contains(&call) {
            return Err(VidsageError::VectorStore("disk full".to_string()));
        }
        self.inner.insert_batch(chunks).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        if self.fail_search {
            return Err(VidsageError::VectorStore("connection reset".to_string()));
        }
        let filter = if self.honor_filter { filter } else { None };
        self.inner.search(query_embedding, limit, filter).await
    }

    fn supports_native_filter(&self) -> bool {
        self.native_filter
    }

    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<StoredChunk>> {
        self.inner.fetch(filter).await
    }

    async fn delete_source(
        &self,
        owner_id: &str,
        source_id: &str,
        content_type: Option<ContentType>,
    ) -> Result<usize> {
        self.inner.delete_source(owner_id, source_id, content_type).await
    }

    async fn delete_chunks(&self, owner_id: &str, ids: &[Uuid]) -> Result<usize> {
        if self.fail_deletes {
            return Err(VidsageError::VectorStore("read-only replica".to_string()));
        }
        self.inner.delete_chunks(owner_id, ids).await
    }

    async fn list_sources(&self, owner_id: &str) -> Result<Vec<IndexedSource>> {
        self.inner.list_sources(owner_id).await
    }

    async fn chunk_count(&self, filter: &SearchFilter) -> Result<usize> {
        self.inner.chunk_count(filter).await
    }
}
