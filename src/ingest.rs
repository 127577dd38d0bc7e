//! Ingestion pipeline: chunk, embed and store raw text for one owner.
//!
//! Ingestion is best-effort. Batches that fail to embed or store are reported
//! in [`IngestReport::failed`] while the remaining batches are still written.

use crate::chunking::{create_splitter, Splitter};
use crate::comments::CommentRecord;
use crate::config::Settings;
use crate::content::ContentType;
use crate::embedding::Embedder;
use crate::error::{Result, VidsageError};
use crate::source::normalize_source_id;
use crate::vector_store::{ChunkMetadata, SearchFilter, StoredChunk, VectorStore};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Raw text to ingest for one source.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub raw_text: String,
    pub owner_id: String,
    pub content_type: ContentType,
    pub source_id: String,
    pub source_title: String,
    /// Content-type-specific metadata copied onto every chunk.
    pub extra: Map<String, Value>,
    /// Remove this owner's existing chunks for the source once the new ones are stored.
    pub replace_existing: bool,
}

impl IngestRequest {
    pub fn new(
        owner_id: impl Into<String>,
        content_type: ContentType,
        source_id: impl Into<String>,
        source_title: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            owner_id: owner_id.into(),
            content_type,
            source_id: source_id.into(),
            source_title: source_title.into(),
            extra: Map::new(),
            replace_existing: false,
        }
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn replacing(mut self, replace_existing: bool) -> Self {
        self.replace_existing = replace_existing;
        self
    }
}

/// Pipeline stage at which a chunk was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Embedding,
    Store,
}

/// A chunk that was not written.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedChunk {
    pub index: u32,
    pub stage: FailureStage,
    pub error: String,
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub source_id: String,
    pub chunks_total: usize,
    pub chunks_written: usize,
    /// Previous chunks removed by `replace_existing`.
    pub chunks_replaced: usize,
    pub failed: Vec<FailedChunk>,
}

impl IngestReport {
    /// Whether every chunk was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.chunks_written == self.chunks_total
    }

    /// Fold another report for the same source into this one.
    pub fn merge(&mut self, other: IngestReport) {
        let offset = self.chunks_total as u32;
        self.chunks_total += other.chunks_total;
        self.chunks_written += other.chunks_written;
        self.chunks_replaced += other.chunks_replaced;
        self.failed.extend(other.failed.into_iter().map(|mut f| {
            f.index += offset;
            f
        }));
    }
}

/// Chunks, embeds and stores text.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    splitter: Box<dyn Splitter>,
    batch_size: usize,
    min_text_chars: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        splitter: Box<dyn Splitter>,
        settings: &Settings,
    ) -> Self {
        Self {
            embedder,
            store,
            splitter,
            batch_size: settings.embedding.batch_size.max(1),
            min_text_chars: settings.ingestion.min_text_chars,
        }
    }

    /// Build an ingestor with the splitter described by the settings.
    pub fn from_settings(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: &Settings,
    ) -> Result<Self> {
        let splitter = create_splitter(&settings.chunking)?;
        Ok(Self::new(embedder, store, splitter, settings))
    }

    /// Check the request and return the owner id as it will be stored.
    fn validate<'a>(&self, request: &'a IngestRequest) -> Result<&'a str> {
        let owner_id = request.owner_id.trim();
        if owner_id.is_empty() {
            return Err(VidsageError::InvalidInput(
                "Owner id must not be empty".to_string(),
            ));
        }

        let text_chars = request.raw_text.trim().chars().count();
        if text_chars < self.min_text_chars {
            return Err(VidsageError::InvalidInput(format!(
                "Text is too short to ingest ({} chars, need at least {})",
                text_chars, self.min_text_chars
            )));
        }
        Ok(owner_id)
    }

    /// Ingest one source.
    ///
    /// Returns `Err(Ingestion)` only when no chunk could be written. With
    /// `replace_existing`, the previous chunks are removed only after at
    /// least one new chunk was stored.
    #[instrument(skip(self, request), fields(owner = %request.owner_id, content_type = %request.content_type))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        let owner_id = self.validate(&request)?;
        let source_id = normalize_source_id(request.content_type, &request.source_id)?;

        let texts = self.splitter.split(request.raw_text.trim());
        if texts.is_empty() {
            return Err(VidsageError::InvalidInput(
                "Text produced no chunks".to_string(),
            ));
        }

        let mut report = IngestReport {
            source_id: source_id.clone(),
            chunks_total: texts.len(),
            ..Default::default()
        };

        let previous: Vec<Uuid> = if request.replace_existing {
            let filter = SearchFilter::owner(owner_id)
                .with_content_type(request.content_type)
                .with_source(source_id.clone());
            self.store
                .fetch(&filter)
                .await
                .map_err(|e| {
                    VidsageError::Ingestion(format!("Failed to look up previous chunks: {}", e))
                })?
                .into_iter()
                .map(|chunk| chunk.id)
                .collect()
        } else {
            Vec::new()
        };

        let ingested_at = Utc::now();

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            let first_index = batch_no * self.batch_size;
            let indices = (first_index..first_index + batch.len()).map(|i| i as u32);

            let embeddings = match self.embedder.embed_batch(batch).await {
                Ok(embeddings) if embeddings.len() == batch.len() => embeddings,
                Ok(embeddings) => {
                    let error = format!(
                        "Expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    );
                    warn!("Embedding batch {} failed: {}", batch_no, error);
                    report.failed.extend(indices.map(|index| FailedChunk {
                        index,
                        stage: FailureStage::Embedding,
                        error: error.clone(),
                    }));
                    continue;
                }
                Err(e) => {
                    warn!("Embedding batch {} failed: {}", batch_no, e);
                    let error = e.to_string();
                    report.failed.extend(indices.map(|index| FailedChunk {
                        index,
                        stage: FailureStage::Embedding,
                        error: error.clone(),
                    }));
                    continue;
                }
            };

            let chunks: Vec<StoredChunk> = batch
                .iter()
                .zip(embeddings)
                .zip(indices.clone())
                .map(|((content, embedding), chunk_index)| {
                    StoredChunk::new(
                        content.clone(),
                        embedding,
                        ChunkMetadata {
                            owner_id: owner_id.to_string(),
                            content_type: request.content_type,
                            source_id: source_id.clone(),
                            source_title: request.source_title.clone(),
                            chunk_index,
                            ingested_at,
                            extra: request.extra.clone(),
                        },
                    )
                })
                .collect();

            match self.store.insert_batch(&chunks).await {
                Ok(written) => report.chunks_written += written,
                Err(e) => {
                    warn!("Storing batch {} failed: {}", batch_no, e);
                    let error = e.to_string();
                    report.failed.extend(indices.map(|index| FailedChunk {
                        index,
                        stage: FailureStage::Store,
                        error: error.clone(),
                    }));
                }
            }
        }

        if report.chunks_written == 0 {
            let cause = report
                .failed
                .first()
                .map(|f| f.error.clone())
                .unwrap_or_else(|| "nothing written".to_string());
            return Err(VidsageError::Ingestion(format!(
                "All {} chunks of {} failed: {}",
                report.chunks_total, source_id, cause
            )));
        }

        if !previous.is_empty() {
            report.chunks_replaced = self
                .store
                .delete_chunks(owner_id, &previous)
                .await
                .map_err(|e| {
                    VidsageError::Ingestion(format!(
                        "Stored {} new chunks for {} but failed to remove the previous ones: {}",
                        report.chunks_written, source_id, e
                    ))
                })?;
            debug!("Replaced {} existing chunks", report.chunks_replaced);
        }

        info!(
            "Ingested {}/{} chunks for {} {}",
            report.chunks_written, report.chunks_total, request.content_type, source_id
        );

        Ok(report)
    }

    /// Ingest a video's comments, one denormalized text per comment.
    ///
    /// Comments too short to ingest are skipped; the call fails only when no
    /// comment could be written.
    #[instrument(skip(self, comments), fields(count = comments.len()))]
    pub async fn ingest_comments(
        &self,
        owner_id: &str,
        video_id: &str,
        video_title: &str,
        comments: &[CommentRecord],
    ) -> Result<IngestReport> {
        if comments.is_empty() {
            return Err(VidsageError::InvalidInput(
                "No comments to ingest".to_string(),
            ));
        }

        let video_id = normalize_source_id(ContentType::Comment, video_id)?;
        let mut report = IngestReport {
            source_id: video_id.clone(),
            ..Default::default()
        };
        let mut last_error = None;

        for comment in comments {
            if comment.text.trim().is_empty() {
                debug!("Skipping empty comment by {}", comment.author);
                continue;
            }

            let mut extra = comment.extra();
            extra.insert("videoTitle".to_string(), Value::String(video_title.to_string()));

            let request = IngestRequest::new(
                owner_id,
                ContentType::Comment,
                video_id.clone(),
                video_title,
                comment.to_document_text(video_title),
            )
            .with_extra(extra);

            match self.ingest(request).await {
                Ok(comment_report) => report.merge(comment_report),
                Err(e) if e.is_invalid_input() => return Err(e),
                Err(e) => {
                    warn!("Comment by {} not ingested: {}", comment.author, e);
                    last_error = Some(e);
                }
            }
        }

        if report.chunks_written == 0 {
            return Err(last_error.unwrap_or_else(|| {
                VidsageError::InvalidInput("No comments to ingest".to_string())
            }));
        }

        info!(
            "Ingested {} comment chunks for video {}",
            report.chunks_written, video_id
        );
        Ok(report)
    }
}
