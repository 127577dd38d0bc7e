//! Service wiring for vidsage.
//!
//! Builds the embedding, vector store and chat clients once and exposes every
//! library operation behind a single [`Orchestrator`].

use crate::analysis::{rebuild_transcript, VideoAnalysis, VideoAnalyzer};
use crate::chat::{create_chat_model, ChatModel};
use crate::comments::{CommentAnswer, CommentInsights, CommentRecord};
use crate::config::{Prompts, Settings};
use crate::content::ContentType;
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VidsageError};
use crate::ingest::{IngestReport, IngestRequest, Ingestor};
use crate::rag::{Answer, RagPipeline, Source};
use crate::source::normalize_source_id;
use crate::vector_store::{create_vector_store, IndexedSource, SearchFilter, VectorStore};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The external services the pipeline depends on.
///
/// Constructed explicitly and passed in, so tests can substitute fakes.
#[derive(Clone)]
pub struct RagServices {
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    pub chat: Arc<dyn ChatModel>,
}

impl RagServices {
    /// Build the services described by the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            embedder: create_embedder(settings)?,
            store: create_vector_store(settings)?,
            chat: create_chat_model(settings)?,
        })
    }
}

fn require_owner(owner_id: &str) -> Result<&str> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(VidsageError::InvalidInput(
            "Owner id must not be empty".to_string(),
        ));
    }
    Ok(owner_id)
}

/// Entry point for ingestion, questions and library management.
pub struct Orchestrator {
    settings: Settings,
    services: RagServices,
    ingestor: Ingestor,
    transcripts: RagPipeline,
    documents: RagPipeline,
    comments: RagPipeline,
    analyzer: VideoAnalyzer,
}

impl Orchestrator {
    /// Create an orchestrator with the services described by the settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let services = RagServices::from_settings(&settings)?;
        Self::with_services(settings, services)
    }

    /// Create an orchestrator with custom services.
    pub fn with_services(settings: Settings, services: RagServices) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Arc::new(Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?);

        let ingestor =
            Ingestor::from_settings(services.embedder.clone(), services.store.clone(), &settings)?;

        let pipeline = |content_type| {
            RagPipeline::new(content_type, &services, prompts.clone(), &settings.retrieval)
        };
        let transcripts = pipeline(ContentType::Transcript);
        let documents = pipeline(ContentType::Document);
        let comments = pipeline(ContentType::Comment);
        let analyzer = VideoAnalyzer::new(
            services.chat.clone(),
            prompts.clone(),
            settings.analysis.max_transcript_chars,
        );

        info!(
            "Initialized pipelines (embedding dims: {}, chat model: {})",
            services.embedder.dimensions(),
            services.chat.model()
        );

        Ok(Self {
            settings,
            services,
            ingestor,
            transcripts,
            documents,
            comments,
            analyzer,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn services(&self) -> &RagServices {
        &self.services
    }

    /// The pipeline answering questions about one content type.
    pub fn pipeline(&self, content_type: ContentType) -> &RagPipeline {
        match content_type {
            ContentType::Transcript => &self.transcripts,
            ContentType::Document => &self.documents,
            ContentType::Comment => &self.comments,
        }
    }

    /// Ingest already-extracted text.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        self.ingestor.ingest(request).await
    }

    /// Ingest a video's comments.
    pub async fn ingest_comments(
        &self,
        owner_id: &str,
        video_id: &str,
        video_title: &str,
        comments: &[CommentRecord],
    ) -> Result<IngestReport> {
        let owner_id = require_owner(owner_id)?;
        self.ingestor
            .ingest_comments(owner_id, video_id, video_title, comments)
            .await
    }

    /// Answer a question about one content type of the owner's library.
    #[instrument(skip(self, question))]
    pub async fn ask(
        &self,
        content_type: ContentType,
        owner_id: &str,
        question: &str,
        scope_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Answer> {
        let pipeline = self.pipeline(content_type);
        let query = pipeline.query(question, owner_id, scope_id, limit)?;
        pipeline.ask(&query).await
    }

    /// Answer a question about comments, with a sentiment breakdown of the
    /// comments the answer used.
    pub async fn ask_comments(
        &self,
        owner_id: &str,
        question: &str,
        video_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<CommentAnswer> {
        let answer = self
            .ask(ContentType::Comment, owner_id, question, video_id, limit)
            .await?;
        Ok(CommentAnswer::new(answer))
    }

    /// Retrieve matching excerpts without generating an answer.
    pub async fn search(
        &self,
        content_type: ContentType,
        owner_id: &str,
        question: &str,
        scope_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Source>> {
        let pipeline = self.pipeline(content_type);
        let query = pipeline.query(question, owner_id, scope_id, limit)?;
        let results = pipeline.search(&query).await?;
        Ok(results.iter().map(Source::from).collect())
    }

    /// List the sources the owner has ingested.
    pub async fn list_sources(&self, owner_id: &str) -> Result<Vec<IndexedSource>> {
        let owner_id = require_owner(owner_id)?;
        self.services.store.list_sources(owner_id).await
    }

    /// Delete the owner's chunks for a source, of one content type or all.
    pub async fn delete_source(
        &self,
        owner_id: &str,
        source_id: &str,
        content_type: Option<ContentType>,
    ) -> Result<usize> {
        let owner_id = require_owner(owner_id)?;
        let source_id = normalize_source_id(
            content_type.unwrap_or(ContentType::Document),
            source_id,
        )?;

        let deleted = self
            .services
            .store
            .delete_source(owner_id, &source_id, content_type)
            .await?;
        info!("Deleted {} chunks of {} for {}", deleted, source_id, owner_id);
        Ok(deleted)
    }

    /// Top comments and sentiment counts for one of the owner's videos.
    pub async fn comment_insights(&self, owner_id: &str, video_id: &str) -> Result<CommentInsights> {
        let owner_id = require_owner(owner_id)?;
        let video_id = normalize_source_id(ContentType::Comment, video_id)?;

        let filter = SearchFilter::owner(owner_id)
            .with_content_type(ContentType::Comment)
            .with_source(&video_id);
        let chunks = self.services.store.fetch(&filter).await?;

        Ok(CommentInsights::from_chunks(&video_id, &chunks))
    }

    /// Generate a description and viewer Q&A from the owner's latest
    /// ingested transcript of a video.
    #[instrument(skip(self))]
    pub async fn analyze_video(
        &self,
        owner_id: &str,
        video_id: &str,
        duration_secs: Option<u64>,
    ) -> Result<VideoAnalysis> {
        let owner_id = require_owner(owner_id)?;
        let video_id = normalize_source_id(ContentType::Transcript, video_id)?;

        let filter = SearchFilter::owner(owner_id)
            .with_content_type(ContentType::Transcript)
            .with_source(&video_id);
        let chunks = self.services.store.fetch(&filter).await?;

        let Some(latest) = chunks.iter().map(|c| c.metadata.ingested_at).max() else {
            return Err(VidsageError::NotFound(format!(
                "No transcript for {} in {}'s library",
                video_id, owner_id
            )));
        };
        let chunks: Vec<_> = chunks
            .into_iter()
            .filter(|c| c.metadata.ingested_at == latest)
            .collect();
        let video_title = chunks[0].metadata.source_title.clone();

        let transcript = rebuild_transcript(&chunks, self.settings.chunking.chunk_overlap);
        debug!("Rebuilt {} chars from {} chunks", transcript.len(), chunks.len());

        self.analyzer
            .analyze(&video_id, &video_title, &transcript, duration_secs)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::Sentiment;
    use crate::config::{FilterMode, VectorStoreProvider};
    use crate::testing::{FailingStore, HashingEmbedder, RecordingChat};
    use crate::vector_store::{MemoryVectorStore, SqliteVectorStore};

    struct Harness {
        orchestrator: Orchestrator,
        chat: Arc<RecordingChat>,
        store: Arc<dyn VectorStore>,
    }

    fn harness_with(store: Arc<dyn VectorStore>, filter_mode: FilterMode) -> Harness {
        let mut settings = Settings::default();
        settings.vector_store.provider = VectorStoreProvider::Memory;
        settings.retrieval.filter_mode = filter_mode;

        let chat = Arc::new(RecordingChat::new("The video discusses testing. [Source 1]"));
        let services = RagServices {
            embedder: Arc::new(HashingEmbedder::new(128)),
            store: store.clone(),
            chat: chat.clone(),
        };

        Harness {
            orchestrator: Orchestrator::with_services(settings, services).unwrap(),
            chat,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(MemoryVectorStore::new()), FilterMode::Native)
    }

    const TRANSCRIPT: &str = "Discussing unit testing and CI pipelines in software engineering.";

    async fn ingest_transcript(orchestrator: &Orchestrator, owner: &str, video: &str, text: &str) {
        orchestrator
            .ingest(IngestRequest::new(
                owner,
                ContentType::Transcript,
                video,
                format!("Video {}", video),
                text,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_scenario_answer_from_own_transcript() {
        let h = harness();
        ingest_transcript(&h.orchestrator, "u1", "v1", TRANSCRIPT).await;

        let answer = h
            .orchestrator
            .ask(ContentType::Transcript, "u1", "What does the video discuss?", None, None)
            .await
            .unwrap();

        assert!(answer.has_answer);
        assert!(answer.sources.iter().any(|s| s.source_id == "v1"));
        assert_eq!(h.chat.calls(), 1);
    }

    #[tokio::test]
    async fn test_scenario_other_owner_gets_fallback() {
        let h = harness();
        ingest_transcript(&h.orchestrator, "u1", "v1", TRANSCRIPT).await;

        let answer = h
            .orchestrator
            .ask(ContentType::Transcript, "u2", "What does the video discuss?", None, None)
            .await
            .unwrap();

        assert!(!answer.has_answer);
        assert!(answer.sources.is_empty());
        assert_eq!(answer.text, Prompts::default().rag.transcript.no_content);
        assert_eq!(h.chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_padded_owner_id_round_trips() {
        let h = harness();
        ingest_transcript(&h.orchestrator, "u1 ", "v1", TRANSCRIPT).await;

        let answer = h
            .orchestrator
            .ask(ContentType::Transcript, "u1 ", "What does the video discuss?", None, None)
            .await
            .unwrap();
        assert!(answer.has_answer);
        assert_eq!(answer.sources[0].source_id, "v1");

        let sources = h.orchestrator.list_sources(" u1").await.unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_comment_scoped_by_content_type() {
        let h = harness();
        let mut comment = CommentRecord::new("This tutorial was amazing, thank you!", "alice", 3);
        comment.sentiment = Some(Sentiment::Positive);
        h.orchestrator
            .ingest_comments("u1", "v1", "Testing 101", &[comment])
            .await
            .unwrap();

        let comments = h
            .orchestrator
            .search(ContentType::Comment, "u1", "amazing tutorial", Some("v1"), None)
            .await
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].extra["sentiment"], "positive");

        let transcripts = h
            .orchestrator
            .search(ContentType::Transcript, "u1", "amazing tutorial", Some("v1"), None)
            .await
            .unwrap();
        assert!(transcripts.is_empty());

        let answer = h
            .orchestrator
            .ask_comments("u1", "How do viewers feel?", Some("v1"), None)
            .await
            .unwrap();
        assert!(answer.answer.has_answer);
        assert_eq!(answer.total_comments, 1);
        assert_eq!(answer.sentiment_breakdown.positive, 1);
    }

    #[tokio::test]
    async fn test_owner_isolation_with_post_filter() {
        let store: Arc<dyn VectorStore> = Arc::new(FailingStore::new().without_native_filter());
        let h = harness_with(store, FilterMode::Post);

        for i in 0..5 {
            ingest_transcript(&h.orchestrator, "u2", &format!("other-{}", i), TRANSCRIPT).await;
        }
        ingest_transcript(&h.orchestrator, "u1", "v1", "Cooking pasta for beginners.").await;

        let sources = h
            .orchestrator
            .search(ContentType::Transcript, "u1", TRANSCRIPT, None, Some(2))
            .await
            .unwrap();
        assert!(sources.is_empty());

        let sources = h
            .orchestrator
            .search(ContentType::Transcript, "u1", TRANSCRIPT, None, Some(10))
            .await
            .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id, "v1");
    }

    #[tokio::test]
    async fn test_owner_isolation_with_sqlite_store() {
        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::in_memory().unwrap());
        let h = harness_with(store, FilterMode::Native);
        ingest_transcript(&h.orchestrator, "u1", "v1", TRANSCRIPT).await;
        ingest_transcript(&h.orchestrator, "u2", "v2", TRANSCRIPT).await;

        let sources = h
            .orchestrator
            .search(ContentType::Transcript, "u2", TRANSCRIPT, None, None)
            .await
            .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id, "v2");
    }

    #[tokio::test]
    async fn test_result_limit_is_bounded() {
        let h = harness();
        for i in 0..12 {
            ingest_transcript(&h.orchestrator, "u1", &format!("v{}", i), TRANSCRIPT).await;
        }

        let search = |limit| {
            h.orchestrator
                .search(ContentType::Transcript, "u1", "unit testing", None, limit)
        };
        assert_eq!(search(None).await.unwrap().len(), 4);
        assert_eq!(search(Some(10)).await.unwrap().len(), 10);
        assert_eq!(search(Some(50)).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_backends() {
        let h = harness();

        let err = h
            .orchestrator
            .ask(ContentType::Document, "u1", "  ", None, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        let err = h
            .orchestrator
            .ask(ContentType::Document, "u1", "q", Some(" "), None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(h.chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_and_delete_sources() {
        let h = harness();
        ingest_transcript(&h.orchestrator, "u1", "v1", TRANSCRIPT).await;
        ingest_transcript(&h.orchestrator, "u2", "v1", TRANSCRIPT).await;

        let sources = h.orchestrator.list_sources("u1").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_title, "Video v1");

        let deleted = h
            .orchestrator
            .delete_source("u1", "v1", Some(ContentType::Transcript))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(h.orchestrator.list_sources("u1").await.unwrap().is_empty());
        assert_eq!(
            h.store.chunk_count(&SearchFilter::owner("u2")).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_comment_insights() {
        let h = harness();
        let comments = vec![
            CommentRecord::new("Great explanation", "a", 10),
            CommentRecord::new("Awesome pacing", "b", 30),
            CommentRecord::new("Terrible audio quality", "c", 5),
        ];
        h.orchestrator
            .ingest_comments("u1", "v1", "Testing 101", &comments)
            .await
            .unwrap();
        h.orchestrator
            .ingest_comments("u2", "v1", "Testing 101", &comments[..1])
            .await
            .unwrap();

        let insights = h.orchestrator.comment_insights("u1", "v1").await.unwrap();
        assert_eq!(insights.total_comments, 3);
        assert_eq!(insights.top_positive_comments[0].author, "b");
        assert_eq!(insights.top_negative_comments[0].author, "c");
        assert_eq!(insights.sentiment_trends.positive, 2);
        assert_eq!(h.chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_video_uses_latest_transcript() {
        let h = harness();
        ingest_transcript(&h.orchestrator, "u1", "v1", "An older cut about gardening.").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        ingest_transcript(&h.orchestrator, "u1", "v1", TRANSCRIPT).await;
        ingest_transcript(&h.orchestrator, "u2", "v1", "Someone else's transcript.").await;

        let analysis = h.orchestrator.analyze_video("u1", "v1", Some(90)).await.unwrap();
        assert_eq!(analysis.video_id, "v1");
        assert_eq!(analysis.video_title, "Video v1");
        assert_eq!(analysis.description, "The video discusses testing. [Source 1]");
        assert!(analysis.qa_pairs.is_empty());
        assert_eq!(h.chat.calls(), 2);

        let prompt = h.chat.prompts()[0].clone();
        assert!(prompt.contains(TRANSCRIPT));
        assert!(prompt.contains("1:30"));
        assert!(!prompt.contains("gardening"));
        assert!(!prompt.contains("Someone else"));
    }

    #[tokio::test]
    async fn test_analyze_unknown_video_is_not_found() {
        let h = harness();
        ingest_transcript(&h.orchestrator, "u1", "v1", TRANSCRIPT).await;

        let err = h.orchestrator.analyze_video("u2", "v1", None).await.unwrap_err();
        assert!(matches!(err, VidsageError::NotFound(_)));
        let err = h.orchestrator.analyze_video("u1", "v2", None).await.unwrap_err();
        assert!(matches!(err, VidsageError::NotFound(_)));
        assert_eq!(h.chat.calls(), 0);
    }
}
