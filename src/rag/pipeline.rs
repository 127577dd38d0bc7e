//! The question-answering pipeline, instantiated once per content type.

use super::{Answer, AnswerAssembler, Query, Retriever};
use crate::config::{Prompts, RetrievalSettings};
use crate::content::ContentType;
use crate::error::{Result, VidsageError};
use crate::orchestrator::RagServices;
use crate::vector_store::SearchResult;
use std::sync::Arc;
use tracing::{info, instrument};

/// Retrieval plus answer assembly for one content type.
pub struct RagPipeline {
    content_type: ContentType,
    retriever: Retriever,
    assembler: AnswerAssembler,
    retrieval: RetrievalSettings,
}

impl RagPipeline {
    pub fn new(
        content_type: ContentType,
        services: &RagServices,
        prompts: Arc<Prompts>,
        retrieval: &RetrievalSettings,
    ) -> Self {
        Self {
            content_type,
            retriever: Retriever::new(
                services.embedder.clone(),
                services.store.clone(),
                retrieval,
            ),
            assembler: AnswerAssembler::new(services.chat.clone(), prompts),
            retrieval: retrieval.clone(),
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Build a validated query for this pipeline.
    pub fn query(
        &self,
        question: &str,
        owner_id: &str,
        scope_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Query> {
        Ok(Query::new(question, owner_id, self.content_type)?
            .with_scope(scope_id)?
            .with_limit(limit, &self.retrieval))
    }

    fn check(&self, query: &Query) -> Result<()> {
        if query.content_type() != self.content_type {
            return Err(VidsageError::InvalidInput(format!(
                "A {} query cannot run on the {} pipeline",
                query.content_type(),
                self.content_type
            )));
        }
        Ok(())
    }

    /// Retrieve context and answer the question.
    #[instrument(skip(self, query), fields(content_type = %self.content_type))]
    pub async fn ask(&self, query: &Query) -> Result<Answer> {
        self.check(query)?;
        info!("Processing question: {}", query.question());

        let chunks = self.retriever.retrieve(query).await?;
        self.assembler.answer(query, chunks).await
    }

    /// Retrieval only, without calling the chat model.
    pub async fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        self.check(query)?;
        self.retriever.retrieve(query).await
    }
}
