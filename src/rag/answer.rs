//! Answer assembly: context formatting, prompting and fallbacks.

use super::Query;
use crate::chat::ChatModel;
use crate::config::Prompts;
use crate::content::ContentType;
use crate::error::{Result, VidsageError};
use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Public excerpt of a retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub source_id: String,
    pub source_title: String,
    pub content_type: ContentType,
    pub content: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl From<&SearchResult> for Source {
    fn from(result: &SearchResult) -> Self {
        let meta = &result.chunk.metadata;
        Self {
            source_id: meta.source_id.clone(),
            source_title: meta.source_title.clone(),
            content_type: meta.content_type,
            content: result.chunk.content.clone(),
            score: result.score,
            extra: meta.extra.clone(),
        }
    }
}

/// Answer to a question, with the excerpts it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    /// Excerpts in retrieval order.
    pub sources: Vec<Source>,
    /// False when nothing relevant was found and a fallback was returned.
    pub has_answer: bool,
}

impl Answer {
    fn fallback(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sources: Vec::new(),
            has_answer: false,
        }
    }
}

/// Format retrieved chunks as numbered context blocks for the prompt.
pub fn format_context_for_prompt(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[Source {} - {}]\n{}",
                i + 1,
                r.chunk.metadata.source_title,
                r.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format sources for display to the user.
pub fn format_sources_for_display(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "[{}] {} ({}, score: {:.2})",
                i + 1,
                s.source_title,
                s.source_id,
                s.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns retrieved chunks into an answer.
pub struct AnswerAssembler {
    chat: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
}

impl AnswerAssembler {
    pub fn new(chat: Arc<dyn ChatModel>, prompts: Arc<Prompts>) -> Self {
        Self { chat, prompts }
    }

    /// Answer the query from the given chunks.
    ///
    /// With no chunks the content type's fallback message is returned and
    /// the chat model is not called.
    #[instrument(skip(self, query, chunks), fields(chunks = chunks.len()))]
    pub async fn answer(&self, query: &Query, chunks: Vec<SearchResult>) -> Result<Answer> {
        let prompts = self.prompts.rag.for_content(query.content_type());

        if chunks.is_empty() {
            info!("No relevant chunks, returning fallback answer");
            let text = if query.scope_id().is_some() {
                &prompts.no_scoped_content
            } else {
                &prompts.no_content
            };
            return Ok(Answer::fallback(text));
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), query.question().to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&chunks));

        let prompt = self.prompts.render_with_custom(&prompts.template, &vars);

        let text = self
            .chat
            .complete(&prompt)
            .await
            .map_err(|e| VidsageError::Chat(format!("Failed to generate answer: {}", e)))?;

        debug!("Generated answer with {} sources", chunks.len());

        Ok(Answer {
            text,
            sources: chunks.iter().map(Source::from).collect(),
            has_answer: true,
        })
    }
}
