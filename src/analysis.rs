//! Video analysis: a generated description and viewer Q&A for one transcript.

use crate::chat::ChatModel;
use crate::config::{AnalysisPrompts, Prompts};
use crate::error::{Result, VidsageError};
use crate::vector_store::StoredChunk;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One drafted viewer question with its answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Description and Q&A generated for a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub video_id: String,
    pub video_title: String,
    pub description: String,
    pub qa_pairs: Vec<QaPair>,
}

/// Generates [`VideoAnalysis`] values with a chat model.
pub struct VideoAnalyzer {
    chat: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
    max_transcript_chars: usize,
}

impl VideoAnalyzer {
    pub fn new(chat: Arc<dyn ChatModel>, prompts: Arc<Prompts>, max_transcript_chars: usize) -> Self {
        Self {
            chat,
            prompts,
            max_transcript_chars,
        }
    }

    fn templates(&self) -> &AnalysisPrompts {
        &self.prompts.analysis
    }

    /// Describe the video, then draft Q&A pairs from the description.
    ///
    /// A failed description is an error. A Q&A reply that cannot be parsed
    /// yields no pairs.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn analyze(
        &self,
        video_id: &str,
        video_title: &str,
        transcript: &str,
        duration_secs: Option<u64>,
    ) -> Result<VideoAnalysis> {
        let transcript = truncate_chars(transcript, self.max_transcript_chars);

        let mut vars = HashMap::new();
        vars.insert("video_title".to_string(), video_title.to_string());
        vars.insert("transcript".to_string(), transcript.to_string());
        vars.insert(
            "duration".to_string(),
            duration_secs.map_or_else(|| "Unknown".to_string(), format_duration),
        );

        let prompt = self.prompts.render_with_custom(&self.templates().description, &vars);
        let description = self
            .chat
            .complete(&prompt)
            .await
            .map_err(|e| VidsageError::Chat(format!("Failed to generate description: {}", e)))?
            .trim()
            .to_string();

        vars.insert("description".to_string(), description.clone());
        let prompt = self.prompts.render_with_custom(&self.templates().qa_pairs, &vars);
        let qa_pairs = match self.chat.complete(&prompt).await {
            Ok(reply) => parse_qa_pairs(&reply),
            Err(e) => {
                warn!("Failed to generate Q&A pairs: {}", e);
                Vec::new()
            }
        };

        debug!("Generated {} Q&A pairs", qa_pairs.len());
        Ok(VideoAnalysis {
            video_id: video_id.to_string(),
            video_title: video_title.to_string(),
            description,
            qa_pairs,
        })
    }
}

/// Extract a JSON array of question/answer objects from a model reply.
///
/// The array may be wrapped in prose or a code fence. Missing fields become
/// empty strings; anything unparseable yields no pairs.
pub fn parse_qa_pairs(reply: &str) -> Vec<QaPair> {
    let (Some(open), Some(close)) = (reply.find('['), reply.rfind(']')) else {
        warn!("Q&A reply contained no JSON array");
        return Vec::new();
    };
    if close < open {
        warn!("Q&A reply contained no JSON array");
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(&reply[open..=close]) {
        Ok(Value::Array(items)) => items,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!("Failed to parse Q&A reply: {}", e);
            return Vec::new();
        }
    };

    let field = |item: &Value, name: &str| {
        item.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    items
        .iter()
        .map(|item| QaPair {
            question: field(item, "question"),
            answer: field(item, "answer"),
        })
        .collect()
}

/// Reassemble transcript text from its stored chunks.
///
/// Chunks are ordered by index. When consecutive chunks share exactly
/// `overlap` characters, the repeated prefix is dropped; otherwise the chunks
/// are joined with a newline.
pub fn rebuild_transcript(chunks: &[StoredChunk], overlap: usize) -> String {
    let mut ordered: Vec<&StoredChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.metadata.chunk_index);

    let mut text = String::new();
    let mut previous: Option<&StoredChunk> = None;

    for chunk in ordered {
        let content = chunk.content.as_str();
        match previous {
            None => text.push_str(content),
            Some(prev) => {
                let consecutive = chunk.metadata.chunk_index == prev.metadata.chunk_index + 1;
                match shared_prefix(&prev.content, content, overlap) {
                    Some(rest) if consecutive => text.push_str(rest),
                    _ => {
                        text.push('\n');
                        text.push_str(content);
                    }
                }
            }
        }
        previous = Some(chunk);
    }

    text
}

/// The rest of `next` when it starts with the last `overlap` chars of `prev`.
fn shared_prefix<'a>(prev: &str, next: &'a str, overlap: usize) -> Option<&'a str> {
    let prev_len = prev.chars().count();
    if overlap == 0 || prev_len < overlap {
        return None;
    }
    let tail_start = prev.char_indices().nth(prev_len - overlap).map(|(i, _)| i)?;
    let tail = &prev[tail_start..];
    next.strip_prefix(tail)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

fn format_duration(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
