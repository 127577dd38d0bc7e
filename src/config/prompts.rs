//! Prompt templates for vidsage.
//!
//! Prompts can be customized by placing `rag.toml` or `analysis.toml` in the
//! custom prompts directory.

use crate::content::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub analysis: AnalysisPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Answer prompts, one set per content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub transcript: ContentPrompts,
    pub document: ContentPrompts,
    pub comment: ContentPrompts,
}

/// Prompt template and fallback answers for one content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPrompts {
    /// Answer template; `{{context}}` and `{{question}}` are substituted.
    pub template: String,
    /// Answer returned when nothing in the owner's library matched.
    pub no_content: String,
    /// Answer returned when nothing matched inside a scoped source.
    pub no_scoped_content: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            transcript: ContentPrompts {
                template: r#"You are a helpful assistant that answers questions based on YouTube video transcripts.
Use the following context from video transcripts to answer the user's question.

Context from video transcripts:
{{context}}

Question: {{question}}

Instructions:
1. Answer the question based ONLY on the provided context from the video transcripts
2. If the context doesn't contain enough information to answer the question, say "I don't have enough information in the video transcripts to answer this question."
3. Be specific and cite the relevant sources (e.g. [Source 1]) when possible
4. If the question is about multiple videos, make sure to distinguish between them
5. Keep your answer concise but informative

Answer:"#
                    .to_string(),
                no_content: "I don't have any video transcripts in your library to answer this question. Please upload and transcribe some videos first.".to_string(),
                no_scoped_content: "I don't have enough information about this specific video to answer your question.".to_string(),
            },
            document: ContentPrompts {
                template: r#"You are a helpful assistant that answers questions based on uploaded documents (PDF, DOC, DOCX).
Use the following context from documents to answer the user's question.

Context from documents:
{{context}}

Question: {{question}}

Instructions:
1. Answer the question based ONLY on the provided context from the documents
2. If the context doesn't contain enough information to answer the question, say "I don't have enough information in the uploaded documents to answer this question."
3. Be specific and cite the relevant sources (e.g. [Source 1]) when possible
4. If the question is about multiple documents, make sure to distinguish between them
5. Keep your answer concise but informative

Answer:"#
                    .to_string(),
                no_content: "I don't have any documents in your library to answer this question. Please upload some PDF or DOC files first.".to_string(),
                no_scoped_content: "I don't have enough information about this specific document to answer your question.".to_string(),
            },
            comment: ContentPrompts {
                template: r#"You are an AI assistant analyzing YouTube video comments. Based on the following comments, answer the user's question about the video's audience feedback.

Relevant comments:
{{context}}

Question: {{question}}

Instructions:
1. Answer ONLY from the comments above; if they are not enough to answer, say so clearly
2. Provide insights about viewer sentiment, common themes, or specific feedback
3. If the question is about sentiment trends, provide a breakdown
4. Reference the relevant sources (e.g. [Source 1]) when you quote a comment
5. Keep your answer concise

Answer:"#
                    .to_string(),
                no_content: "I couldn't find any relevant comments in your library to answer your question.".to_string(),
                no_scoped_content: "I couldn't find any relevant comments for this video to answer your question. The video might not have comments yet, or there might not be any comments that match your query.".to_string(),
            },
        }
    }
}

/// Prompts for describing a video and drafting viewer Q&A from its transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPrompts {
    /// Variables: `{{video_title}}`, `{{duration}}`, `{{transcript}}`.
    pub description: String,
    /// Variables: `{{video_title}}`, `{{description}}`, `{{transcript}}`.
    pub qa_pairs: String,
}

impl Default for AnalysisPrompts {
    fn default() -> Self {
        Self {
            description: r#"Based on the following video transcript, generate a comprehensive and engaging description of the video content.

Video Title: {{video_title}}
Video Duration: {{duration}}

Transcript:
{{transcript}}

Instructions:
1. Create a 2-3 paragraph description that summarizes the main topics and key points
2. Make it engaging and informative for someone who hasn't watched the video
3. Highlight the most important insights or takeaways
4. Keep the tone professional but accessible
5. Do not include timestamps or specific references to video segments

Description:"#
                .to_string(),
            qa_pairs: r#"Based on the following video transcript, generate 5-7 relevant question and answer pairs that would be commonly asked about this video content.

Video Title: {{video_title}}
Video Description: {{description}}

Transcript:
{{transcript}}

Instructions:
1. Generate diverse questions that cover different aspects of the video content
2. Questions should be practical and commonly asked by viewers
3. Answers should be comprehensive but concise (2-3 sentences each)
4. Include both high-level overview questions and specific detail questions
5. Make sure answers are based only on the transcript content
6. IMPORTANT: Return ONLY a valid JSON array, no other text

Return format (JSON array only):
[
  {
    "question": "What is the main topic of this video?",
    "answer": "The main topic is..."
  },
  {
    "question": "Who is this video for?",
    "answer": "This video is designed for..."
  }
]"#
                .to_string(),
        }
    }
}

impl RagPrompts {
    /// Prompts for the given content type.
    pub fn for_content(&self, content_type: ContentType) -> &ContentPrompts {
        match content_type {
            ContentType::Transcript => &self.transcript,
            ContentType::Document => &self.document,
            ContentType::Comment => &self.comment,
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let analysis_path = custom_path.join("analysis.toml");
            if analysis_path.exists() {
                let content = std::fs::read_to_string(&analysis_path)?;
                prompts.analysis = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in a single pass over the template, so text
    /// coming from a substituted value is never expanded again. Unknown
    /// placeholders are kept as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];

            let Some(close) = after.find("}}") else {
                result.push_str(&rest[open..]);
                return result;
            };

            let name = &after[..close];
            if !is_placeholder_name(name) {
                result.push_str("{{");
                rest = after;
                continue;
            }

            match vars.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(name);
                    result.push_str("}}");
                }
            }
            rest = &after[close + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
