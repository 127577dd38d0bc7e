//! YouTube comment records, sentiment tagging and comment insights.

use crate::rag::Answer;
use crate::vector_store::StoredChunk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const POSITIVE_WORDS: &[&str] = &[
    "great", "amazing", "awesome", "excellent", "perfect", "love", "good", "helpful", "thanks",
    "thank you", "wonderful", "fantastic", "brilliant", "outstanding", "superb", "incredible",
    "best", "recommend", "useful", "clear", "easy", "simple", "exactly", "looking for",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "worst", "hate", "horrible", "useless", "waste", "confusing",
    "difficult", "hard", "wrong", "error", "broken", "poor", "disappointing", "frustrating",
    "annoying", "stupid", "dumb", "sucks", "garbage", "trash",
];

/// Number of comments returned per polarity by [`CommentInsights`].
pub const TOP_COMMENTS: usize = 3;

/// Sentiment label attached to a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Rule-based classification by keyword counts.
    ///
    /// Keywords match as case-insensitive substrings; ties are neutral.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
        let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Read the `sentiment` field of a stored comment's metadata.
    pub fn from_extra(extra: &Map<String, Value>) -> Option<Self> {
        extra
            .get("sentiment")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One YouTube comment as supplied for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub text: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Classified from the text when absent.
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

fn default_author() -> String {
    "Unknown".to_string()
}

impl CommentRecord {
    pub fn new(text: impl Into<String>, author: impl Into<String>, like_count: u64) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            like_count,
            published_at: None,
            sentiment: None,
        }
    }

    /// Supplied sentiment, or the classified one.
    pub fn resolved_sentiment(&self) -> Sentiment {
        self.sentiment
            .unwrap_or_else(|| Sentiment::classify(&self.text))
    }

    fn published_label(&self) -> String {
        self.published_at
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Text block that gets chunked and embedded for this comment.
    pub fn to_document_text(&self, video_title: &str) -> String {
        format!(
            "Comment: {}\nAuthor: {}\nSentiment: {}\nLikes: {}\nDate: {}\nVideo: {}",
            self.text.trim(),
            self.author,
            self.resolved_sentiment(),
            self.like_count,
            self.published_label(),
            video_title
        )
    }

    /// Structured metadata stored beside every chunk of this comment.
    pub fn extra(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("author".to_string(), json!(self.author));
        extra.insert("sentiment".to_string(), json!(self.resolved_sentiment()));
        extra.insert("likeCount".to_string(), json!(self.like_count));
        extra.insert("publishedAt".to_string(), json!(self.published_at));
        extra.insert("originalText".to_string(), json!(self.text));
        extra
    }
}

/// Sentiment counts over a set of comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentBreakdown {
    /// Count sentiments; comments without a readable label count as neutral.
    pub fn from_extras<'a>(extras: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        let mut breakdown = Self::default();
        for extra in extras {
            match Sentiment::from_extra(extra) {
                Some(Sentiment::Positive) => breakdown.positive += 1,
                Some(Sentiment::Negative) => breakdown.negative += 1,
                _ => breakdown.neutral += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Answer to a question about comments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAnswer {
    #[serde(flatten)]
    pub answer: Answer,
    pub total_comments: usize,
    pub sentiment_breakdown: SentimentBreakdown,
}

impl CommentAnswer {
    pub fn new(answer: Answer) -> Self {
        let sentiment_breakdown =
            SentimentBreakdown::from_extras(answer.sources.iter().map(|s| &s.extra));
        Self {
            total_comments: answer.sources.len(),
            sentiment_breakdown,
            answer,
        }
    }
}

/// A comment excerpt shown in insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub text: String,
    pub author: String,
    pub likes: u64,
}

impl CommentSummary {
    fn from_chunk(chunk: &StoredChunk) -> Self {
        let extra = &chunk.metadata.extra;
        Self {
            text: extra
                .get("originalText")
                .and_then(Value::as_str)
                .unwrap_or(&chunk.content)
                .to_string(),
            author: extra
                .get("author")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            likes: extra.get("likeCount").and_then(Value::as_u64).unwrap_or(0),
        }
    }
}

/// Most-liked positive and negative comments plus sentiment counts for a video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentInsights {
    pub video_id: String,
    pub total_comments: usize,
    pub top_positive_comments: Vec<CommentSummary>,
    pub top_negative_comments: Vec<CommentSummary>,
    pub sentiment_trends: SentimentBreakdown,
}

impl CommentInsights {
    /// Summarize the stored chunks of one video's comments.
    ///
    /// A comment long enough to span several chunks is counted once, by its
    /// first chunk.
    pub fn from_chunks(video_id: &str, chunks: &[StoredChunk]) -> Self {
        let comments: Vec<&StoredChunk> = chunks
            .iter()
            .filter(|c| c.metadata.chunk_index == 0)
            .collect();

        let top = |sentiment: Sentiment| {
            let mut selected: Vec<CommentSummary> = comments
                .iter()
                .filter(|c| Sentiment::from_extra(&c.metadata.extra) == Some(sentiment))
                .map(|c| CommentSummary::from_chunk(c))
                .collect();
            selected.sort_by(|a, b| b.likes.cmp(&a.likes));
            selected.truncate(TOP_COMMENTS);
            selected
        };

        Self {
            video_id: video_id.to_string(),
            total_comments: comments.len(),
            top_positive_comments: top(Sentiment::Positive),
            top_negative_comments: top(Sentiment::Negative),
            sentiment_trends: SentimentBreakdown::from_extras(
                comments.iter().map(|c| &c.metadata.extra),
            ),
        }
    }
}
