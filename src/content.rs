//! Content types that flow through the pipeline.

use serde::{Deserialize, Serialize};

/// Kind of content a chunk was produced from.
///
/// Each variant gets its own prompt, fallback answers and retrieval filter,
/// but all of them share one ingestion and retrieval implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// A YouTube video transcript.
    Transcript,
    /// Text extracted from an uploaded document.
    Document,
    /// A YouTube comment, denormalized with its author and sentiment.
    Comment,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [
        ContentType::Transcript,
        ContentType::Document,
        ContentType::Comment,
    ];

    /// Stable string form used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Transcript => "transcript",
            ContentType::Document => "document",
            ContentType::Comment => "comment",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transcript" | "video" => Ok(ContentType::Transcript),
            "document" | "doc" => Ok(ContentType::Document),
            "comment" | "comments" => Ok(ContentType::Comment),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("video".parse::<ContentType>().unwrap(), ContentType::Transcript);
        assert_eq!("Document".parse::<ContentType>().unwrap(), ContentType::Document);
        assert_eq!("comments".parse::<ContentType>().unwrap(), ContentType::Comment);
        assert!("podcast".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_as_str_round_trips_through_serde() {
        for content_type in ContentType::ALL {
            let json = serde_json::to_string(&content_type).unwrap();
            assert_eq!(json, format!("\"{}\"", content_type.as_str()));
        }
    }
}
