//! Source identifier normalization.

use crate::content::ContentType;
use crate::error::{Result, VidsageError};
use regex::Regex;
use std::sync::OnceLock;

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("valid video id regex")
    })
}

/// Extract a YouTube video id from a URL or bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Non-watch URLs (playlists, channels) carry no single video
    if let Ok(url) = url::Url::parse(input) {
        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            let caps = video_id_regex().captures(&v)?;
            return caps.get(2).map(|m| m.as_str().to_string());
        }
    }

    let caps = video_id_regex().captures(input)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Normalize a user-supplied source id for storage.
///
/// Transcript and comment sources are YouTube videos: URLs and bare ids are
/// stored under the bare video id, and a URL without a video id is rejected.
/// Any other id, and every document id, is kept as given (trimmed).
pub fn normalize_source_id(content_type: ContentType, input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VidsageError::InvalidInput(
            "Source id must not be empty".to_string(),
        ));
    }

    match content_type {
        ContentType::Document => Ok(trimmed.to_string()),
        ContentType::Transcript | ContentType::Comment => {
            if let Some(video_id) = extract_video_id(trimmed) {
                return Ok(video_id);
            }
            if url::Url::parse(trimmed).is_ok() {
                return Err(VidsageError::InvalidInput(format!(
                    "Not a YouTube video URL: {}",
                    trimmed
                )));
            }
            Ok(trimmed.to_string())
        }
    }
}
