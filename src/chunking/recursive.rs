//! Boundary-preferring fixed-window splitter.
//!
//! Each window ends at the strongest boundary it contains: paragraph, line,
//! sentence, word, and only then a hard cut. The next window starts exactly
//! `chunk_overlap` characters before the previous one ended.

use super::{ChunkingConfig, Splitter};
use crate::error::Result;

/// Separators in priority order.
const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// Recursive character splitter with overlap.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: ChunkingConfig,
    separators: Vec<Vec<char>>,
}

impl RecursiveSplitter {
    /// Create a splitter, rejecting configurations that cannot make progress.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.chars().collect()).collect(),
        })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Pick the end of the window `[start, limit)`.
    ///
    /// A boundary is accepted only in the back half of the window and past the
    /// overlap, so the following window always starts after `start`.
    fn find_break(&self, chars: &[char], start: usize, limit: usize) -> usize {
        let min_end = start + (self.config.chunk_overlap + 1).max(self.config.chunk_size / 2);

        for sep in &self.separators {
            if sep.len() > limit - start {
                continue;
            }
            let mut pos = limit - sep.len();
            loop {
                let end = pos + sep.len();
                if end < min_end {
                    break;
                }
                if chars[pos..end] == sep[..] {
                    return end;
                }
                if pos == start {
                    break;
                }
                pos -= 1;
            }
        }

        limit
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.chars().collect()).collect(),
        }
    }
}

impl Splitter for RecursiveSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            if chars.len() - start <= size {
                push_chunk(&mut chunks, &chars[start..]);
                break;
            }

            let end = self.find_break(&chars, start, start + size);
            push_chunk(&mut chunks, &chars[start..end]);
            start = end - overlap;
        }

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &[char]) {
    if window.iter().any(|c| !c.is_whitespace()) {
        chunks.push(window.iter().collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
        .unwrap()
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..12 {
            for s in 0..6 {
                text.push_str(&format!(
                    "Paragraph {} sentence {} talks about continuous integration and unit testing. ",
                    p, s
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_empty_and_blank_input() {
        let s = RecursiveSplitter::default();
        assert!(s.split("").is_empty());
        assert!(s.split("   \n\n\t ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let s = RecursiveSplitter::default();
        let text = "Discussing unit testing and CI pipelines in software engineering.";
        assert_eq!(s.split(text), vec![text.to_string()]);
    }

    #[test]
    fn test_deterministic() {
        let s = RecursiveSplitter::default();
        let text = sample_text();
        assert_eq!(s.split(&text), s.split(&text));
    }

    #[test]
    fn test_window_bound_and_exact_overlap() {
        let s = splitter(300, 60);
        let text = sample_text();
        let chunks = s.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 300, "chunk too long: {}", char_len(chunk));
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(prev[prev.len() - 60..], next[..60]);
        }
    }

    #[test]
    fn test_default_window_on_long_text() {
        let s = RecursiveSplitter::default();
        let chunks = s.split(&sample_text());
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| char_len(c) <= 1000));
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let s = splitter(300, 60);
        let chunks = s.split(&sample_text());
        for chunk in &chunks[..chunks.len() - 1] {
            let trimmed = chunk.trim_end();
            assert!(trimmed.ends_with('.'), "chunk did not end on a sentence: {:?}", trimmed);
        }
    }

    #[test]
    fn test_prefers_paragraph_over_sentence() {
        let s = splitter(100, 10);
        let text = format!("{}\n\n{}", "a".repeat(70), "b. ".repeat(40));
        let chunks = s.split(&text);
        assert!(chunks[0].ends_with("\n\n"));
        assert_eq!(char_len(&chunks[0]), 72);
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let s = splitter(100, 20);
        let text = "x".repeat(250);
        let chunks = s.split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[0]), 100);
        assert_eq!(char_len(&chunks[1]), 100);
        assert_eq!(char_len(&chunks[2]), 90);
        let rebuilt: usize = chunks.iter().map(|c| char_len(c)).sum::<usize>() - 2 * 20;
        assert_eq!(rebuilt, 250);
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let s = splitter(50, 10);
        let text = "é".repeat(120);
        let chunks = s.split(&text);
        assert!(chunks.iter().all(|c| char_len(c) <= 50));
        assert_eq!(chunks.len(), 3);
    }
}
