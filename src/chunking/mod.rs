//! Text chunking for breaking transcripts, documents and comments into searchable windows.

mod recursive;

pub use recursive::RecursiveSplitter;

use crate::config::ChunkingSettings;
use crate::error::{Result, VidsageError};

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    /// Check that windows can always make progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(VidsageError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(VidsageError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Trait for text splitting implementations.
///
/// Implementations must be pure: the same input always yields the same chunks.
pub trait Splitter: Send + Sync {
    /// Split text into chunk texts, in document order.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Create the splitter described by the chunking settings.
pub fn create_splitter(settings: &ChunkingSettings) -> Result<Box<dyn Splitter>> {
    Ok(Box::new(RecursiveSplitter::new(ChunkingConfig::from(settings))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ChunkingConfig::default().validate().is_ok());
        assert!(ChunkingConfig { chunk_size: 0, chunk_overlap: 0 }.validate().is_err());
        assert!(ChunkingConfig { chunk_size: 100, chunk_overlap: 100 }.validate().is_err());
    }

    #[test]
    fn test_create_splitter_rejects_bad_settings() {
        let settings = ChunkingSettings {
            chunk_size: 50,
            chunk_overlap: 80,
        };
        assert!(create_splitter(&settings).is_err());
    }
}
