//! Configuration settings for vidsage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub embedding: EmbeddingSettings,
    pub chat: ChatSettings,
    pub chunking: ChunkingSettings,
    pub ingestion: IngestionSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
    pub analysis: AnalysisSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Owner id used by CLI commands when `--owner` is not given.
    pub default_owner: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidsage".to_string(),
            log_level: "warn".to_string(),
            default_owner: "local".to_string(),
        }
    }
}

/// Settings shared by every OpenAI-backed client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Embedding backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embeddings API.
    #[default]
    OpenAI,
    /// Local Ollama server (`/api/embed`).
    Ollama,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "ollama" | "local" => Ok(EmbeddingProvider::Ollama),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Embedding generation settings.
///
/// The same embedder must be used at ingestion and query time; changing the
/// model or dimensions invalidates everything already in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, ollama).
    pub provider: EmbeddingProvider,
    /// Embedding model to use (e.g. `nomic-embed-text` with 768 dimensions for ollama).
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Number of chunks embedded per request.
    pub batch_size: usize,
    /// Ollama server URL (ollama provider only).
    pub ollama_url: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 100,
            ollama_url: crate::embedding::DEFAULT_OLLAMA_URL.to_string(),
        }
    }
}

/// Chat model settings used for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Chat provider (openai).
    pub provider: String,
    /// LLM model for response generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters repeated between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Texts shorter than this (after trimming) are rejected.
    pub min_text_chars: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self { min_text_chars: 10 }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Sqlite,
    Memory,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: VectorStoreProvider,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Sqlite,
            sqlite_path: "~/.vidsage/vectors.db".to_string(),
        }
    }
}

/// Where the owner/scope predicate is evaluated during retrieval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Push the predicate into the store query when the store supports it.
    #[default]
    Native,
    /// Over-fetch unfiltered neighbours and filter them client-side.
    Post,
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(FilterMode::Native),
            "post" => Ok(FilterMode::Post),
            _ => Err(format!("Unknown filter mode: {}", s)),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks returned when the caller does not ask for a count.
    pub default_limit: usize,
    /// Largest result limit a caller may request.
    pub max_limit: usize,
    /// Multiplier applied to the limit when filtering client-side.
    pub over_fetch_factor: usize,
    /// Where the owner/scope predicate is evaluated.
    pub filter_mode: FilterMode,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_limit: 4,
            max_limit: 10,
            over_fetch_factor: 2,
            filter_mode: FilterMode::Native,
        }
    }
}

impl RetrievalSettings {
    /// Resolve a requested result limit.
    ///
    /// Missing or out-of-range requests fall back to `default_limit`.
    pub fn resolve_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(n) if n >= 1 && n <= self.max_limit => n,
            _ => self.default_limit.clamp(1, self.max_limit.max(1)),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Header carrying the authenticated owner id, set by the auth proxy.
    pub owner_header: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            owner_header: "x-owner-id".to_string(),
        }
    }
}

/// Video analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Transcript characters sent to the model; the rest is cut off.
    pub max_transcript_chars: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_transcript_chars: 8000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidsageError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidsage")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Whether any configured backend talks to the OpenAI API.
    pub fn uses_openai(&self) -> bool {
        self.embedding.provider == EmbeddingProvider::OpenAI
            || self.chat.provider.eq_ignore_ascii_case("openai")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.retrieval.default_limit, 4);
        assert_eq!(settings.retrieval.max_limit, 10);
        assert_eq!(settings.retrieval.over_fetch_factor, 2);
        assert_eq!(settings.retrieval.filter_mode, FilterMode::Native);
    }

    #[test]
    fn test_resolve_limit() {
        let retrieval = RetrievalSettings::default();
        assert_eq!(retrieval.resolve_limit(None), 4);
        assert_eq!(retrieval.resolve_limit(Some(7)), 7);
        assert_eq!(retrieval.resolve_limit(Some(10)), 10);
        assert_eq!(retrieval.resolve_limit(Some(0)), 4);
        assert_eq!(retrieval.resolve_limit(Some(11)), 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            filter_mode = "post"

            [embedding]
            provider = "ollama"
            model = "nomic-embed-text"
            dimensions = 768
            "#,
        )
        .unwrap();

        assert_eq!(settings.retrieval.filter_mode, FilterMode::Post);
        assert_eq!(settings.retrieval.default_limit, 4);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Ollama);
        assert_eq!(settings.embedding.dimensions, 768);
        assert_eq!(settings.embedding.ollama_url, "http://localhost:11434");
        assert_eq!(settings.embedding.batch_size, 100);
        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Sqlite);
    }
}
