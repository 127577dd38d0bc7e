//! Configuration module for vidsage.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, ContentPrompts, Prompts, RagPrompts};
pub use settings::{
    AnalysisSettings, ChatSettings, ChunkingSettings, EmbeddingProvider, EmbeddingSettings, FilterMode,
    GeneralSettings, IngestionSettings, OpenAISettings, PromptSettings, RetrievalSettings,
    ServerSettings, Settings, VectorStoreProvider, VectorStoreSettings,
};
