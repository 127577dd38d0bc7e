//! Chat model clients used for answer generation.

mod openai;

pub use openai::OpenAIChat;

use crate::config::Settings;
use crate::error::{Result, VidsageError};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for single-shot text completion.
///
/// Calls are stateless: every prompt carries its full context.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Name of the underlying model.
    fn model(&self) -> &str;
}

/// Create the chat model described by the settings.
pub fn create_chat_model(settings: &Settings) -> Result<Arc<dyn ChatModel>> {
    match settings.chat.provider.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAIChat::with_timeout(
            &settings.chat.model,
            settings.chat.temperature,
            std::time::Duration::from_secs(settings.openai.timeout_secs),
        )?)),
        other => Err(VidsageError::Config(format!("Unknown chat provider: {}", other))),
    }
}
