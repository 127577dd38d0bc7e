//! OpenAI chat completion client.

use super::ChatModel;
use crate::error::{Result, VidsageError};
use crate::openai::{create_client, create_client_with_timeout};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-backed chat model.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChat {
    pub fn new(model: &str, temperature: f32) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            temperature,
        })
    }

    pub fn with_timeout(model: &str, temperature: f32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VidsageError::Chat(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidsageError::Chat(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VidsageError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| VidsageError::Chat("Empty response from LLM".to_string()))?
            .clone();

        debug!("Received {} chars from {}", answer.len(), self.model);
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
