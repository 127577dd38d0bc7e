//! Ollama embeddings for running fully local.
//!
//! Calls `POST /api/embed` on a running Ollama instance. The model must be
//! pulled first (e.g. `ollama pull nomic-embed-text`).

use super::Embedder;
use crate::error::{Result, VidsageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by a local Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn with_timeout(url: &str, model: &str, dimensions: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VidsageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.url)
    }

    /// Check a response against the request size and configured dimensions.
    fn check_response(&self, expected: usize, response: EmbedResponse) -> Result<Vec<Vec<f32>>> {
        if response.embeddings.len() != expected {
            return Err(VidsageError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                response.embeddings.len()
            )));
        }

        if let Some(bad) = response
            .embeddings
            .iter()
            .find(|e| e.len() != self.dimensions)
        {
            return Err(VidsageError::Embedding(format!(
                "Model {} returned {} dimensions, configured for {}",
                self.model,
                bad.len(),
                self.dimensions
            )));
        }

        Ok(response.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VidsageError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.endpoint())
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                VidsageError::Embedding(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VidsageError::Embedding(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response.json().await?;
        let embeddings = self.check_response(texts.len(), parsed)?;
        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(dimensions: usize) -> OllamaEmbedder {
        OllamaEmbedder::with_timeout(
            "http://localhost:11434/",
            "nomic-embed-text",
            dimensions,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        assert_eq!(embedder(3).endpoint(), "http://localhost:11434/api/embed");
    }

    #[test]
    fn test_request_shape() {
        let input = vec!["a".to_string(), "b".to_string()];
        let json = serde_json::to_value(EmbedRequest {
            model: "nomic-embed-text",
            input: &input,
        })
        .unwrap();
        assert_eq!(json["model"], "nomic-embed-text");
        assert_eq!(json["input"][1], "b");
    }

    #[test]
    fn test_response_is_checked() {
        let embedder = embedder(2);
        let response: EmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(embedder.check_response(2, response).unwrap()[1], vec![0.3, 0.4]);

        let short: EmbedResponse = serde_json::from_str(r#"{"embeddings":[[0.1,0.2]]}"#).unwrap();
        assert!(embedder.check_response(2, short).is_err());

        let wrong_dims: EmbedResponse =
            serde_json::from_str(r#"{"embeddings":[[0.1,0.2,0.3]]}"#).unwrap();
        assert!(embedder.check_response(1, wrong_dims).is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        assert!(embedder(2).embed_batch(&[]).await.unwrap().is_empty());
    }
}
