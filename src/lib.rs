//! vidsage - Ask questions about your videos, documents and comments
//!
//! A retrieval-augmented question answering library and CLI over YouTube
//! transcripts, uploaded-document text and YouTube comments.
//!
//! # Overview
//!
//! vidsage allows you to:
//! - Ingest already-extracted text into a vector store, scoped per owner
//! - Ask questions and get answers grounded in your own library, with sources
//! - Restrict a question to a single video or document
//! - Summarize comment sentiment for a video
//! - Generate a description and viewer Q&A for an ingested video
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `content` - Content types (transcript, document, comment)
//! - `source` - Source identifier normalization
//! - `chunking` - Text splitting into overlapping windows
//! - `embedding` - Embedding generation
//! - `vector_store` - Owner-scoped vector database abstraction
//! - `chat` - Chat model clients
//! - `ingest` - Best-effort ingestion pipeline
//! - `rag` - Retrieval and answer assembly
//! - `comments` - Comment records, sentiment and insights
//! - `analysis` - Generated video descriptions and viewer Q&A
//! - `orchestrator` - Service wiring
//! - `cli` - Command line and HTTP surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use vidsage::config::Settings;
//! use vidsage::content::ContentType;
//! use vidsage::ingest::IngestRequest;
//! use vidsage::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = IngestRequest::new(
//!         "alice",
//!         ContentType::Transcript,
//!         "https://youtu.be/dQw4w9WgXcQ",
//!         "Never Gonna Give You Up",
//!         std::fs::read_to_string("transcript.txt")?,
//!     );
//!     let report = orchestrator.ingest(request).await?;
//!     println!("Indexed {} chunks", report.chunks_written);
//!
//!     let answer = orchestrator
//!         .ask(ContentType::Transcript, "alice", "What is the song about?", None, None)
//!         .await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod chat;
pub mod chunking;
pub mod cli;
pub mod comments;
pub mod config;
pub mod content;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod source;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, VidsageError};
