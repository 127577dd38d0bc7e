//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! One [`RagPipeline`] serves every content type: a [`Query`] is validated,
//! the [`Retriever`] finds the owner's nearest chunks and the
//! [`AnswerAssembler`] prompts the chat model with them.

mod answer;
mod pipeline;
mod query;
mod retrieve;

pub use answer::{
    format_context_for_prompt, format_sources_for_display, Answer, AnswerAssembler, Source,
};
pub use pipeline::RagPipeline;
pub use query::Query;
pub use retrieve::Retriever;
