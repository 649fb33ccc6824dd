//! OpenAI-compatible streaming chat backend.
//!
//! Talks to any `/chat/completions` endpoint that speaks the OpenAI
//! wire format (Ollama, vLLM, OpenAI itself) and exposes the result as
//! a [`duplex_core::TokenStream`] of content tokens and incremental
//! tool-call fragments.

pub mod openai;

pub use openai::OpenAiCompatBackend;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed stream chunk: {0}")]
    Chunk(String),
}

impl From<LlmError> for duplex_core::Error {
    fn from(e: LlmError) -> Self {
        duplex_core::Error::Model(e.to_string())
    }
}
