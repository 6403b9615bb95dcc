//! LLM integration
//!
//! - [`VLLMClient`]: chat completions and embeddings over an OpenAI-compatible API
//! - [`HttpEmbedder`]: batching encoder used by the document index

mod client;
mod embedder;

pub use client::{APIMetrics, ChatMessage, LLMClient, MetricsSnapshot, VLLMClient};
pub use embedder::{Embedder, HttpEmbedder, DEFAULT_MAX_BATCH};
