//! Text encoders for the document index

use super::{LLMClient, VLLMClient};
use crate::config::LLMServiceConfig;
use crate::error::{AskRouteError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Largest input list sent in one embeddings call
pub const DEFAULT_MAX_BATCH: usize = 64;

/// Turns text into a fixed-width vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Encoder backed by an OpenAI-compatible `/v1/embeddings` endpoint.
///
/// Large inputs are split into chunks of at most `max_batch` texts. Every
/// failure surfaces as [`AskRouteError::EmbeddingFailure`].
pub struct HttpEmbedder {
    client: Arc<dyn LLMClient>,
    max_batch: usize,
}

impl HttpEmbedder {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }

    pub fn from_config(config: LLMServiceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(VLLMClient::new(config)?)))
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self
            .client
            .embed_batch(chunk)
            .await
            .map_err(as_embedding_failure)?;

        if vectors.len() != chunk.len() {
            return Err(AskRouteError::EmbeddingFailure(format!(
                "encoder returned {} vectors for {} inputs",
                vectors.len(),
                chunk.len()
            )));
        }
        if let Some(pos) = vectors.iter().position(|v| v.is_empty()) {
            return Err(AskRouteError::EmbeddingFailure(format!(
                "encoder returned an empty vector for input {}",
                pos
            )));
        }
        Ok(vectors)
    }
}

fn as_embedding_failure(err: AskRouteError) -> AskRouteError {
    match err {
        AskRouteError::EmbeddingFailure(_) => err,
        other => AskRouteError::EmbeddingFailure(other.to_string()),
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_chunk(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AskRouteError::EmbeddingFailure("no vector returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.max_batch) {
            out.extend(self.embed_chunk(chunk).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.client.embedding_dimensions()
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
