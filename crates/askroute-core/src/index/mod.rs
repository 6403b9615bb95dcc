//! Private document index (internal mode)
//!
//! [`SemanticIndexClient`] is what the internal pipeline talks to. The
//! provided implementation, [`EmbeddingIndex`], pairs an [`Embedder`] with a
//! [`VectorStore`] backend (Pinecone over HTTP, or an in-process store).
//! A single instance is shared by all requests.

use crate::config::{Config, IndexBackend};
use crate::error::{AskRouteError, Result};
use crate::llm::{Embedder, HttpEmbedder, LLMClient, VLLMClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

mod memory;
mod pinecone;

pub use memory::MemoryStore;
pub use pinecone::PineconeStore;

/// A stored document as returned by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub(crate) fn default_source() -> String {
    "knowledge_base".to_string()
}

pub(crate) fn default_category() -> String {
    "general".to_string()
}

/// Nearest-neighbour match with its similarity in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: DocumentRef,
    pub similarity: f64,
}

/// Semantic retrieval over the private index
#[async_trait]
pub trait SemanticIndexClient: Send + Sync {
    /// Encode text. Fails with `EmbeddingFailure`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Nearest documents to `vector`, best first. Fails with `IndexUnavailable`.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>>;

    /// Embed and store documents, returning how many were written
    async fn upsert(&self, documents: &[DocumentRef]) -> Result<usize>;

    /// Configured neighbour count
    fn top_k(&self) -> usize;

    /// Budget for one embed + query round trip
    fn timeout(&self) -> Duration;
}

/// Vector storage backend
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>>;

    async fn upsert(&self, records: Vec<(DocumentRef, Vec<f32>)>) -> Result<usize>;

    fn name(&self) -> &str;
}

/// Embedder + vector store
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
    timeout: Duration,
}

impl EmbeddingIndex {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k,
            timeout,
        }
    }

    /// Build the configured index; `None` when disabled or missing credentials
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let llm = Arc::new(VLLMClient::new(config.llm_service.clone())?);
        Self::with_client(config, llm)
    }

    /// Like [`from_config`](Self::from_config), encoding through an existing
    /// client so its call counters cover embeddings too
    pub fn with_client(config: &Config, llm: Arc<dyn LLMClient>) -> Result<Option<Self>> {
        let index = &config.index;
        if !index.enabled {
            return Ok(None);
        }

        let store: Arc<dyn VectorStore> = match index.backend {
            IndexBackend::Memory => Arc::new(MemoryStore::new()),
            IndexBackend::Pinecone => match PineconeStore::from_config(index)? {
                Some(store) => Arc::new(store),
                None => {
                    tracing::info!("Pinecone not configured (PINECONE_API_KEY/PINECONE_HOST unset)");
                    return Ok(None);
                }
            },
        };
        let embedder = Arc::new(HttpEmbedder::new(llm));

        tracing::info!(
            "Document index ready ({} backend, model {})",
            store.name(),
            config.llm_service.embedding_model
        );
        Ok(Some(Self::new(
            embedder,
            store,
            index.top_k,
            Duration::from_secs(index.timeout_secs),
        )))
    }
}

/// Collapse whitespace; the encoder input after normalization
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl SemanticIndexClient for EmbeddingIndex {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(AskRouteError::EmbeddingFailure(
                "text is empty after normalization".to_string(),
            ));
        }
        let vector = self.embedder.embed(&normalized).await.map_err(|e| match e {
            AskRouteError::EmbeddingFailure(_) => e,
            other => AskRouteError::EmbeddingFailure(other.to_string()),
        })?;
        if vector.is_empty() {
            return Err(AskRouteError::EmbeddingFailure(
                "encoder returned an empty vector".to_string(),
            ));
        }
        Ok(vector)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        self.store.query(vector, top_k).await.map_err(|e| match e {
            AskRouteError::IndexUnavailable(_) => e,
            other => AskRouteError::IndexUnavailable(other.to_string()),
        })
    }

    async fn upsert(&self, documents: &[DocumentRef]) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = documents
            .iter()
            .map(|d| normalize_text(&format!("{} {}", d.title, d.content)))
            .collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        let records = documents.iter().cloned().zip(vectors).collect();
        self.store.upsert(records).await
    }

    fn top_k(&self) -> usize {
        self.top_k
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
