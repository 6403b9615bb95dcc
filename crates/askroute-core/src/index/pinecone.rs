//! Pinecone-compatible vector store over HTTP

use super::{default_category, default_source, DocumentRef, ScoredDocument, VectorStore};
use crate::config::IndexConfig;
use crate::error::{AskRouteError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct PineconeStore {
    client: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
}

impl PineconeStore {
    /// Build from config; `None` without both host and API key
    pub fn from_config(config: &IndexConfig) -> Result<Option<Self>> {
        let (host, api_key) = match (&config.host, &config.api_key) {
            (Some(host), Some(key)) if !host.is_empty() && !key.is_empty() => {
                (host.trim_end_matches('/').to_string(), key.clone())
            }
            _ => return Ok(None),
        };
        let client = reqwest::Client::builder()
            .user_agent(concat!("askroute/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(AskRouteError::Http)?;
        Ok(Some(Self {
            client,
            host,
            api_key,
            namespace: config.namespace.clone(),
        }))
    }

    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AskRouteError::IndexUnavailable(format!("Pinecone request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AskRouteError::IndexUnavailable(format!(
                "Pinecone error (HTTP {}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AskRouteError::IndexUnavailable(format!("Malformed Pinecone response: {}", e)))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Metadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<Vector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct Vector {
    id: String,
    values: Vec<f32>,
    metadata: Metadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

fn to_scored(m: Match) -> ScoredDocument {
    let meta = m.metadata.unwrap_or_default();
    ScoredDocument {
        document: DocumentRef {
            id: m.id,
            title: meta
                .title
                .unwrap_or_else(|| "Untitled Document".to_string()),
            content: meta
                .content
                .unwrap_or_else(|| "No content available".to_string()),
            source: meta.source.unwrap_or_else(default_source),
            category: meta.category.unwrap_or_else(default_category),
            tags: meta.tags,
        },
        similarity: m.score.clamp(-1.0, 1.0),
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };
        let response: QueryResponse = self.post("/query", &request).await?;
        Ok(response.matches.into_iter().map(to_scored).collect())
    }

    async fn upsert(&self, records: Vec<(DocumentRef, Vec<f32>)>) -> Result<usize> {
        let vectors = records
            .into_iter()
            .map(|(doc, values)| Vector {
                id: doc.id,
                values,
                metadata: Metadata {
                    title: Some(doc.title),
                    content: Some(doc.content),
                    source: Some(doc.source),
                    category: Some(doc.category),
                    tags: doc.tags,
                },
            })
            .collect();
        let request = UpsertRequest {
            vectors,
            namespace: self.namespace.as_deref(),
        };
        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        Ok(response.upserted_count)
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
