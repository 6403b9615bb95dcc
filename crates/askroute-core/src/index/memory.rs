//! In-process vector store with cosine similarity

use super::{DocumentRef, ScoredDocument, VectorStore};
use crate::error::{AskRouteError, Result};
use async_trait::async_trait;
use std::sync::RwLock;

/// Holds documents in memory; upserts replace by id
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<(DocumentRef, Vec<f32>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity in [-1, 1]; 0 for zero-length or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        let records = self
            .records
            .read()
            .map_err(|_| AskRouteError::IndexUnavailable("memory store lock poisoned".into()))?;

        let mut scored: Vec<ScoredDocument> = records
            .iter()
            .map(|(doc, v)| ScoredDocument {
                document: doc.clone(),
                similarity: cosine_similarity(vector, v),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn upsert(&self, records: Vec<(DocumentRef, Vec<f32>)>) -> Result<usize> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| AskRouteError::IndexUnavailable("memory store lock poisoned".into()))?;

        let count = records.len();
        for (doc, vector) in records {
            match stored.iter_mut().find(|(d, _)| d.id == doc.id) {
                Some(slot) => *slot = (doc, vector),
                None => stored.push((doc, vector)),
            }
        }
        Ok(count)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> DocumentRef {
        DocumentRef {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: String::new(),
            source: "knowledge_base".into(),
            category: "general".into(),
            tags: vec![],
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryStore::new();
        store
            .upsert(vec![(doc("a"), vec![1.0, 0.0]), (doc("b"), vec![0.0, 1.0])])
            .await
            .unwrap();
        store.upsert(vec![(doc("a"), vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(store.len(), 2);

        let results = store.query(&[0.0, 1.0], 5).await.unwrap();
        assert!((results[0].similarity - 1.0).abs() < 1e-9);
        assert!((results[1].similarity - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_query_truncates_to_top_k() {
        let store = MemoryStore::new();
        let records = (0..10)
            .map(|i| (doc(&format!("d{i}")), vec![1.0, i as f32]))
            .collect();
        store.upsert(records).await.unwrap();
        assert_eq!(store.query(&[1.0, 0.0], 3).await.unwrap().len(), 3);
    }
}
