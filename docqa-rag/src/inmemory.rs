//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `Vec` protected by a `tokio::sync::RwLock`. It is suitable for local
//! development and testing.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Record, SearchResult};
use crate::error::Result;
use crate::vectorstore::VectorStore;

#[derive(Debug, Clone)]
struct StoredRecord {
    id: String,
    record: Record,
}

/// An append-only in-memory vector store using cosine similarity for search.
///
/// Every upserted record gets a fresh UUID, mirroring how the hosted store is
/// used by the pipeline.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Vec<StoredRecord>>,
    upsert_calls: RwLock<usize>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of times [`VectorStore::upsert`] has been called.
    pub async fn upsert_calls(&self) -> usize {
        *self.upsert_calls.read().await
    }

    /// Identifiers of all stored records, in insertion order.
    pub async fn ids(&self) -> Vec<String> {
        self.records.read().await.iter().map(|r| r.id.clone()).collect()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, records: &[Record]) -> Result<()> {
        *self.upsert_calls.write().await += 1;
        let mut store = self.records.write().await;
        store.extend(
            records
                .iter()
                .map(|record| StoredRecord { id: Uuid::new_v4().to_string(), record: record.clone() }),
        );
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let store = self.records.read().await;

        let mut scored: Vec<SearchResult> = store
            .iter()
            .map(|stored| SearchResult {
                text: stored.record.text.clone(),
                score: cosine_similarity(&stored.record.embedding, embedding),
                metadata: stored.record.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(text: &str, embedding: Vec<f32>) -> Record {
        Record { embedding, text: text.to_string(), metadata: HashMap::new() }
    }

    #[test]
    fn cosine_of_parallel_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn duplicate_upserts_keep_both_records() {
        let store = InMemoryVectorStore::new();
        let records = vec![record("same text", vec![1.0, 0.0])];
        store.upsert(&records).await.unwrap();
        store.upsert(&records).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.upsert_calls().await, 2);
        let ids = store.ids().await;
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn search_orders_by_score_and_truncates() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(&[
                record("far", vec![0.0, 1.0]),
                record("near", vec![1.0, 0.1]),
                record("middle", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle"]);
        assert!(results[0].score >= results[1].score);
    }
}
