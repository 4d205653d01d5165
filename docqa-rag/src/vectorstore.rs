//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{Record, SearchResult};
use crate::error::Result;

/// A storage backend for embedded chunks with similarity search.
///
/// A store is bound to a single index. Records are append-only from this
/// crate's point of view: the store assigns identifiers on insert and never
/// deduplicates by content, so ingesting the same text twice yields two
/// records.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.ensure_collection(1536).await?;
/// store.upsert(&records).await?;
/// let results = store.search(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Make sure the backing index exists, creating it for vectors of the
    /// given dimensionality if it does not. No-op if it already exists.
    async fn ensure_collection(&self, dimensions: usize) -> Result<()>;

    /// Insert records. Records must have embeddings set.
    async fn upsert(&self, records: &[Record]) -> Result<()>;

    /// Search for the `top_k` most similar records to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}
