//! The embedding seam: text in, fixed-length vectors out.

use async_trait::async_trait;

use crate::error::Result;

/// Turns chunk and query text into vectors comparable by cosine similarity.
///
/// Ingestion embeds all chunks of a document through one
/// [`embed_batch`](EmbeddingProvider::embed_batch) call; answering embeds the
/// query through [`embed`](EmbeddingProvider::embed). Documents and queries
/// must go through the same provider or their scores are meaningless.
///
/// Failures surface as [`RagError::EmbeddingError`](crate::RagError::EmbeddingError).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order. Any failure fails the batch.
    ///
    /// Falls back to one [`embed`](EmbeddingProvider::embed) call per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this provider returns; used to size a new index.
    fn dimensions(&self) -> usize;
}
