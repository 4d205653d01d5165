//! Deterministic test doubles for the external collaborators.
//!
//! [`MockEmbeddingProvider`] embeds text as a hashed bag of words, so texts
//! sharing words score higher under cosine similarity. [`MockChatModel`]
//! returns a canned reply and records every prompt it receives. Both can be
//! switched into a failing mode and count their calls, which lets tests
//! assert that a flow made (or skipped) an external call.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{ChatMessage, ChatModel};

/// Hashed bag-of-words embeddings.
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// A provider producing `dimensions`-long vectors; zero is raised to one.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose every call fails with [`RagError::EmbeddingError`].
    pub fn failing(dimensions: usize) -> Self {
        let provider = Self::new(dimensions);
        provider.set_failing(true);
        provider
    }

    /// Switch failure mode on or off for subsequent calls.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `embed`/`embed_batch` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100_0000_01b3));
            embedding[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingError {
                provider: "mock".into(),
                message: "simulated embedding failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check()?;
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.check()?;
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A chat model that answers with a fixed reply.
#[derive(Debug)]
pub struct MockChatModel {
    reply: String,
    fail: AtomicBool,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    /// A model that answers every prompt with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), fail: AtomicBool::new(false), prompts: Mutex::new(Vec::new()) }
    }

    /// A model whose every call fails with [`RagError::LlmError`].
    pub fn failing() -> Self {
        let model = Self::new("");
        model.fail.store(true, Ordering::SeqCst);
        model
    }

    /// Number of completions requested.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    /// The most recent prompt received.
    pub fn last_prompt(&self) -> Option<Vec<ChatMessage>> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(messages.to_vec());
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::LlmError {
                provider: "mock".into(),
                message: "simulated completion failure".into(),
            });
        }
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::cosine_similarity;

    #[tokio::test]
    async fn shared_words_score_higher() {
        let provider = MockEmbeddingProvider::new(256);
        let doc = provider.embed("Sales orders must be approved by a manager.").await.unwrap();
        let related = provider.embed("Who approves sales orders?").await.unwrap();
        let unrelated = provider.embed("Lunch is served at noon.").await.unwrap();

        assert_eq!(doc.len(), 256);
        assert!(cosine_similarity(&doc, &related) > cosine_similarity(&doc, &unrelated));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn zero_dimensions_is_raised_to_one() {
        let provider = MockEmbeddingProvider::new(0);
        assert_eq!(provider.dimensions(), 1);
        assert_eq!(provider.embed("any words at all").await.unwrap(), vec![1.0]);
    }

    #[tokio::test]
    async fn failing_modes_report_their_error_kind() {
        let provider = MockEmbeddingProvider::failing(8);
        assert!(matches!(provider.embed("x").await, Err(RagError::EmbeddingError { .. })));

        let model = MockChatModel::failing();
        assert!(matches!(model.complete(&[]).await, Err(RagError::LlmError { .. })));
        assert_eq!(model.calls(), 1);
    }
}
