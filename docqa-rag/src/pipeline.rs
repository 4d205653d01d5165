//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the two request flows by composing an
//! [`EmbeddingProvider`], a [`VectorStore`], a [`Chunker`], and a
//! [`ChatModel`]:
//!
//! - [`ingest`](RagPipeline::ingest): split → embed → store
//! - [`answer`](RagPipeline::answer): embed → search → filter → prompt → generate
//!
//! Both flows are all-or-nothing and run their external calls sequentially.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagPipeline, RagConfig, InMemoryVectorStore, RecursiveChunker};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(RecursiveChunker::new(1000, 200)))
//!     .chat_model(Arc::new(my_chat_model))
//!     .build()?;
//!
//! pipeline.ingest(&Document::new(text)).await?;
//! let answer = pipeline.answer(&Query::new("Who approves sales orders?")).await?;
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Answer, Document, IngestReport, Query, Record, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::ChatModel;
use crate::prompt::{NO_CONTEXT_ANSWER, build_context, build_messages};
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. The pipeline holds no
/// per-request state and can be shared behind an `Arc`.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    chat_model: Arc<dyn ChatModel>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingest a single document: split → embed → store.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if the document is empty or blank; nothing is written.
    /// - [`RagError::EmbeddingError`] if any chunk fails to embed; nothing is written.
    /// - [`RagError::VectorStoreError`] if the store rejects the write.
    pub async fn ingest(&self, document: &Document) -> Result<IngestReport> {
        if document.text.trim().is_empty() {
            return Err(RagError::InvalidInput("No content received".to_string()));
        }

        // 1. Split
        let chunks = self.chunker.chunk(document)?;
        debug!(chunk_count = chunks.len(), text_len = document.text.len(), "document split");

        // 2. Embed every chunk; any failure aborts before the store is touched
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: "pipeline".to_string(),
                message: format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        // 3. Attach embeddings and ingestion metadata
        let upload_date = Utc::now().to_rfc3339();
        let records: Vec<Record> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut metadata = chunk.metadata;
                metadata.insert("upload_date".to_string(), upload_date.clone());
                Record { embedding, text: chunk.text, metadata }
            })
            .collect();

        // 4. Store in one logical batch
        self.vector_store
            .ensure_collection(self.embedding_provider.dimensions())
            .await
            .inspect_err(|e| error!(error = %e, "ensuring collection failed during ingestion"))?;
        self.vector_store
            .upsert(&records)
            .await
            .inspect_err(|e| error!(error = %e, "upsert failed during ingestion"))?;

        let chunks_processed = records.len();
        info!(chunks_processed, "ingested document");

        Ok(IngestReport { chunks_processed })
    }

    /// Retrieve the chunks most similar to `query`, best first, keeping only
    /// those at or above the similarity threshold.
    ///
    /// Returns the retained results and the number of results the store
    /// returned before filtering.
    pub async fn retrieve(&self, query: &str) -> Result<(Vec<SearchResult>, usize)> {
        let query_embedding = self
            .embedding_provider
            .embed(query)
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;

        let results = self
            .vector_store
            .search(&query_embedding, self.config.top_k)
            .await
            .inspect_err(|e| error!(error = %e, "vector store search failed"))?;

        let documents_found = results.len();
        let threshold = self.config.similarity_threshold;
        let retained: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        debug!(documents_found, retained = retained.len(), threshold, "retrieval completed");
        Ok((retained, documents_found))
    }

    /// Answer a query: embed → search → filter → assemble prompt → generate.
    ///
    /// When no result clears the similarity threshold, a fixed answer is
    /// returned and the chat model is not called.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if the query is blank; no external call is made.
    /// - [`RagError::EmbeddingError`], [`RagError::VectorStoreError`] or
    ///   [`RagError::LlmError`] from the corresponding stage.
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        if query.query.trim().is_empty() {
            return Err(RagError::InvalidInput("No query provided".to_string()));
        }

        let (similar_docs, documents_found) = self.retrieve(&query.query).await?;

        if similar_docs.is_empty() {
            info!(documents_found, "no relevant context found");
            return Ok(Answer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                context: String::new(),
                similar_docs,
                documents_found,
            });
        }

        let context = build_context(&similar_docs);
        let system_prompt = query
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(self.config.default_system_prompt.as_str());
        let messages = build_messages(system_prompt, &query.query, &context);

        let answer = self.chat_model.complete(&messages).await.inspect_err(|e| {
            error!(model = self.chat_model.name(), error = %e, "chat completion failed");
        })?;

        info!(
            model = self.chat_model.name(),
            context_chunks = similar_docs.len(),
            answer_len = answer.len(),
            "answered query"
        );

        Ok(Answer { answer, context, similar_docs, documents_found })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// Every component is required except `config`, which defaults to
/// [`RagConfig::default()`]. Call [`build()`](RagPipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    chat_model: Option<Arc<dyn ChatModel>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the chat model used to generate answers.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::ConfigError("chunker is required".to_string()))?;
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagError::ConfigError("chat_model is required".to_string()))?;

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, chat_model })
    }
}
