//! # docqa-rag
//!
//! Retrieval-augmented question answering over ingested documents.
//!
//! ## Overview
//!
//! The crate is organised around four small async seams, each with a
//! production implementation and a test double:
//!
//! | Seam | Production | Test / local |
//! |------|------------|--------------|
//! | [`Chunker`] | [`RecursiveChunker`] | n/a |
//! | [`EmbeddingProvider`] | [`OpenAIEmbeddingProvider`] | [`mock::MockEmbeddingProvider`] |
//! | [`VectorStore`] | [`PineconeVectorStore`] | [`InMemoryVectorStore`] |
//! | [`ChatModel`] | [`OpenAIChatModel`] | [`mock::MockChatModel`] |
//!
//! [`RagPipeline`] composes them into the two request flows:
//!
//! - **ingest**: split a document, embed every chunk, upsert the records;
//! - **answer**: embed the query, search, drop weak matches, build a prompt
//!   from the remaining chunks, and ask the chat model.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{
//!     Document, InMemoryVectorStore, Query, RagConfig, RagPipeline, RecursiveChunker,
//!     mock::{MockChatModel, MockEmbeddingProvider},
//! };
//!
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .chunker(Arc::new(RecursiveChunker::from_config(&config)))
//!     .config(config)
//!     .embedding_provider(Arc::new(MockEmbeddingProvider::new(64)))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chat_model(Arc::new(MockChatModel::new("A manager.")))
//!     .build()?;
//!
//! pipeline.ingest(&Document::new("Sales orders must be approved by a manager.")).await?;
//! let answer = pipeline.answer(&Query::new("Who approves sales orders?")).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod llm;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pinecone")]
pub mod pinecone;
pub mod pipeline;
pub mod prompt;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{DEFAULT_SYSTEM_PROMPT, RagConfig, RagConfigBuilder};
pub use document::{Answer, Chunk, Document, IngestReport, Query, Record, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use llm::{ChatMessage, ChatModel, Role};
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "pinecone")]
pub use pinecone::PineconeVectorStore;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use vectorstore::VectorStore;
