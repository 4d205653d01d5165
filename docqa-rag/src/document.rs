//! Data types for documents, chunks, records, queries, and answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key under which a record's chunk text is persisted.
pub const TEXT_KEY: &str = "text";

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata copied onto every chunk of the document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: HashMap::new() }
    }
}

/// A bounded segment of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Position of the chunk in the document's chunk sequence.
    pub index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset of the chunk's first character in the document.
    pub offset: usize,
    /// Number of leading characters shared with the previous chunk.
    pub overlap: usize,
    /// Key-value metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
}

/// An embedded chunk as handed to a [`VectorStore`](crate::VectorStore).
///
/// Records carry no identifier; the store assigns one on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// The vector embedding of `text`.
    pub embedding: Vec<f32>,
    /// The chunk text.
    pub text: String,
    /// Chunk metadata.
    pub metadata: HashMap<String, String>,
}

/// A retrieved chunk paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The chunk text stored with the record.
    pub text: String,
    /// The similarity score (higher is more relevant).
    pub score: f32,
    /// Remaining record metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A user question with an optional system prompt override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// The question text.
    pub query: String,
    /// Replaces the default system prompt when non-blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Query {
    /// A question answered under the default system prompt.
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), system_prompt: None }
    }

    /// Override the system prompt for this question.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of chunks embedded and written to the store.
    pub chunks_processed: usize,
}

/// The generated answer together with the retrieval that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// Generated answer text.
    pub answer: String,
    /// The context string sent to the language model.
    pub context: String,
    /// Retained search results in descending score order.
    pub similar_docs: Vec<SearchResult>,
    /// Results returned by the store before threshold filtering.
    pub documents_found: usize,
}

impl Answer {
    /// Whether the answer is the fixed fallback produced when retrieval found
    /// nothing relevant.
    pub fn is_fallback(&self) -> bool {
        self.similar_docs.is_empty()
    }
}
