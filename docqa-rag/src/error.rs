//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
///
/// Every pipeline stage returns this type so callers can tell user-correctable
/// input problems apart from failures of the external collaborators.
#[derive(Debug, Error)]
pub enum RagError {
    /// The request carried no usable input (empty document, blank query).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat-completion call failed.
    #[error("LLM error ({provider}): {message}")]
    LlmError {
        /// The chat model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether the error was caused by the caller's input rather than by a
    /// dependency or by configuration.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RagError::InvalidInput(_))
    }

    /// Whether the error originates from one of the external services
    /// (embedding API, vector database, chat-completion API).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingError { .. }
                | RagError::VectorStoreError { .. }
                | RagError::LlmError { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
