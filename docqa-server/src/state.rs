//! Shared application state.

use std::sync::Arc;

use docqa_rag::{
    OpenAIChatModel, OpenAIEmbeddingProvider, PineconeVectorStore, RagPipeline, RecursiveChunker,
    Result,
};
use tracing::info;

use crate::config::{AppConfig, DEFAULT_MAX_BODY_BYTES};

/// State shared across all request handlers.
///
/// Cloning is cheap; the pipeline and its HTTP clients are built once and
/// shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    /// Key required on `/api/*` routes, if any.
    pub function_key: Option<Arc<str>>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self { pipeline, function_key: None, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }

    pub fn with_function_key(mut self, key: impl Into<String>) -> Self {
        self.function_key = Some(Arc::from(key.into()));
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Build the production pipeline: OpenAI embeddings and chat completions
    /// over a Pinecone index, all sharing one HTTP client.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::new();

        let mut embedder = OpenAIEmbeddingProvider::new(&config.openai.api_key)?
            .with_client(client.clone())
            .with_base_url(&config.openai.base_url)
            .with_model(&config.openai.embedding_model);
        if let Some(dims) = config.openai.embedding_dimensions {
            embedder = embedder.with_dimensions(dims);
        }

        let mut store = PineconeVectorStore::new(&config.pinecone.api_key, &config.pinecone.environment)?
            .with_client(client.clone())
            .with_index(&config.pinecone.index);
        if let Some(namespace) = &config.pinecone.namespace {
            store = store.with_namespace(namespace);
        }

        let chat_model = OpenAIChatModel::new(&config.openai.api_key)?
            .with_client(client)
            .with_base_url(&config.openai.base_url)
            .with_model(&config.openai.chat_model);

        let pipeline = RagPipeline::builder()
            .chunker(Arc::new(RecursiveChunker::from_config(&config.rag)))
            .config(config.rag.clone())
            .embedding_provider(Arc::new(embedder))
            .vector_store(Arc::new(store))
            .chat_model(Arc::new(chat_model))
            .build()?;

        info!(
            index = %config.pinecone.index,
            embedding_model = %config.openai.embedding_model,
            chat_model = %config.openai.chat_model,
            auth = config.server.function_key.is_some(),
            "pipeline initialised"
        );

        let mut state =
            Self::new(Arc::new(pipeline)).with_max_body_bytes(config.server.max_body_bytes);
        if let Some(key) = &config.server.function_key {
            state = state.with_function_key(key);
        }
        Ok(state)
    }
}
