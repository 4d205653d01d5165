//! Pinecone vector store backend.
//!
//! Provides [`PineconeVectorStore`] which implements [`VectorStore`] against
//! the Pinecone REST API with `reqwest`:
//!
//! - the control plane (`https://api.pinecone.io`) lists, creates and
//!   describes indexes;
//! - the index's data plane host serves upserts and queries.
//!
//! The data plane host is looked up once, on first use, and cached for the
//! lifetime of the store.
//!
//! A newly created index is polled until Pinecone reports it ready, so the
//! first upsert never hits an index that is still initializing.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::pinecone::PineconeVectorStore;
//!
//! let store = PineconeVectorStore::new(api_key, "us-east-1")?.with_index("langchain");
//! store.ensure_collection(1536).await?;
//! store.upsert(&records).await?;
//! let results = store.search(&query_embedding, 3).await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::document::{Record, SearchResult, TEXT_KEY};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The Pinecone control plane endpoint.
pub const PINECONE_CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// REST API version sent with every request.
pub const PINECONE_API_VERSION: &str = "2024-07";

/// The default index name.
pub const DEFAULT_INDEX_NAME: &str = "langchain";

/// Maximum number of vectors sent in one upsert request.
const UPSERT_BATCH_SIZE: usize = 100;

/// Delay between readiness checks while a new index initializes.
const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Readiness checks made before giving up on a new index.
const DEFAULT_READY_MAX_ATTEMPTS: u32 = 60;

const BACKEND: &str = "pinecone";

/// A [`VectorStore`] backed by a [Pinecone](https://www.pinecone.io/) index.
///
/// Chunk text is stored in the vector metadata under `text`; the remaining
/// metadata entries are stored alongside it. Every upserted vector receives a
/// fresh UUID.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    control_plane_url: String,
    index_name: String,
    cloud: String,
    region: String,
    namespace: Option<String>,
    host: OnceCell<String>,
    ready_poll_interval: Duration,
    ready_max_attempts: u32,
}

impl PineconeVectorStore {
    /// Create a store for the default index.
    ///
    /// `environment` is the serverless region used when the index has to be
    /// created (for example `us-east-1`).
    pub fn new(api_key: impl Into<String>, environment: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("Pinecone API key must not be empty".into()));
        }
        let region = environment.into();
        if region.is_empty() {
            return Err(RagError::ConfigError("Pinecone environment must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            control_plane_url: PINECONE_CONTROL_PLANE_URL.into(),
            index_name: DEFAULT_INDEX_NAME.into(),
            cloud: "aws".into(),
            region,
            namespace: None,
            host: OnceCell::new(),
            ready_poll_interval: DEFAULT_READY_POLL_INTERVAL,
            ready_max_attempts: DEFAULT_READY_MAX_ATTEMPTS,
        })
    }

    /// Share an existing HTTP client (connection pool, timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Use a different index.
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Read and write a specific namespace instead of the default one.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Cloud provider used when creating a serverless index.
    pub fn with_cloud(mut self, cloud: impl Into<String>) -> Self {
        self.cloud = cloud.into();
        self
    }

    /// Talk to a different control plane endpoint.
    pub fn with_control_plane_url(mut self, url: impl Into<String>) -> Self {
        self.control_plane_url = url.into();
        self
    }

    /// Pin the data plane host instead of looking it up.
    ///
    /// Accepts a bare host name as returned by Pinecone or a full URL.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = OnceCell::new_with(Some(host.into()));
        self
    }

    /// How often, and how many times, to check a new index for readiness
    /// before [`ensure_collection`](VectorStore::ensure_collection) gives up.
    ///
    /// Defaults to every 5 seconds, 60 times.
    pub fn with_readiness_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.ready_poll_interval = interval;
        self.ready_max_attempts = max_attempts.max(1);
        self
    }

    /// The name of the index this store reads and writes.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn store_error(message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.into(), message: message.into() }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
    }

    fn control_plane(&self, path: &str) -> String {
        format!("{}/{path}", self.control_plane_url.trim_end_matches('/'))
    }

    async fn send(builder: RequestBuilder, operation: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            error!(backend = BACKEND, operation, error = %e, "request failed");
            Self::store_error(format!("{operation} request failed: {e}"))
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(backend = BACKEND, operation, %status, body = %body, "API error");
        Err(Self::store_error(format!("{operation} returned {status}: {body}")))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response, operation: &str) -> Result<T> {
        response.json().await.map_err(|e| {
            error!(backend = BACKEND, operation, error = %e, "failed to parse response");
            Self::store_error(format!("failed to parse {operation} response: {e}"))
        })
    }

    async fn describe_index(&self) -> Result<IndexModel> {
        let url = self.control_plane(&format!("indexes/{}", self.index_name));
        let response = Self::send(self.request(Method::GET, url), "describe_index").await?;
        Self::parse(response, "describe_index").await
    }

    /// Base URL of the index's data plane, resolved on first use.
    async fn data_plane_url(&self) -> Result<String> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let index = self.describe_index().await?;
                if index.host.is_empty() {
                    return Err(Self::store_error(format!(
                        "index '{}' has no data plane host yet",
                        self.index_name
                    )));
                }
                debug!(index = %self.index_name, host = %index.host, "resolved data plane host");
                Ok(index.host)
            })
            .await?;

        if host.starts_with("http://") || host.starts_with("https://") {
            Ok(host.trim_end_matches('/').to_string())
        } else {
            Ok(format!("https://{host}"))
        }
    }

    /// Poll `describe_index` until the index reports ready, then cache its host.
    async fn wait_until_ready(&self) -> Result<()> {
        for attempt in 1..=self.ready_max_attempts {
            let index = self.describe_index().await?;
            if index.status.ready {
                debug!(index = %self.index_name, attempt, "index is ready");
                self.remember_host(index.host);
                return Ok(());
            }
            if attempt < self.ready_max_attempts {
                debug!(index = %self.index_name, attempt, "index not ready yet");
                tokio::time::sleep(self.ready_poll_interval).await;
            }
        }

        error!(
            backend = BACKEND,
            index = %self.index_name,
            attempts = self.ready_max_attempts,
            "index never became ready"
        );
        Err(Self::store_error(format!(
            "index '{}' not ready after {} checks",
            self.index_name, self.ready_max_attempts
        )))
    }

    fn remember_host(&self, host: String) {
        if !host.is_empty() {
            // Already set means another caller resolved it first; both values
            // describe the same index.
            let _ = self.host.set(host);
        }
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Deserialize, Default)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<Vector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct Vector<'a> {
    id: String,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

fn record_metadata(record: &Record) -> Map<String, Value> {
    let mut metadata: Map<String, Value> =
        record.metadata.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
    metadata.insert(TEXT_KEY.to_string(), Value::String(record.text.clone()));
    metadata
}

/// Convert a query match into a [`SearchResult`]; matches without stored text
/// are skipped.
fn match_to_result(m: Match) -> Option<SearchResult> {
    let mut metadata = m.metadata.unwrap_or_default();
    let Some(Value::String(text)) = metadata.remove(TEXT_KEY) else {
        warn!(backend = BACKEND, id = %m.id, "match has no text metadata, skipping");
        return None;
    };

    let metadata: HashMap<String, String> = metadata
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect();

    Some(SearchResult { text, score: m.score, metadata })
}

// ── VectorStore implementation ─────────────────────────────────────

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        let response =
            Self::send(self.request(Method::GET, self.control_plane("indexes")), "list_indexes")
                .await?;
        let list: IndexList = Self::parse(response, "list_indexes").await?;

        if let Some(index) = list.indexes.into_iter().find(|i| i.name == self.index_name) {
            if index.status.ready {
                self.remember_host(index.host);
                return Ok(());
            }
            return self.wait_until_ready().await;
        }

        info!(index = %self.index_name, dimensions, region = %self.region, "creating index");
        let body = CreateIndexRequest {
            name: &self.index_name,
            dimension: dimensions,
            metric: "cosine",
            spec: IndexSpec { serverless: ServerlessSpec { cloud: &self.cloud, region: &self.region } },
        };

        let response = self
            .request(Method::POST, self.control_plane("indexes"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = BACKEND, error = %e, "create_index request failed");
                Self::store_error(format!("create_index request failed: {e}"))
            })?;

        // Lost a creation race with a concurrent request.
        if response.status() == StatusCode::CONFLICT {
            debug!(index = %self.index_name, "index already exists");
            return self.wait_until_ready().await;
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = BACKEND, %status, body = %body, "create_index failed");
            return Err(Self::store_error(format!("create_index returned {status}: {body}")));
        }

        let created: IndexModel = Self::parse(response, "create_index").await?;
        if created.status.ready {
            self.remember_host(created.host);
            return Ok(());
        }
        self.wait_until_ready().await
    }

    async fn upsert(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let url = format!("{}/vectors/upsert", self.data_plane_url().await?);
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let body = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|record| Vector {
                        id: Uuid::new_v4().to_string(),
                        values: &record.embedding,
                        metadata: record_metadata(record),
                    })
                    .collect(),
                namespace: self.namespace.as_deref(),
            };
            Self::send(self.request(Method::POST, url.clone()).json(&body), "upsert").await?;
        }

        debug!(index = %self.index_name, count = records.len(), "upserted vectors to pinecone");
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let url = format!("{}/query", self.data_plane_url().await?);
        let body = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = Self::send(self.request(Method::POST, url).json(&body), "query").await?;
        let parsed: QueryResponse = Self::parse(response, "query").await?;

        let mut results: Vec<SearchResult> =
            parsed.matches.into_iter().filter_map(match_to_result).collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        debug!(index = %self.index_name, result_count = results.len(), "pinecone query completed");
        Ok(results)
    }
}
