use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use docqa_rag::{Answer, Document, Query};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::auth::require_function_key;
use crate::error::ApiError;
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    let api = Router::new()
        .route("/process_document", post(process_document))
        .route("/get_answer", post(get_answer))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_function_key));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "docqa"}))
}

/// `POST /api/process_document`: the raw body is the document text.
async fn process_document(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body?;
    let text = String::from_utf8(body.to_vec())
        .map_err(|_| ApiError::BadRequest("Request body must be UTF-8 text".to_string()))?;
    debug!(bytes = text.len(), "received document");

    let report = state.pipeline.ingest(&Document::new(text)).await?;

    Ok(Json(json!({
        "status": "success",
        "chunks_processed": report.chunks_processed,
    })))
}

#[derive(Deserialize)]
struct AnswerRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    system_prompt: Option<String>,
}

#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
    context: String,
    similar_docs: Vec<SimilarDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<FallbackMetadata>,
}

#[derive(Serialize)]
struct SimilarDoc {
    content: String,
    score: f32,
}

/// Present only when nothing relevant was retrieved.
#[derive(Serialize)]
struct FallbackMetadata {
    query: String,
    documents_found: usize,
}

impl AnswerResponse {
    fn new(query: String, answer: Answer) -> Self {
        let metadata = answer
            .is_fallback()
            .then(|| FallbackMetadata { query, documents_found: answer.documents_found });
        Self {
            answer: answer.answer,
            context: answer.context,
            similar_docs: answer
                .similar_docs
                .into_iter()
                .map(|doc| SimilarDoc { content: doc.text, score: doc.score })
                .collect(),
            metadata,
        }
    }
}

/// `POST /api/get_answer`: `{"query": ..., "system_prompt": ...}`.
async fn get_answer(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let body = body?;
    let request: AnswerRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON in request body: {e}")))?;

    let query = Query {
        query: request.query.unwrap_or_default(),
        system_prompt: request.system_prompt,
    };
    let answer = state.pipeline.answer(&query).await?;

    Ok(Json(AnswerResponse::new(query.query, answer)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use docqa_rag::mock::{MockChatModel, MockEmbeddingProvider};
    use docqa_rag::{InMemoryVectorStore, RagConfig, RagPipeline, RecursiveChunker};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn router(model: Arc<MockChatModel>) -> Router {
        let config = RagConfig::builder().similarity_threshold(0.0).build().unwrap();
        let pipeline = RagPipeline::builder()
            .chunker(Arc::new(RecursiveChunker::from_config(&config)))
            .config(config)
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(64)))
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .chat_model(model)
            .build()
            .unwrap();
        app_router(AppState::new(Arc::new(pipeline)))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::post(uri).header(header::CONTENT_TYPE, "application/json").body(body.into()).unwrap()
    }

    #[tokio::test]
    async fn health_is_served() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(router(Arc::new(MockChatModel::new("x"))), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let request = Request::get("/api/unknown").body(Body::empty()).unwrap();
        let (status, _) = send(router(Arc::new(MockChatModel::new("x"))), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn system_prompt_reaches_the_model() {
        let model = Arc::new(MockChatModel::new("Managers do."));
        let app = router(model.clone());

        let (status, _) =
            send(app.clone(), post("/api/process_document", "Managers approve sales orders.")).await;
        assert_eq!(status, StatusCode::OK);

        let body = r#"{"query": "Who approves sales orders?", "system_prompt": "Be brief."}"#;
        let (status, answer) = send(app, post("/api/get_answer", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["answer"], "Managers do.");

        let prompt = model.last_prompt().unwrap();
        assert_eq!(prompt[0].content, "Be brief.");
    }

    #[tokio::test]
    async fn non_string_query_is_a_bad_request() {
        let (status, body) =
            send(router(Arc::new(MockChatModel::new("x"))), post("/api/get_answer", r#"{"query": 42}"#))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }
}
