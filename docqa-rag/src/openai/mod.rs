//! OpenAI adapters: embeddings and chat completions over the REST API.
//!
//! Both adapters call the API directly with `reqwest`, one request per call and
//! no retry policy. The base URL is configurable so OpenAI-compatible
//! endpoints (and mock servers) can be targeted.

mod chat;
mod embedding;

pub use chat::{DEFAULT_CHAT_MODEL, OpenAIChatModel};
pub use embedding::{DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, OpenAIEmbeddingProvider};

use serde::Deserialize;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extract the human-readable message from an OpenAI error body, falling back
/// to the raw body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_prefers_api_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_detail(body.to_string()), "Incorrect API key provided");
        assert_eq!(error_detail("upstream timeout".to_string()), "upstream timeout");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("http://x/v1/", "embeddings"), "http://x/v1/embeddings");
        assert_eq!(endpoint(OPENAI_API_BASE, "chat/completions"), "https://api.openai.com/v1/chat/completions");
    }
}
