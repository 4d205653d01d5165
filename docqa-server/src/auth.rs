//! Function-key authentication for the `/api/*` routes.
//!
//! When a key is configured, a request must carry it in either:
//! - the `x-functions-key` header
//! - the `code` query parameter
//!
//! Requests without the right key receive `401 Unauthorized`.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

#[derive(Deserialize)]
struct KeyParams {
    code: Option<String>,
}

fn extract_key(request: &Request) -> Option<String> {
    // Header first, then the query string.
    if let Some(key) = request.headers().get(FUNCTION_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    Query::<KeyParams>::try_from_uri(request.uri()).ok().and_then(|Query(params)| params.code)
}

/// Compares in time independent of where the keys first differ.
fn key_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Middleware enforcing the configured function key. A no-op when none is set.
pub async fn require_function_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.function_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    match extract_key(&request) {
        Some(key) if key_matches(&key, expected) => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "rejected request: invalid function key");
            Err(ApiError::Unauthorized)
        }
        None => {
            warn!(path = %request.uri().path(), "rejected request: missing function key");
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(key) = header {
            builder = builder.header(FUNCTION_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn header_key_is_extracted() {
        assert_eq!(extract_key(&request("/api/get_answer", Some("k1"))).as_deref(), Some("k1"));
    }

    #[test]
    fn query_code_is_extracted_and_decoded() {
        let req = request("/api/get_answer?foo=1&code=a%2Fb", None);
        assert_eq!(extract_key(&req).as_deref(), Some("a/b"));
    }

    #[test]
    fn header_takes_precedence_over_query() {
        let req = request("/api/get_answer?code=from-query", Some("from-header"));
        assert_eq!(extract_key(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn keys_match_only_when_identical() {
        assert!(key_matches("s3cret", "s3cret"));
        assert!(!key_matches("s3creT", "s3cret"));
        assert!(!key_matches("s3cre", "s3cret"));
        assert!(!key_matches("", "s3cret"));
    }

    #[test]
    fn absent_key_yields_none() {
        assert_eq!(extract_key(&request("/api/get_answer", None)), None);
        assert_eq!(extract_key(&request("/api/get_answer?other=1", None)), None);
    }
}
