//! Error types for the upstream provider, the HTTP surface and the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Failure talking to the book-metadata provider.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Per-call or sequencer deadline elapsed
    #[error("upstream request timed out")]
    Timeout,

    /// Provider answered with a non-2xx status
    #[error("upstream returned HTTP {status}")]
    Status { status: u16, body: String },

    /// Provider answered 2xx with a body we could not read
    #[error("invalid upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    /// Upstream HTTP status, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            UpstreamError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Upstream response body as JSON when it parses, otherwise the error text.
    pub fn details(&self) -> Value {
        match self {
            UpstreamError::Status { body, .. } => {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
            }
            other => Value::String(other.to_string()),
        }
    }
}

/// Error returned from an API handler.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    pub fn upstream(message: &'static str, source: UpstreamError) -> Self {
        ApiError::Upstream { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Upstream { message, source } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": message,
                    "details": source.details(),
                    "status": source.status(),
                })),
            )
                .into_response(),
        }
    }
}

/// User-facing client failure. The message is fixed per operation; the
/// underlying cause is only logged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    #[error("Failed to search books. Please try again.")]
    Search,

    #[error("Failed to fetch book details. Please try again.")]
    BookDetails,

    #[error("Failed to fetch recommendations. Please try again.")]
    Recommendations,

    #[error("Failed to fetch popular books. Please try again.")]
    Popular,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_echoes_json_body() {
        let err = UpstreamError::Status {
            status: 403,
            body: r#"{"error":{"code":403,"message":"quota"}}"#.to_string(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.details()["error"]["message"], "quota");
    }

    #[test]
    fn status_error_keeps_plain_body() {
        let err = UpstreamError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.details(), Value::String("bad gateway".to_string()));
        assert_eq!(UpstreamError::Timeout.status(), None);
    }
}
