//! Per-request errors and their HTTP rendering
//!
//! Startup failures go through `anyhow` in `main`. Everything a handler can hit
//! is one of these variants and leaves the service as a JSON error body:
//! `{"error":{"type":"...","message":"...","request_id":"req_..."}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Active key slot is not configured. Not retried.
    #[error(transparent)]
    Configuration(#[from] gemini_pool::Error),

    /// Every attempt failed, across however many rotations that took.
    /// `last_error` is for logs only and never rendered.
    #[error("content generation temporarily unavailable after {attempts} attempts")]
    GenerationUnavailable { attempts: u32, last_error: String },

    /// Gemini answered, but not with usable content.
    #[error("generated content could not be used: {0}")]
    InvalidContent(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::GenerationUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidContent(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "invalid_request",
            Error::Configuration(_) => "configuration_error",
            Error::GenerationUnavailable { .. } => "generation_unavailable",
            Error::InvalidContent(_) => "invalid_content",
        }
    }

    /// Render as the JSON error body, tagged with the request id.
    pub fn into_response(self, request_id: &str) -> Response {
        if let Error::GenerationUnavailable { last_error, .. } = &self {
            warn!(request_id, last_error, "returning generation_unavailable");
        }
        let body = serde_json::json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
                "request_id": request_id,
            }
        });
        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_per_variant() {
        assert_eq!(
            Error::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Configuration(gemini_pool::Error::Configuration {
                slot: 1,
                name: "GEMINI_API_KEY_1".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::GenerationUnavailable {
                attempts: 3,
                last_error: "429".into()
            }
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::InvalidContent("no JSON".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn configuration_message_names_missing_setting() {
        let err = Error::from(gemini_pool::Error::Configuration {
            slot: 2,
            name: "GEMINI_API_KEY_2".into(),
        });
        assert!(err.to_string().contains("GEMINI_API_KEY_2"));
        assert_eq!(err.error_type(), "configuration_error");
    }

    #[tokio::test]
    async fn response_body_carries_type_and_request_id() {
        let response = Error::GenerationUnavailable {
            attempts: 3,
            last_error: "Gemini API error: 503 - {}".into(),
        }
        .into_response("req_abc123");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "generation_unavailable");
        assert_eq!(json["error"]["request_id"], "req_abc123");
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("temporarily unavailable")
        );
    }

    #[tokio::test]
    async fn unavailable_message_hides_upstream_body() {
        let err = Error::GenerationUnavailable {
            attempts: 2,
            last_error: r#"Gemini API error: 500 - {"error":{"status":"INTERNAL"}}"#.into(),
        };
        assert!(!err.to_string().contains("INTERNAL"));

        let response = err.into_response("req_hidden");
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let message = json["error"]["message"].as_str().unwrap();
        assert_eq!(
            message,
            "content generation temporarily unavailable after 2 attempts"
        );
        assert!(!body.windows(7).any(|w| w == b"Gemini "));
    }
}
