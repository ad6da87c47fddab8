//! Error-to-response mapping.
//!
//! # Responsibilities
//! - Map handler failures to HTTP status codes
//! - Keep internal detail out of response bodies
//!
//! # Design Decisions
//! - Validation failures → 400 with a descriptive `{"error": ...}`
//! - Everything else → 500 `{"error": "Internal server error"}`; the detail
//!   goes to the request-scoped log, never to the caller

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::integrations::IntegrationError;
use crate::observability::RequestLog;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Failure of an agent handler.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The caller sent something unusable (missing file, bad field).
    #[error("{0}")]
    Validation(String),

    /// An upload outgrew the body limit while streaming.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// A third-party API call failed.
    #[error(transparent)]
    Integration(#[from] IntegrationError),

    /// Anything else unexpected.
    #[error("{0}")]
    Internal(String),
}

impl AgentError {
    pub fn validation(message: impl Into<String>) -> Self {
        AgentError::Validation(message.into())
    }

    /// Body extractor failure: 413 stays 413, anything else is the caller's fault.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AgentError::PayloadTooLarge
        } else {
            AgentError::Validation(message.into())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AgentError::Validation(_) => StatusCode::BAD_REQUEST,
            AgentError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AgentError::Integration(_) | AgentError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let message = match &self {
            AgentError::Validation(message) => message.clone(),
            AgentError::PayloadTooLarge => self.to_string(),
            AgentError::Integration(_) | AgentError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

impl RequestLog {
    /// Log a handler failure under `scope` and hand it back for the response.
    pub fn failure(&self, scope: &str, error: AgentError) -> AgentError {
        match &error {
            AgentError::Validation(_) | AgentError::PayloadTooLarge => {
                self.warn(format_args!("ERROR ({scope}): {error}"))
            }
            AgentError::Integration(_) | AgentError::Internal(_) => {
                self.error(format_args!("FATAL ({scope}): {error}"))
            }
        }
        error
    }
}

/// `204 No Content` answer to CORS preflight requests.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// JSON body for panics caught by `CatchPanicLayer`.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_is_descriptive() {
        let res = AgentError::validation("No file uploaded").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await, json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_oversized_upload() {
        let res = AgentError::PayloadTooLarge.into_response();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(res).await, json!({"error": "Payload too large"}));
    }

    #[test]
    fn test_rejections_keep_payload_too_large() {
        assert!(matches!(
            AgentError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded"),
            AgentError::PayloadTooLarge
        ));
        assert!(matches!(
            AgentError::rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field `name`"),
            AgentError::Validation(m) if m == "missing field `name`"
        ));
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak() {
        let errors = [
            AgentError::Internal("db password is hunter2".into()),
            AgentError::Integration(IntegrationError::NotConfigured("GCS_BUCKET_NAME")),
        ];
        for error in errors {
            let res = error.into_response();
            assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_json(res).await, json!({"error": "Internal server error"}));
        }
    }
}
