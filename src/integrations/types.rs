//! Shared error type and HTTP helpers for third-party clients.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::observability::metrics;

const MAX_ERROR_BODY: usize = 512;

/// Errors that can occur while calling a third-party API.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// A required setting (named by its environment variable) is absent.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Connection failure, timeout, or an unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The API answered 2xx with a body we cannot use.
    #[error("Unexpected {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl IntegrationError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Transport failures, 429 and 5xx are transient; missing settings, other
    /// 4xx and malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            IntegrationError::Http(_) => true,
            IntegrationError::Api { status, .. } => *status == 429 || *status >= 500,
            IntegrationError::NotConfigured(_) | IntegrationError::Decode { .. } => false,
        }
    }

    pub(crate) fn decode(service: &'static str, message: impl Into<String>) -> Self {
        IntegrationError::Decode {
            service,
            message: message.into(),
        }
    }
}

/// Send `request`, record the outcome, and reject non-2xx statuses.
pub(crate) async fn send(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, IntegrationError> {
    let result = match request.send().await {
        Ok(response) => ensure_success(service, response).await,
        Err(e) => Err(IntegrationError::Http(e)),
    };
    metrics::record_outbound(service, result.is_ok());
    result
}

pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    truncate(&mut body, MAX_ERROR_BODY);
    Err(IntegrationError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn json_body<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, IntegrationError> {
    response
        .json::<T>()
        .await
        .map_err(|e| IntegrationError::decode(service, e.to_string()))
}

/// Truncate `s` to at most `max` bytes on a char boundary.
pub fn truncate(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// First `max` characters of `s`.
pub fn take_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let api = |status| IntegrationError::Api {
            service: "test",
            status,
            body: String::new(),
        };
        assert!(api(500).is_transient());
        assert!(api(503).is_transient());
        assert!(api(429).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(401).is_transient());
        assert!(!IntegrationError::NotConfigured("X").is_transient());
        assert!(!IntegrationError::decode("test", "missing id").is_transient());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut s = "héllo".to_string();
        truncate(&mut s, 2);
        assert_eq!(s, "h");
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("hi", 10), "hi");
    }
}
