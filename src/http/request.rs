//! Request identifiers.
//!
//! # Responsibilities
//! - Generate a short opaque token per request (12 hex chars of a UUID v4)
//! - Put it in `x-request-id` as early as possible (`SetRequestIdLayer`)
//! - Hand it to handlers through the [`RequestId`] extractor
//!
//! An `x-request-id` supplied by the caller is kept, so a request can be
//! followed across services.

use std::convert::Infallible;
use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{self, MakeRequestId};
use uuid::Uuid;

/// Header carrying the request identifier.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const ID_LEN: usize = 12;

/// Opaque per-request identifier used only for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Fresh random identifier.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `n` characters, for embedding in names such as branches.
    pub fn short(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `MakeRequestId` producing [`RequestId::generate`] tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortRequestId;

impl MakeRequestId for ShortRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<request_id::RequestId> {
        let id = RequestId::generate();
        HeaderValue::from_str(id.as_str())
            .ok()
            .map(request_id::RequestId::new)
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_layer = parts
            .extensions
            .get::<request_id::RequestId>()
            .and_then(|id| id.header_value().to_str().ok());
        let from_header = || {
            parts
                .headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
        };

        Ok(match from_layer.or_else(from_header) {
            Some(id) if !id.is_empty() => RequestId::from(id),
            // Handlers mounted without the layer still get an id.
            _ => RequestId::generate(),
        })
    }
}
