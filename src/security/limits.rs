//! Request body limits.
//!
//! Two layers enforce the cap: `RequestBodyLimitLayer` rejects early on
//! `Content-Length` (413 Payload Too Large) and `DefaultBodyLimit` bounds
//! what body extractors (JSON, form, multipart) will buffer.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Cap for agents that take JSON or small forms.
pub const TEXT_BODY_LIMIT: usize = 1024 * 1024;

/// Cap for the file-upload agent.
pub const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn with_body_limit<S>(router: Router<S>, limit: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
}
