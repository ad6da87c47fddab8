//! CORS response headers.
//!
//! Browsers call the agents directly from the marketing site, so every
//! response (including 4xx/5xx and preflight) carries the same three
//! `Access-Control-*` headers.

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Stamp the CORS headers on every response produced by `router`.
pub fn with_cors<S>(router: Router<S>, allowed_origin: HeaderValue) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            allowed_origin,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
}

/// Parse the configured origin, falling back to `*`.
pub fn origin_header(allowed_origin: &str) -> HeaderValue {
    HeaderValue::from_str(allowed_origin).unwrap_or_else(|_| {
        tracing::warn!(allowed_origin, "Invalid allowed origin, using '*'");
        HeaderValue::from_static("*")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_headers_present_on_errors_too() {
        let app = with_cors(
            Router::new().route("/", get(|| async { StatusCode::BAD_REQUEST })),
            HeaderValue::from_static("https://newinsurd.com"),
        );

        for uri in ["/", "/missing"] {
            let res = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let headers = res.headers();
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://newinsurd.com");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        }
    }

    #[test]
    fn test_invalid_origin_falls_back_to_wildcard() {
        assert_eq!(origin_header("bad\norigin"), "*");
        assert_eq!(origin_header("https://a.example"), "https://a.example");
    }
}
