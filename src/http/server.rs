//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the shared integration clients once (`AppState`)
//! - Mount the selected agent's routes plus `/healthz`
//! - Wire up middleware (request id, tracing, CORS, timeout, panics, limits)
//! - Serve until shutdown is signalled

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::agents::AgentKind;
use crate::config::AgentsConfig;
use crate::http::request::{RequestId, ShortRequestId, X_REQUEST_ID};
use crate::http::response::{panic_response, AgentError};
use crate::integrations::{
    llm, BackNineClient, CodeHost, DocumentStore, GcsStore, GithubClient, GoogleAuth, GoogleDocs,
    Notifier, ObjectStore, QuoteSource, TextGenerator,
};
use crate::lifecycle::shutdown;
use crate::observability::{metrics, RequestLog};
use crate::resilience::{timeouts, RetryPolicy};
use crate::security::headers::{origin_header, with_cors};
use crate::security::limits::with_body_limit;

/// Application state injected into handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AgentsConfig>,
    pub llm: Arc<dyn TextGenerator>,
    pub notifier: Notifier,
    pub quotes: Arc<dyn QuoteSource>,
    pub documents: Arc<dyn DocumentStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub code_host: Arc<dyn CodeHost>,
}

impl AppState {
    /// Build every client from `config`. No network traffic happens here.
    pub fn from_config(config: AgentsConfig) -> Result<Self, reqwest::Error> {
        let http = timeouts::outbound_client(&config.timeouts)?;
        let llm_http = timeouts::llm_client(&config.timeouts)?;
        let retry = RetryPolicy::from(&config.retries);
        let google = &config.google;
        let auth = GoogleAuth::new(
            http.clone(),
            google.access_token.clone(),
            &google.metadata_base_url,
        );

        Ok(Self {
            llm: llm::text_generator(&config.llm, llm_http),
            notifier: Notifier::from_config(&config.email, http.clone(), retry),
            quotes: Arc::new(BackNineClient::new(http.clone(), &config.quotes, retry)),
            documents: Arc::new(GoogleDocs::new(
                http.clone(),
                auth.clone(),
                &google.drive_base_url,
                &google.docs_base_url,
            )),
            objects: Arc::new(GcsStore::new(http.clone(), auth, google.clone(), retry)),
            code_host: Arc::new(GithubClient::new(http, config.github.clone())),
            config: Arc::new(config),
        })
    }
}

/// Build the router for `agent` with all middleware layers.
pub fn build_router(agent: AgentKind, state: AppState) -> Router {
    let http = state.config.http.clone();

    let router = agent
        .routes()
        .route("/healthz", get(healthz))
        .route_layer(middleware::from_fn_with_state(agent, track_requests))
        .with_state(state);

    let router = with_body_limit(router, agent.body_limit())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            Duration::from_secs(http.request_timeout_secs),
            enforce_deadline,
        ));

    with_cors(router, origin_header(&http.allowed_origin))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(ShortRequestId))
}

async fn healthz() -> &'static str {
    "OK"
}

/// Abandon a handler that outlives `deadline` and answer with the generic 500.
async fn enforce_deadline(State(deadline): State<Duration>, request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(RequestId::from)
        .unwrap_or_else(RequestId::generate);

    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => RequestLog::new(id)
            .failure(
                "deadline",
                AgentError::Internal(format!("handler exceeded {}s", deadline.as_secs())),
            )
            .into_response(),
    }
}

async fn track_requests(State(agent): State<AgentKind>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(agent.name(), &route, response.status().as_u16(), start);
    response
}

/// HTTP server for one agent.
pub struct AgentServer {
    agent: AgentKind,
    router: Router,
}

impl AgentServer {
    pub fn new(agent: AgentKind, state: AppState) -> Self {
        Self {
            agent,
            router: build_router(agent, state),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(agent = %self.agent, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!(agent = %self.agent, "HTTP server stopped");
        Ok(())
    }
}
