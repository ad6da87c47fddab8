//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from `ObservabilityConfig`
//! - Prefix every line of a request with `[req:<id>]`

use std::fmt::Display;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::http::request::RequestId;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "insurance_agents={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Logger bound to one request. Carries no state beyond the id.
#[derive(Debug, Clone)]
pub struct RequestLog {
    id: RequestId,
}

impl RequestLog {
    pub fn new(id: RequestId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// `"[req:<id>] <message>"`.
    pub fn line(&self, message: impl Display) -> String {
        format!("[req:{}] {}", self.id, message)
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(request_id = %self.id, "{}", self.line(message));
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(request_id = %self.id, "{}", self.line(message));
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(request_id = %self.id, "{}", self.line(message));
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(request_id = %self.id, "{}", self.line(message));
    }
}
