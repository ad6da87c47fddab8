//! Agent workflows.
//!
//! # Data Flow
//! ```text
//! CLI picks one AgentKind
//!     → routes() mounts that agent's endpoints on the shared server
//!     → handler builds a RequestLog from the request id
//!     → workflow calls integrations through AppState
//!     → Ok(Json(..)) or AgentError → response.rs
//! ```
//!
//! Every agent is deployed as its own process; nothing is shared between
//! them at runtime.

pub mod aegis;
pub mod architect;
pub mod fixtures;
pub mod growth;
pub mod oracle;
pub mod sales;

use std::fmt;

use axum::Router;

use crate::config::{AgentsConfig, LlmProvider};
use crate::http::server::AppState;
use crate::security::limits::{TEXT_BODY_LIMIT, UPLOAD_BODY_LIMIT};

/// The deployable agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum AgentKind {
    /// Renewal retention digest.
    Aegis,
    /// Landing pages committed to GitHub.
    Architect,
    /// Marketing personas report.
    Growth,
    /// Policy audit and budget tool webhooks.
    Oracle,
    /// Website sales chat and lead capture.
    Sales,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Aegis,
        AgentKind::Architect,
        AgentKind::Growth,
        AgentKind::Oracle,
        AgentKind::Sales,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Aegis => "aegis",
            AgentKind::Architect => "architect",
            AgentKind::Growth => "growth",
            AgentKind::Oracle => "oracle",
            AgentKind::Sales => "sales",
        }
    }

    /// Largest accepted request body.
    pub fn body_limit(&self) -> usize {
        match self {
            AgentKind::Oracle => UPLOAD_BODY_LIMIT,
            _ => TEXT_BODY_LIMIT,
        }
    }

    pub fn routes(&self) -> Router<AppState> {
        match self {
            AgentKind::Aegis => aegis::routes(),
            AgentKind::Architect => architect::routes(),
            AgentKind::Growth => growth::routes(),
            AgentKind::Oracle => oracle::routes(),
            AgentKind::Sales => sales::routes(),
        }
    }

    /// Settings this agent needs that `config` leaves unset, by env var name.
    pub fn missing_settings(&self, config: &AgentsConfig) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let mut require = |present: bool, name: &'static str| {
            if !present {
                missing.push(name);
            }
        };

        let uses_llm = !matches!(self, AgentKind::Oracle);
        if uses_llm && config.llm.provider == LlmProvider::OpenAi {
            require(config.llm.openai_api_key.is_some(), "OPENAI_API_KEY");
        }

        require(config.email.sendgrid_api_key.is_some(), "SENDGRID_API_KEY");
        match self {
            AgentKind::Sales => require(
                config.email.lead_recipient.is_some() || config.email.default_recipient.is_some(),
                "EMAIL_RECEIVE",
            ),
            _ => require(config.email.default_recipient.is_some(), "YOUR_EMAIL"),
        }

        match self {
            AgentKind::Aegis => {
                require(config.quotes.backnine_api_key.is_some(), "BACKNINE_API_KEY");
            }
            AgentKind::Architect => {
                require(config.github.token.is_some(), "GITHUB_TOKEN");
                require(config.github.repository.is_some(), "GITHUB_REPOSITORY");
            }
            AgentKind::Growth => {
                require(config.google.growth_template_id.is_some(), "GROWTH_AGENT_TEMPLATE_ID");
            }
            AgentKind::Oracle => {
                require(config.google.bucket_name.is_some(), "GCS_BUCKET_NAME");
                require(config.google.audit_template_id.is_some(), "AUDIT_TEMPLATE_ID");
            }
            AgentKind::Sales => {
                require(config.sales.ethos_url.is_some(), "ETHOS_URL");
                require(config.sales.backnine_url.is_some(), "BACKNINE_URL");
            }
        }

        missing
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
