//! Insurance agent services.
//!
//! A family of small HTTP services ("agents") that each run one workflow
//! against third-party APIs: an LLM provider, SendGrid, Google Cloud
//! Storage, Google Docs/Drive, GitHub and the BackNine quoting API.

// Core subsystems
pub mod agents;
pub mod config;
pub mod http;
pub mod integrations;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use agents::AgentKind;
pub use config::AgentsConfig;
pub use http::{AgentServer, AppState};
pub use lifecycle::Shutdown;
pub use resilience::RetryPolicy;
