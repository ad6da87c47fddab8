//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! AgentsConfig::default()
//!     → loader.rs (optional TOML file, then environment overlay)
//!     → validation.rs (semantic checks, all errors at once)
//!     → AgentsConfig (validated, immutable)
//!     → shared via Arc with handlers and integration clients
//! ```
//!
//! # Design Decisions
//! - Built once at startup; nothing reads the process environment afterwards
//! - All fields have defaults to allow minimal configs
//! - Missing integration credentials are not fatal: the agent still serves
//!   `/healthz` and the affected call fails at request time

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::{
    AgentsConfig, EmailConfig, GithubConfig, GoogleConfig, HttpConfig, ListenerConfig, LlmConfig,
    LlmProvider, LogFormat, ObservabilityConfig, QuoteConfig, RetryConfig, SalesConfig,
    TimeoutConfig,
};
