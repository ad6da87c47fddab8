//! Configuration loading.
//!
//! Defaults, then an optional TOML file, then environment variables. The
//! environment names are the ones the agents have always been deployed with.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AgentsConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, overlay with the process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<AgentsConfig, ConfigError> {
    load_config_with(path, |_| {})
}

/// [`load_config`] with `overrides` (command-line flags) applied after the
/// environment and before validation.
pub fn load_config_with<O>(path: Option<&Path>, overrides: O) -> Result<AgentsConfig, ConfigError>
where
    O: FnOnce(&mut AgentsConfig),
{
    resolve(path, |name| std::env::var(name).ok(), overrides)
}

fn resolve<L, O>(path: Option<&Path>, lookup: L, overrides: O) -> Result<AgentsConfig, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    O: FnOnce(&mut AgentsConfig),
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => AgentsConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without applying environment overrides.
pub fn load_file(path: &Path) -> Result<AgentsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment settings onto `config`.
///
/// `lookup` resolves a variable name; empty values count as unset.
pub fn apply_env<F>(config: &mut AgentsConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(port) = parse::<u16>(&var, "PORT")? {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
    if let Some(origin) = var("ALLOWED_ORIGIN") {
        config.http.allowed_origin = origin;
    }

    // AI_MODEL is the older name used by the sales agent.
    let provider = match parse(&var, "LLM_PROVIDER")? {
        Some(provider) => Some(provider),
        None => parse(&var, "AI_MODEL")?,
    };
    if let Some(provider) = provider {
        config.llm.provider = provider;
    }
    set(&mut config.llm.ollama_host, var("OLLAMA_HOST"));
    set(&mut config.llm.ollama_model, var("OLLAMA_MODEL"));
    set_opt(&mut config.llm.openai_api_key, var("OPENAI_API_KEY"));
    set(&mut config.llm.openai_model, var("OPENAI_MODEL"));
    set(&mut config.llm.openai_base_url, var("OPENAI_BASE_URL"));

    set_opt(&mut config.email.sendgrid_api_key, var("SENDGRID_API_KEY"));
    set_opt(&mut config.email.default_recipient, var("YOUR_EMAIL"));
    set_opt(&mut config.email.lead_recipient, var("EMAIL_RECEIVE"));

    set_opt(&mut config.google.access_token, var("GOOGLE_ACCESS_TOKEN"));
    set_opt(&mut config.google.bucket_name, var("GCS_BUCKET_NAME"));
    set(&mut config.google.upload_prefix, var("GCS_UPLOAD_PREFIX"));
    set_opt(&mut config.google.signer_email, var("GCS_SIGNER_EMAIL"));
    set_opt(&mut config.google.growth_template_id, var("GROWTH_AGENT_TEMPLATE_ID"));
    set_opt(&mut config.google.audit_template_id, var("AUDIT_TEMPLATE_ID"));

    set_opt(&mut config.github.token, var("GITHUB_TOKEN"));
    set_opt(&mut config.github.repository, var("GITHUB_REPOSITORY"));
    set(&mut config.github.base_branch, var("GITHUB_BASE_BRANCH"));

    set_opt(&mut config.quotes.backnine_api_key, var("BACKNINE_API_KEY"));
    set(&mut config.quotes.base_url, var("BACKNINE_BASE_URL"));

    set_opt(&mut config.sales.ethos_url, var("ETHOS_URL"));
    set_opt(&mut config.sales.backnine_url, var("BACKNINE_URL"));

    if let Some(n) = parse(&var, "RETRY_MAX_ATTEMPTS")? {
        config.retries.max_attempts = n;
    }
    if let Some(secs) = parse(&var, "RETRY_INITIAL_DELAY_SECS")? {
        config.retries.initial_delay_secs = secs;
    }
    if let Some(factor) = parse(&var, "RETRY_BACKOFF_MULTIPLIER")? {
        config.retries.backoff_multiplier = factor;
    }

    set(&mut config.observability.log_level, var("LOG_LEVEL"));
    if let Some(format) = parse(&var, "LOG_FORMAT")? {
        config.observability.log_format = format;
    }
    if let Some(enabled) = parse(&var, "METRICS_ENABLED")? {
        config.observability.metrics_enabled = enabled;
    }
    set(&mut config.observability.metrics_address, var("METRICS_ADDRESS"));

    Ok(())
}

fn set(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn set_opt(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Env {
                var: name,
                reason: e.to_string(),
            })
        })
        .transpose()
}
