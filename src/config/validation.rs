//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats. All
//! problems are reported together rather than stopping at the first one.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::AgentsConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &AgentsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if HeaderValue::from_str(&config.http.allowed_origin).is_err() {
        errors.push(ValidationError::new(
            "http.allowed_origin",
            "must be a valid header value",
        ));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be > 0"));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.llm_request_secs", timeouts.llm_request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be > 0"));
        }
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if !retries.initial_delay_secs.is_finite() || retries.initial_delay_secs < 0.0 {
        errors.push(ValidationError::new(
            "retries.initial_delay_secs",
            "must be a finite, non-negative number",
        ));
    }
    if !retries.backoff_multiplier.is_finite() || retries.backoff_multiplier < 0.0 {
        errors.push(ValidationError::new(
            "retries.backoff_multiplier",
            "must be a finite, non-negative number",
        ));
    }

    for (field, value) in [
        ("llm.ollama_host", &config.llm.ollama_host),
        ("llm.openai_base_url", &config.llm.openai_base_url),
        ("email.sendgrid_base_url", &config.email.sendgrid_base_url),
        ("google.metadata_base_url", &config.google.metadata_base_url),
        ("google.storage_base_url", &config.google.storage_base_url),
        ("google.iam_base_url", &config.google.iam_base_url),
        ("google.docs_base_url", &config.google.docs_base_url),
        ("google.drive_base_url", &config.google.drive_base_url),
        ("github.api_base_url", &config.github.api_base_url),
        ("quotes.base_url", &config.quotes.base_url),
    ] {
        if let Err(e) = Url::parse(value) {
            errors.push(ValidationError::new(field, format!("'{value}' is not a URL: {e}")));
        }
    }

    if config.google.signed_url_ttl_secs == 0 || config.google.signed_url_ttl_secs > 7 * 24 * 3600 {
        errors.push(ValidationError::new(
            "google.signed_url_ttl_secs",
            "must be between 1 second and 7 days",
        ));
    }

    if let Some(repo) = &config.github.repository {
        let mut parts = repo.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !well_formed {
            errors.push(ValidationError::new(
                "github.repository",
                format!("'{repo}' is not in owner/name form"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&AgentsConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = AgentsConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.retries.max_attempts = 0;
        config.retries.initial_delay_secs = f64::NAN;
        config.retries.backoff_multiplier = -1.0;
        config.github.repository = Some("just-a-name".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "retries.max_attempts",
                "retries.initial_delay_secs",
                "retries.backoff_multiplier",
                "github.repository",
            ]
        );
    }

    #[test]
    fn test_zero_initial_delay_is_allowed() {
        let mut config = AgentsConfig::default();
        config.retries.initial_delay_secs = 0.0;
        config.retries.max_attempts = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_base_urls_must_parse() {
        let mut config = AgentsConfig::default();
        config.quotes.base_url = "not a url".into();
        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["quotes.base_url"]);
    }

    #[test]
    fn test_origin_must_be_header_safe() {
        let mut config = AgentsConfig::default();
        config.http.allowed_origin = "https://example.com\n".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "http.allowed_origin");
    }
}
