//! Configuration schema definitions.
//!
//! Every agent reads the same `AgentsConfig`; settings an agent does not use
//! are simply ignored. All types derive Serde traits so a TOML file can
//! supply any subset of fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration shared by all agents.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentsConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound HTTP behaviour (CORS origin, handler deadline).
    pub http: HttpConfig,

    /// Outbound call deadlines.
    pub timeouts: TimeoutConfig,

    /// Retry policy for outbound wrappers.
    pub retries: RetryConfig,

    /// Text-generation provider selection.
    pub llm: LlmConfig,

    /// SendGrid settings and recipients.
    pub email: EmailConfig,

    /// Google Cloud Storage, Docs and Drive settings.
    pub google: GoogleConfig,

    /// GitHub repository the architect agent commits to.
    pub github: GithubConfig,

    /// BackNine quoting API.
    pub quotes: QuoteConfig,

    /// Links offered by the sales chat.
    pub sales: SalesConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Inbound HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Value of `Access-Control-Allow-Origin` on every response.
    pub allowed_origin: String,

    /// Upper bound on a whole handler run, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
            request_timeout_secs: 600,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total request timeout for ordinary APIs in seconds.
    pub request_secs: u64,

    /// Total request timeout for LLM providers in seconds.
    pub llm_request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
            llm_request_secs: 120,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub max_attempts: u32,

    /// Delay after the first failure, in seconds.
    pub initial_delay_secs: f64,

    /// Factor applied to the delay after every failure.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_secs: 0.8,
            backoff_multiplier: 2.0,
        }
    }
}

/// Which text-generation backend to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama runtime.
    #[default]
    Ollama,
    /// Hosted OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// Vertex AI placeholder that echoes its input.
    Vertex,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Vertex => "vertex",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" => Ok(LlmProvider::OpenAi),
            "vertex" => Ok(LlmProvider::Vertex),
            other => Err(format!("unknown LLM provider '{other}'")),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,

    /// Base URL of the Ollama runtime.
    pub ollama_host: String,

    pub ollama_model: String,

    pub openai_api_key: Option<String>,

    pub openai_model: String,

    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            ollama_host: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4-turbo".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
        }
    }
}

/// SendGrid configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    pub sendgrid_api_key: Option<String>,

    pub sendgrid_base_url: String,

    /// Sender and default recipient of agent notifications.
    pub default_recipient: Option<String>,

    /// Recipient of leads captured by the sales chat.
    pub lead_recipient: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            sendgrid_base_url: "https://api.sendgrid.com".to_string(),
            default_recipient: None,
            lead_recipient: None,
        }
    }
}

/// Google Cloud configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Static OAuth access token. When unset, tokens come from the metadata server.
    pub access_token: Option<String>,

    pub metadata_base_url: String,

    pub storage_base_url: String,

    /// Host embedded in signed URLs handed to end users.
    pub signed_url_host: String,

    pub iam_base_url: String,

    pub docs_base_url: String,

    pub drive_base_url: String,

    pub bucket_name: Option<String>,

    /// Object name prefix for uploads.
    pub upload_prefix: String,

    /// Service account used to sign URLs. Defaults to the metadata server identity.
    pub signer_email: Option<String>,

    /// Lifetime of signed download URLs in seconds.
    pub signed_url_ttl_secs: u64,

    /// Google Doc template for the growth report.
    pub growth_template_id: Option<String>,

    /// Google Doc template for the policy audit report.
    pub audit_template_id: Option<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            metadata_base_url: "http://metadata.google.internal".to_string(),
            storage_base_url: "https://storage.googleapis.com".to_string(),
            signed_url_host: "storage.googleapis.com".to_string(),
            iam_base_url: "https://iamcredentials.googleapis.com".to_string(),
            docs_base_url: "https://docs.googleapis.com".to_string(),
            drive_base_url: "https://www.googleapis.com".to_string(),
            bucket_name: None,
            upload_prefix: "uploads".to_string(),
            signer_email: None,
            signed_url_ttl_secs: 7 * 24 * 3600,
            growth_template_id: None,
            audit_template_id: None,
        }
    }
}

/// GitHub configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    pub token: Option<String>,

    /// Repository in `owner/name` form.
    pub repository: Option<String>,

    /// Branch new feature branches are cut from.
    pub base_branch: String,

    pub api_base_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repository: None,
            base_branch: "main".to_string(),
            api_base_url: "https://api.github.com".to_string(),
        }
    }
}

/// BackNine quoting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub backnine_api_key: Option<String>,

    pub base_url: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            backnine_api_key: None,
            base_url: "https://api.back9ins.com".to_string(),
        }
    }
}

/// Links the sales chat offers to visitors.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SalesConfig {
    /// Instant-apply tool offered first.
    pub ethos_url: Option<String>,

    /// Alternate tool offered once the first has been declined.
    pub backnine_url: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AgentsConfig = toml::from_str(
            r#"
            [llm]
            provider = "openai"
            openai_api_key = "sk-test"

            [retries]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.ollama_model, "llama3");
        assert_eq!(config.retries.max_attempts, 5);
        assert_eq!(config.retries.initial_delay_secs, 0.8);
        assert_eq!(config.http.allowed_origin, "*");
        assert_eq!(config.google.upload_prefix, "uploads");
    }

    #[test]
    fn test_provider_parsing_is_case_insensitive() {
        assert_eq!("Vertex".parse::<LlmProvider>(), Ok(LlmProvider::Vertex));
        assert_eq!(" OPENAI ".parse::<LlmProvider>(), Ok(LlmProvider::OpenAi));
        assert!("claude".parse::<LlmProvider>().is_err());
    }
}
