//! Timeout enforcement for outbound calls.
//!
//! Every reqwest client handed to an integration carries a connect and a
//! total request deadline. Retries sit above these deadlines, so a hung
//! upstream costs at most `attempts * request_secs`.

use std::time::Duration;

use crate::config::TimeoutConfig;

const USER_AGENT: &str = concat!("insurance-agents/", env!("CARGO_PKG_VERSION"));

/// Client for ordinary third-party APIs (SendGrid, Google, GitHub, BackNine).
pub fn outbound_client(config: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    build(config.connect_secs, config.request_secs)
}

/// Client for LLM providers, which routinely take far longer to answer.
pub fn llm_client(config: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    build(config.connect_secs, config.llm_request_secs)
}

fn build(connect_secs: u64, request_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(connect_secs))
        .timeout(Duration::from_secs(request_secs))
        .build()
}
