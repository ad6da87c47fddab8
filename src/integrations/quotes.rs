//! BackNine quoting API.
//!
//! Quote lookups never fail the calling workflow: every problem becomes a
//! [`QuoteOutcome`] with `ok == false`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::QuoteConfig;
use crate::integrations::types::{truncate, IntegrationError};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

const BACKNINE: &str = "backnine";
const MAX_TEXT: usize = 2048;

/// Result of a quote request, shaped like the API's own error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// HTTP status of a rejected request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Body of a rejected request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuoteOutcome {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            status: None,
            text: None,
            error: None,
        }
    }

    pub fn rejected(status: u16, text: String) -> Self {
        Self {
            ok: false,
            data: None,
            status: Some(status),
            text: Some(text),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            status: None,
            text: None,
            error: Some(error.into()),
        }
    }
}

/// Supplier of fresh insurance quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, payload: &Value) -> QuoteOutcome;
}

/// `POST {base}/quotes` with a bearer key.
pub struct BackNineClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl BackNineClient {
    pub fn new(client: reqwest::Client, config: &QuoteConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.backnine_api_key.clone(),
            retry,
        }
    }

    async fn attempt(&self, api_key: &str, payload: &Value) -> Result<QuoteOutcome, IntegrationError> {
        let response = self
            .client
            .post(format!("{}/quotes", self.base_url))
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                metrics::record_outbound(BACKNINE, false);
                return Err(e.into());
            }
        };

        let status = response.status();
        metrics::record_outbound(BACKNINE, status.is_success());
        if !status.is_success() {
            let mut text = response.text().await?;
            truncate(&mut text, MAX_TEXT);
            return Ok(QuoteOutcome::rejected(status.as_u16(), text));
        }

        let data = response
            .json::<Value>()
            .await
            .map_err(|e| IntegrationError::decode(BACKNINE, e.to_string()))?;
        Ok(QuoteOutcome::success(data))
    }
}

#[async_trait]
impl QuoteSource for BackNineClient {
    async fn quote(&self, payload: &Value) -> QuoteOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return QuoteOutcome::failed("BACKNINE_API_KEY not set");
        };

        self.retry
            .retry_if(IntegrationError::is_transient)
            .run(|| self.attempt(api_key, payload))
            .await
            .unwrap_or_else(|e| QuoteOutcome::failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String, key: Option<&str>) -> BackNineClient {
        let config = QuoteConfig {
            backnine_api_key: key.map(str::to_string),
            base_url,
        };
        BackNineClient::new(reqwest::Client::new(), &config, RetryPolicy::new(3, 0.0, 2.0))
    }

    #[tokio::test]
    async fn test_successful_quote() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/quotes"))
            .and(header("authorization", "Bearer b9-key"))
            .and(body_json(json!({"client_id": "C123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"premium": 42.5})))
            .mount(&server)
            .await;

        let outcome = client(server.uri(), Some("b9-key"))
            .quote(&json!({"client_id": "C123"}))
            .await;
        assert_eq!(outcome, QuoteOutcome::success(json!({"premium": 42.5})));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"ok": true, "data": {"premium": 42.5}})
        );
    }

    #[tokio::test]
    async fn test_rejection_is_reported_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(server.uri(), Some("k")).quote(&json!({})).await;
        assert_eq!(outcome, QuoteOutcome::rejected(500, "upstream down".into()));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let outcome = client("http://127.0.0.1:9".into(), None).quote(&json!({})).await;
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("BACKNINE_API_KEY not set"));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_gracefully() {
        // Nothing listens on the discard port.
        let outcome = client("http://127.0.0.1:9".into(), Some("k")).quote(&json!({})).await;
        assert!(!outcome.ok);
        assert!(outcome.error.is_some());
        assert!(outcome.status.is_none());
    }
}
