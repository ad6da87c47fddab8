//! Plain-text email via SendGrid.
//!
//! Agents never fail a request because mail could not be sent: they go
//! through [`Notifier::notify`], which reports an [`EmailOutcome`] instead.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::EmailConfig;
use crate::integrations::types::{send, IntegrationError};
use crate::observability::RequestLog;
use crate::resilience::RetryPolicy;

const SENDGRID: &str = "sendgrid";

/// A single plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub content: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), IntegrationError>;
}

/// SendGrid v3 mail API, retried on transient failures.
pub struct SendGridMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl SendGridMailer {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry,
        }
    }

    async fn send_once(&self, email: &Email) -> Result<(), IntegrationError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": email.from },
            "subject": email.subject,
            "content": [{ "type": "text/plain", "value": email.content }],
        });
        let request = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        send(SENDGRID, request).await?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &Email) -> Result<(), IntegrationError> {
        self.retry
            .retry_if(IntegrationError::is_transient)
            .run(|| self.send_once(email))
            .await
    }
}

/// Result of a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    Sent,
    /// No API key or no recipient; nothing was attempted.
    Skipped,
    /// Every attempt failed; the message carries the last error.
    Failed(String),
}

/// Best-effort notification sender shared by all agents.
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    default_recipient: Option<String>,
}

impl Notifier {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, default_recipient: Option<String>) -> Self {
        Self {
            mailer,
            default_recipient,
        }
    }

    /// SendGrid-backed notifier, or a skipping one when no key is set.
    pub fn from_config(config: &EmailConfig, client: reqwest::Client, retry: RetryPolicy) -> Self {
        let mailer = config.sendgrid_api_key.as_ref().map(|key| {
            Arc::new(SendGridMailer::new(client, &config.sendgrid_base_url, key.clone(), retry))
                as Arc<dyn Mailer>
        });
        Self::new(mailer, config.default_recipient.clone())
    }

    /// Send `content` to `to`, or to the default recipient. The recipient is
    /// also the sender. Never fails.
    pub async fn notify(
        &self,
        log: &RequestLog,
        subject: &str,
        content: &str,
        to: Option<&str>,
    ) -> EmailOutcome {
        let recipient = to.or(self.default_recipient.as_deref());
        let (Some(mailer), Some(recipient)) = (&self.mailer, recipient) else {
            log.warn("send_email missing SENDGRID_API_KEY or recipient; skipping.");
            return EmailOutcome::Skipped;
        };

        let email = Email {
            from: recipient.to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
        };
        match mailer.send(&email).await {
            Ok(()) => EmailOutcome::Sent,
            Err(e) => {
                log.error(format_args!("SendGrid error: {e}"));
                EmailOutcome::Failed(e.to_string())
            }
        }
    }
}
