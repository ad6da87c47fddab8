//! Access tokens for Google APIs.
//!
//! A statically configured token wins; otherwise the GCE/Cloud Run metadata
//! server is asked on every call.

use serde::Deserialize;

use crate::integrations::types::{json_body, send, IntegrationError};

const METADATA: &str = "gce-metadata";
const SERVICE_ACCOUNT_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Source of OAuth bearer tokens and the runtime service account identity.
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    client: reqwest::Client,
    static_token: Option<String>,
    metadata_base_url: String,
}

impl GoogleAuth {
    pub fn new(client: reqwest::Client, static_token: Option<String>, metadata_base_url: &str) -> Self {
        Self {
            client,
            static_token,
            metadata_base_url: metadata_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn access_token(&self) -> Result<String, IntegrationError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let response = send(METADATA, self.metadata(format!("{SERVICE_ACCOUNT_PATH}/token"))).await?;
        let token: MetadataToken = json_body(METADATA, response).await?;
        Ok(token.access_token)
    }

    /// `configured` when set, else the email of the default service account.
    pub async fn service_account_email(&self, configured: Option<&str>) -> Result<String, IntegrationError> {
        if let Some(email) = configured {
            return Ok(email.to_string());
        }

        let response = send(METADATA, self.metadata(format!("{SERVICE_ACCOUNT_PATH}/email"))).await?;
        let email = response.text().await?.trim().to_string();
        if email.is_empty() {
            return Err(IntegrationError::NotConfigured("GCS_SIGNER_EMAIL"));
        }
        Ok(email)
    }

    fn metadata(&self, path: String) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.metadata_base_url, path))
            .header("Metadata-Flavor", "Google")
    }
}
