//! Report documents built from Google Docs templates.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::integrations::google::auth::GoogleAuth;
use crate::integrations::google::document_url;
use crate::integrations::types::{json_body, send, IntegrationError};

const DRIVE: &str = "google-drive";
const DOCS: &str = "google-docs";

/// One `{{PLACEHOLDER}}` substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReplacement {
    pub placeholder: String,
    pub text: String,
}

impl TextReplacement {
    pub fn new(placeholder: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            text: text.into(),
        }
    }
}

/// Creates filled-in copies of template documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Copy `template_id` as `title`, apply `replacements`, return the edit URL.
    async fn render_template(
        &self,
        template_id: &str,
        title: &str,
        replacements: &[TextReplacement],
    ) -> Result<String, IntegrationError>;
}

#[derive(Debug, Deserialize)]
struct CopiedFile {
    id: String,
}

/// Drive v3 copy followed by a Docs v1 `batchUpdate`.
#[derive(Debug, Clone)]
pub struct GoogleDocs {
    client: reqwest::Client,
    auth: GoogleAuth,
    drive_base_url: String,
    docs_base_url: String,
}

impl GoogleDocs {
    pub fn new(client: reqwest::Client, auth: GoogleAuth, drive_base_url: &str, docs_base_url: &str) -> Self {
        Self {
            client,
            auth,
            drive_base_url: drive_base_url.trim_end_matches('/').to_string(),
            docs_base_url: docs_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn replace_all_requests(replacements: &[TextReplacement]) -> Value {
    let requests: Vec<Value> = replacements
        .iter()
        .map(|r| {
            json!({
                "replaceAllText": {
                    "containsText": { "text": r.placeholder, "matchCase": true },
                    "replaceText": r.text,
                }
            })
        })
        .collect();
    json!({ "requests": requests })
}

#[async_trait]
impl DocumentStore for GoogleDocs {
    async fn render_template(
        &self,
        template_id: &str,
        title: &str,
        replacements: &[TextReplacement],
    ) -> Result<String, IntegrationError> {
        let token = self.auth.access_token().await?;

        let copy = self
            .client
            .post(format!("{}/drive/v3/files/{template_id}/copy", self.drive_base_url))
            .bearer_auth(&token)
            .json(&json!({ "name": title }));
        let copied: CopiedFile = json_body(DRIVE, send(DRIVE, copy).await?).await?;

        let update = self
            .client
            .post(format!(
                "{}/v1/documents/{}:batchUpdate",
                self.docs_base_url, copied.id
            ))
            .bearer_auth(&token)
            .json(&replace_all_requests(replacements));
        send(DOCS, update).await?;

        Ok(document_url(&copied.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_copy_then_replace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files/tmpl-1/copy"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(json!({"name": "Growth Agent Report - abc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-9"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/documents/doc-9:batchUpdate"))
            .and(body_json(json!({
                "requests": [{
                    "replaceAllText": {
                        "containsText": {"text": "{{MARKETING_CONTENT}}", "matchCase": true},
                        "replaceText": "Personas..."
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"replies": []})))
            .expect(1)
            .mount(&server)
            .await;

        let auth = GoogleAuth::new(reqwest::Client::new(), Some("ya29.test".into()), &server.uri());
        let docs = GoogleDocs::new(reqwest::Client::new(), auth, &server.uri(), &server.uri());
        let url = docs
            .render_template(
                "tmpl-1",
                "Growth Agent Report - abc",
                &[TextReplacement::new("{{MARKETING_CONTENT}}", "Personas...")],
            )
            .await
            .unwrap();
        assert_eq!(url, "https://docs.google.com/document/d/doc-9/edit");
    }

    #[tokio::test]
    async fn test_copy_failure_stops_before_update() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files/missing/copy"))
            .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
            .mount(&server)
            .await;

        let auth = GoogleAuth::new(reqwest::Client::new(), Some("t".into()), &server.uri());
        let docs = GoogleDocs::new(reqwest::Client::new(), auth, &server.uri(), &server.uri());
        let err = docs.render_template("missing", "t", &[]).await.unwrap_err();
        assert!(matches!(err, IntegrationError::Api { service: "google-drive", status: 404, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
