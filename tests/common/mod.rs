//! Shared fakes and helpers for the agent integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use insurance_agents::config::AgentsConfig;
use insurance_agents::http::build_router;
use insurance_agents::integrations::{
    ChatMessage, CodeHost, DocumentStore, Email, FileCommit, IntegrationError, Mailer, Notifier,
    ObjectStore, QuoteOutcome, QuoteSource, StoredObject, TextGenerator, TextReplacement,
};
use insurance_agents::{AgentKind, AppState};

pub const BOUNDARY: &str = "agentsboundary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmMode {
    Reply,
    Fail,
    Panic,
    /// Reply only after sleeping this long.
    Slow(Duration),
}

pub struct FakeLlm {
    mode: LlmMode,
    pub prompts: Mutex<Vec<String>>,
    pub chats: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeLlm {
    async fn answer(&self) -> Result<String, IntegrationError> {
        match self.mode {
            LlmMode::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(r#"{"headline": "Generated"}"#.to_string())
            }
            LlmMode::Reply => Ok(r#"{"headline": "Generated"}"#.to_string()),
            LlmMode::Fail => Err(IntegrationError::Api {
                service: "ollama",
                status: 500,
                body: "model crashed".into(),
            }),
            LlmMode::Panic => panic!("llm exploded"),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeLlm {
    async fn generate(&self, prompt: &str, _system: Option<&str>) -> Result<String, IntegrationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer().await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, IntegrationError> {
        self.chats.lock().unwrap().push(messages.to_vec());
        self.answer().await
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), IntegrationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeQuotes {
    pub payloads: Mutex<Vec<Value>>,
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    async fn quote(&self, payload: &Value) -> QuoteOutcome {
        self.payloads.lock().unwrap().push(payload.clone());
        QuoteOutcome::success(json!({"premium": 41.0}))
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDoc {
    pub template_id: String,
    pub title: String,
    pub replacements: Vec<TextReplacement>,
}

#[derive(Default)]
pub struct FakeDocs {
    pub rendered: Mutex<Vec<RenderedDoc>>,
}

#[async_trait]
impl DocumentStore for FakeDocs {
    async fn render_template(
        &self,
        template_id: &str,
        title: &str,
        replacements: &[TextReplacement],
    ) -> Result<String, IntegrationError> {
        self.rendered.lock().unwrap().push(RenderedDoc {
            template_id: template_id.to_string(),
            title: title.to_string(),
            replacements: replacements.to_vec(),
        });
        Ok("https://docs.google.com/document/d/doc-1/edit".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Default)]
pub struct FakeObjects {
    pub uploads: Mutex<Vec<Upload>>,
}

#[async_trait]
impl ObjectStore for FakeObjects {
    async fn upload_and_sign(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<StoredObject, IntegrationError> {
        self.uploads.lock().unwrap().push(Upload {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(StoredObject {
            gs_path: format!("gs://audits/uploads/x_{filename}"),
            signed_url: format!("https://storage.googleapis.com/audits/uploads/x_{filename}?sig"),
        })
    }
}

#[derive(Default)]
pub struct FakeCodeHost {
    pub commits: Mutex<Vec<FileCommit>>,
}

#[async_trait]
impl CodeHost for FakeCodeHost {
    async fn commit_file(&self, commit: &FileCommit) -> Result<String, IntegrationError> {
        self.commits.lock().unwrap().push(commit.clone());
        Ok(format!("https://github.com/acme/site/tree/{}", commit.branch))
    }
}

/// Handles on every fake wired into an `AppState`.
pub struct Fakes {
    pub llm: Arc<FakeLlm>,
    pub mailer: Arc<RecordingMailer>,
    pub quotes: Arc<FakeQuotes>,
    pub docs: Arc<FakeDocs>,
    pub objects: Arc<FakeObjects>,
    pub code_host: Arc<FakeCodeHost>,
}

pub fn test_config() -> AgentsConfig {
    let mut config = AgentsConfig::default();
    config.http.allowed_origin = "https://newinsurd.com".into();
    config.email.default_recipient = Some("ops@example.com".into());
    config.email.lead_recipient = Some("leads@example.com".into());
    config.google.growth_template_id = Some("growth-tmpl".into());
    config.google.audit_template_id = Some("audit-tmpl".into());
    config.sales.ethos_url = Some("https://ethos.example/apply".into());
    config.sales.backnine_url = Some("https://back9.example/start".into());
    config
}

pub fn state_with(config: AgentsConfig, mode: LlmMode) -> (AppState, Fakes) {
    let fakes = Fakes {
        llm: Arc::new(FakeLlm {
            mode,
            prompts: Mutex::default(),
            chats: Mutex::default(),
        }),
        mailer: Arc::default(),
        quotes: Arc::default(),
        docs: Arc::default(),
        objects: Arc::default(),
        code_host: Arc::default(),
    };
    let notifier = Notifier::new(
        Some(fakes.mailer.clone() as Arc<dyn Mailer>),
        config.email.default_recipient.clone(),
    );
    let state = AppState {
        config: Arc::new(config),
        llm: fakes.llm.clone(),
        notifier,
        quotes: fakes.quotes.clone(),
        documents: fakes.docs.clone(),
        objects: fakes.objects.clone(),
        code_host: fakes.code_host.clone(),
    };
    (state, fakes)
}

pub fn app(agent: AgentKind) -> (Router, Fakes) {
    app_with(agent, test_config(), LlmMode::Reply)
}

pub fn app_with(agent: AgentKind, config: AgentsConfig, mode: LlmMode) -> (Router, Fakes) {
    let (state, fakes) = state_with(config, mode);
    (build_router(agent, state), fakes)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse { status, headers, body }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn options(uri: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Hand-rolled `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.buf))
            .unwrap()
    }
}
