//! Text generation backends.
//!
//! The provider is picked once from `LlmConfig`; agents only see the
//! [`TextGenerator`] trait object.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{LlmConfig, LlmProvider};
use crate::integrations::types::{json_body, send, take_chars, IntegrationError};

const OLLAMA: &str = "ollama";
const OPENAI: &str = "openai";
const OPENAI_TEMPERATURE: f32 = 0.7;
const STUB_PROMPT_CHARS: usize = 2000;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Text generation provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single-shot completion of `prompt`, optionally steered by `system`.
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, IntegrationError>;

    /// Reply to a conversation; the last message is the one to answer.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, IntegrationError>;
}

/// Build the generator selected by `config.provider`.
pub fn text_generator(config: &LlmConfig, client: reqwest::Client) -> Arc<dyn TextGenerator> {
    match config.provider {
        LlmProvider::Ollama => Arc::new(OllamaGenerator::new(
            client,
            &config.ollama_host,
            &config.ollama_model,
        )),
        LlmProvider::OpenAi => Arc::new(OpenAiGenerator::new(
            client,
            &config.openai_base_url,
            config.openai_api_key.clone(),
            &config.openai_model,
        )),
        LlmProvider::Vertex => Arc::new(VertexStub),
    }
}

/// Local Ollama runtime.
pub struct OllamaGenerator {
    client: reqwest::Client,
    host: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OllamaGenerator {
    pub fn new(client: reqwest::Client, host: &str, model: &str) -> Self {
        Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

impl fmt::Debug for OllamaGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaGenerator")
            .field("host", &self.host)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, IntegrationError> {
        let prompt = match system {
            Some(system) => format!("{system}\n{prompt}"),
            None => prompt.to_string(),
        };
        let body = json!({ "model": self.model, "prompt": prompt, "stream": false });

        let request = self.client.post(format!("{}/api/generate", self.host)).json(&body);
        let response = send(OLLAMA, request).await?;
        let parsed: OllamaGenerateResponse = json_body(OLLAMA, response).await?;
        Ok(parsed.response.trim().to_string())
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, IntegrationError> {
        let body = json!({ "model": self.model, "messages": messages, "stream": false });

        let request = self.client.post(format!("{}/api/chat", self.host)).json(&body);
        let response = send(OLLAMA, request).await?;
        let parsed: OllamaChatResponse = json_body(OLLAMA, response).await?;
        parsed
            .message
            .content
            .ok_or_else(|| IntegrationError::decode(OLLAMA, "message.content missing"))
    }
}

/// OpenAI-compatible chat completions.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

impl OpenAiGenerator {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

impl fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, IntegrationError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        Ok(self.chat(&messages).await?.trim().to_string())
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, IntegrationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("OPENAI_API_KEY"))?;
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: OPENAI_TEMPERATURE,
        };

        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body);
        let response = send(OPENAI, request).await?;
        let parsed: ChatCompletionResponse = json_body(OPENAI, response).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| IntegrationError::decode(OPENAI, "choices[0].message.content missing"))
    }
}

/// Deterministic stand-in for Vertex AI that echoes its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexStub;

impl VertexStub {
    fn render(prompt: &str, system: Option<&str>) -> String {
        format!(
            "[vertex-stub]\nSYSTEM:\n{}\nPROMPT:\n{}",
            system.unwrap_or_default(),
            take_chars(prompt, STUB_PROMPT_CHARS)
        )
    }
}

#[async_trait]
impl TextGenerator for VertexStub {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, IntegrationError> {
        Ok(Self::render(prompt, system))
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, IntegrationError> {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str());
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(Self::render(prompt, system))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ollama_generate_prefixes_system_and_trims() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "prompt": "Be brief.\nWrite a headline",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "  Hello NJ \n"})))
            .expect(1)
            .mount(&server)
            .await;

        let llm = OllamaGenerator::new(reqwest::Client::new(), &server.uri(), "llama3");
        let text = llm.generate("Write a headline", Some("Be brief.")).await.unwrap();
        assert_eq!(text, "Hello NJ");
    }

    #[tokio::test]
    async fn test_ollama_chat_reads_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "messages": [{"role": "system", "content": "rules"}, {"role": "user", "content": "hi"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": {"role": "assistant", "content": "Hello!"}})),
            )
            .mount(&server)
            .await;

        let llm = OllamaGenerator::new(reqwest::Client::new(), &server.uri(), "llama3");
        let reply = llm
            .chat(&[ChatMessage::system("rules"), ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn test_ollama_error_status_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .mount(&server)
            .await;

        let llm = OllamaGenerator::new(reqwest::Client::new(), &server.uri(), "llama3");
        let err = llm.generate("x", None).await.unwrap_err();
        match err {
            IntegrationError::Api { service, status, body } => {
                assert_eq!(service, "ollama");
                assert_eq!(status, 503);
                assert_eq!(body, "loading model");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_openai_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4-turbo", "temperature": 0.7})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Term life is simple."}}]
            })))
            .mount(&server)
            .await;

        let llm = OpenAiGenerator::new(
            reqwest::Client::new(),
            &server.uri(),
            Some("sk-test".into()),
            "gpt-4-turbo",
        );
        let reply = llm.chat(&[ChatMessage::user("What is term life?")]).await.unwrap();
        assert_eq!(reply, "Term life is simple.");
    }

    #[tokio::test]
    async fn test_openai_without_key_is_not_configured() {
        let llm = OpenAiGenerator::new(reqwest::Client::new(), "http://127.0.0.1:9", None, "gpt-4-turbo");
        let err = llm.generate("x", None).await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured("OPENAI_API_KEY")));
    }

    #[tokio::test]
    async fn test_vertex_stub_echoes_and_truncates() {
        let long = "a".repeat(2500);
        let text = VertexStub.generate(&long, Some("sys")).await.unwrap();
        assert_eq!(text, format!("[vertex-stub]\nSYSTEM:\nsys\nPROMPT:\n{}", "a".repeat(2000)));

        let text = VertexStub.generate("hello", None).await.unwrap();
        assert_eq!(text, "[vertex-stub]\nSYSTEM:\n\nPROMPT:\nhello");
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let value = serde_json::to_value(ChatMessage::new(Role::Assistant, "ok")).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "ok"}));
    }
}
