//! Website sales chat.
//!
//! # Responsibilities
//! - Route chat messages: human hand-off, instant-apply links, or an LLM reply
//! - Capture leads and forward them by email
//!
//! Intent detection is keyword based and runs before any LLM call, so the
//! links offered never depend on model output.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::SalesConfig;
use crate::http::request::RequestId;
use crate::http::response::{preflight, AgentError};
use crate::http::server::AppState;
use crate::integrations::{ChatMessage, Role};
use crate::observability::RequestLog;

const CHAT_SCOPE: &str = "chat";
const LEAD_SCOPE: &str = "lead";

pub const SYSTEM_PROMPT: &str = r#"
You are an expert AI assistant for an insurance agency. Your primary goal is to educate visitors about life insurance and guide them to an instant-apply tool. You must be friendly, concise, and helpful.

RULES:
1.  Always encourage the user to try the instant-apply tool as the fastest way to get a personalized quote.
2.  Provide simple, educational answers. Avoid long sales scripts.
3.  If the user asks about price, explain that it's personalized and the best way to find out is through the instant-apply tool. Do not guess prices.
4.  If the user explicitly refuses the tool and asks to speak to a human, your response should be ONLY "I can have an agent reach out. Please provide your details in the form."
5.  Unless you are triggering the lead capture flow (Rule 4), all your responses MUST end with the exact question: "Would you like me to open the instant-apply tool now so you can get an answer in minutes?"
"#;

pub const HANDOFF_REPLY: &str = "I can have an agent reach out. Please provide your details in the form.";
pub const APPLY_REPLY: &str = "That's great! The quickest way to get a quote is with our instant-decision tool.";
pub const ALTERNATE_REPLY: &str = "No problem. We also have another excellent tool you can try.";

const HUMAN_KEYWORDS: [&str; 4] = ["human", "person", "agent", "talk to someone"];
const APPLY_KEYWORDS: [&str; 5] = ["apply", "quote", "price", "cost", "how much"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat).options(preflight))
        .route("/lead", post(lead).options(preflight))
}

/// One prior turn as sent by the widget.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Serialize)]
pub struct NextActions {
    pub apply_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub lead: Map<String, Value>,
    pub next_actions: NextActions,
}

impl ChatResponse {
    fn new(reply: impl Into<String>, apply_url: Option<String>) -> Self {
        Self {
            reply: reply.into(),
            lead: Map::new(),
            next_actions: NextActions { apply_url },
        }
    }
}

/// What to do with an incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Visitor wants a person; answer with the hand-off line only.
    HumanHandoff,
    /// First buying signal: offer the instant-apply tool.
    OfferApplyLink(Option<String>),
    /// The instant-apply tool was already offered: suggest the alternate one.
    OfferAlternateLink(Option<String>),
    /// No routing keyword; let the LLM answer.
    Conversational,
}

/// Classify `message` given the prior `history`.
pub fn classify(message: &str, history: &[HistoryEntry], links: &SalesConfig) -> ChatOutcome {
    let lower = message.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|kw| lower.contains(kw));

    if mentions(&HUMAN_KEYWORDS[..]) {
        return ChatOutcome::HumanHandoff;
    }
    if !mentions(&APPLY_KEYWORDS[..]) {
        return ChatOutcome::Conversational;
    }

    let already_offered = links.ethos_url.as_deref().is_some_and(|url| {
        history
            .iter()
            .any(|h| h.role == "assistant" && h.content.contains(url))
    });
    if already_offered {
        ChatOutcome::OfferAlternateLink(links.backnine_url.clone())
    } else {
        ChatOutcome::OfferApplyLink(links.ethos_url.clone())
    }
}

/// System prompt, then the known history turns, then the new message.
pub fn conversation(message: &str, history: &[HistoryEntry]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history.iter().filter_map(|h| {
        let role = match h.role.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => return None,
        };
        Some(ChatMessage::new(role, h.content.clone()))
    }));
    messages.push(ChatMessage::user(message));
    messages
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Insurance Sales Agent API is running." }))
}

pub async fn chat(
    State(state): State<AppState>,
    id: RequestId,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AgentError> {
    let log = RequestLog::new(id);
    let Json(request) = payload.map_err(|e| {
        log.failure(CHAT_SCOPE, AgentError::rejected(e.status(), e.body_text()))
    })?;

    let outcome = classify(&request.message, &request.history, &state.config.sales);
    log.info(format_args!(
        "Conversation {}: {:?}",
        request.conversation_id, outcome
    ));

    let response = match outcome {
        ChatOutcome::HumanHandoff => ChatResponse::new(HANDOFF_REPLY, None),
        ChatOutcome::OfferApplyLink(url) => ChatResponse::new(APPLY_REPLY, url),
        ChatOutcome::OfferAlternateLink(url) => ChatResponse::new(ALTERNATE_REPLY, url),
        ChatOutcome::Conversational => {
            let messages = conversation(&request.message, &request.history);
            let reply = state
                .llm
                .chat(&messages)
                .await
                .map_err(|e| log.failure(CHAT_SCOPE, e.into()))?;
            ChatResponse::new(reply, None)
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub conversation_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl LeadRequest {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.name.trim().is_empty() {
            return Err(AgentError::validation("name must not be empty"));
        }
        if !is_email(self.email.trim()) {
            return Err(AgentError::validation("email is not a valid email address"));
        }
        Ok(())
    }

    fn email_body(&self) -> String {
        format!(
            "A new lead was captured via the website chatbot.\n\n\
             Conversation ID: {}\nName: {}\nEmail: {}\nPhone: {}",
            self.conversation_id,
            self.name,
            self.email,
            self.phone.as_deref().unwrap_or("Not provided")
        )
    }
}

/// `local@domain.tld` with no whitespace.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

pub async fn lead(
    State(state): State<AppState>,
    id: RequestId,
    payload: Result<Json<LeadRequest>, JsonRejection>,
) -> Result<Json<Value>, AgentError> {
    let log = RequestLog::new(id);
    let Json(lead) = payload.map_err(|e| {
        log.failure(LEAD_SCOPE, AgentError::rejected(e.status(), e.body_text()))
    })?;
    lead.validate().map_err(|e| log.failure(LEAD_SCOPE, e))?;

    let subject = format!("New Website Lead: {}", lead.name);
    state
        .notifier
        .notify(
            &log,
            &subject,
            &lead.email_body(),
            state.config.email.lead_recipient.as_deref(),
        )
        .await;

    Ok(Json(json!({ "status": "ok", "message": "Lead captured successfully." })))
}
