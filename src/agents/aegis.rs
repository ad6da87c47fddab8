//! Retention agent.
//!
//! For every client with an upcoming renewal: fetch a fresh quote, draft a
//! personal retention email, record the opportunity, then send one digest.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::agents::fixtures::{self, RenewalClient};
use crate::http::request::RequestId;
use crate::http::response::{preflight, AgentError};
use crate::http::server::AppState;
use crate::integrations::QuoteOutcome;
use crate::observability::RequestLog;

const SCOPE: &str = "aegis-agent";

const SYSTEM_PROMPT: &str = "You are a helpful and proactive insurance agent assistant. \
Your goal is to write a personalized, friendly email to a client about their upcoming policy renewal.";

pub fn routes() -> Router<AppState> {
    Router::new().route("/run", post(run).options(preflight))
}

#[derive(Debug, Serialize)]
pub struct AegisSummary {
    pub status: &'static str,
    pub message: &'static str,
    pub processed_clients: usize,
}

/// A client with its quote and drafted email.
#[derive(Debug, Serialize)]
pub struct ProcessedClient {
    #[serde(flatten)]
    pub client: RenewalClient,
    pub new_quote: QuoteOutcome,
    pub draft_email: String,
}

pub async fn run(State(state): State<AppState>, id: RequestId) -> Result<Json<AegisSummary>, AgentError> {
    let log = RequestLog::new(id);
    log.info("Aegis agent run started.");

    let processed = process_renewals(&state, &log)
        .await
        .map_err(|e| log.failure(SCOPE, e))?;

    Ok(Json(AegisSummary {
        status: "ok",
        message: "Aegis agent run completed.",
        processed_clients: processed.len(),
    }))
}

async fn process_renewals(state: &AppState, log: &RequestLog) -> Result<Vec<ProcessedClient>, AgentError> {
    log.info("Reading client data (placeholder)...");
    let clients = fixtures::renewal_clients();
    log.info(format_args!("Found {} clients with upcoming renewals.", clients.len()));

    let mut processed = Vec::with_capacity(clients.len());
    for client in clients {
        log.info(format_args!("Fetching new quotes for {}...", client.name));
        let quote = state.quotes.quote(&json!({ "client_id": client.id })).await;
        if !quote.ok {
            log.warn(format_args!("Quote unavailable for {}; drafting without it.", client.name));
        }

        log.info(format_args!("Drafting retention email for {}...", client.name));
        let draft_email = state
            .llm
            .generate(&retention_prompt(&client, &quote), Some(SYSTEM_PROMPT))
            .await?;

        processed.push(ProcessedClient {
            client,
            new_quote: quote,
            draft_email,
        });
    }

    log.info(format_args!(
        "Updating BI dashboard with {} opportunities.",
        processed.len()
    ));
    for entry in &processed {
        log.info(format_args!(
            "  - Updating status for {}: Email drafted.",
            entry.client.name
        ));
    }

    log.info("Sending daily digest email.");
    let (subject, content) = daily_digest(&processed);
    state.notifier.notify(log, &subject, &content, None).await;

    Ok(processed)
}

fn retention_prompt(client: &RenewalClient, quote: &QuoteOutcome) -> String {
    let quote_details = match (quote.ok, &quote.data) {
        (true, Some(data)) => format!("a new quote with potential savings: {data}"),
        (true, None) => "a new quote with potential savings: see attached".to_string(),
        (false, _) => "some new options we can discuss.".to_string(),
    };

    format!(
        "Draft a personalized email to our client, {name}, regarding their upcoming {policy} \
policy renewal on {date}.

The email should:
- Be friendly and personal.
- Mention the upcoming renewal.
- Proactively state that you've already looked into {quote_details}
- Suggest a brief call to discuss their options.
",
        name = client.name,
        policy = client.policy_type,
        date = client.renewal_date,
    )
}

fn daily_digest(clients: &[ProcessedClient]) -> (String, String) {
    let subject = format!("Aegis Daily Digest - {} Retention Opportunities", clients.len());
    let mut content = String::from("The Aegis agent has completed its daily run.\n\nSummary of actions:\n");
    for entry in clients {
        let client = &entry.client;
        content.push_str(&format!("- Client: {} ({})\n", client.name, client.email));
        content.push_str(&format!("  - Renewal Date: {}\n", client.renewal_date));
        content.push_str("  - Action: Drafted personalized retention email.\n\n");
    }
    (subject, content)
}
