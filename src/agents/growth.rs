//! Marketing agent: personas and ad copy from demographic data, published
//! as a Google Doc.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::agents::fixtures::{self, Demographics};
use crate::http::request::RequestId;
use crate::http::response::{preflight, AgentError};
use crate::http::server::AppState;
use crate::integrations::{IntegrationError, TextReplacement};
use crate::observability::RequestLog;

const SCOPE: &str = "growth-agent";

const SYSTEM_PROMPT: &str = "You are a marketing expert for a life insurance company. \
Your tone is professional, insightful, and data-driven.";

pub fn routes() -> Router<AppState> {
    Router::new().route("/run", post(run).options(preflight))
}

#[derive(Debug, Serialize)]
pub struct GrowthSummary {
    pub status: &'static str,
    pub message: &'static str,
    pub report_url: String,
}

pub async fn run(State(state): State<AppState>, id: RequestId) -> Result<Json<GrowthSummary>, AgentError> {
    let log = RequestLog::new(id);
    log.info("Growth agent run started.");

    let report_url = build_report(&state, &log)
        .await
        .map_err(|e| log.failure(SCOPE, e))?;

    Ok(Json(GrowthSummary {
        status: "ok",
        message: "Growth agent run completed.",
        report_url,
    }))
}

async fn build_report(state: &AppState, log: &RequestLog) -> Result<String, AgentError> {
    let data = fixtures::demographics();
    log.info(format_args!("Collected data for {} ZIPs.", data.len()));

    let content = state
        .llm
        .generate(&marketing_prompt(&data), Some(SYSTEM_PROMPT))
        .await?;
    log.info("Generated personas and ad copy.");

    let template_id = state
        .config
        .google
        .growth_template_id
        .as_deref()
        .ok_or(IntegrationError::NotConfigured("GROWTH_AGENT_TEMPLATE_ID"))?;
    let title = format!("Growth Agent Report - {}", log.id());
    let report_url = state
        .documents
        .render_template(
            template_id,
            &title,
            &[TextReplacement::new("{{MARKETING_CONTENT}}", content)],
        )
        .await?;
    log.info(format_args!("Saved report to Google Doc: {report_url}"));

    let subject = format!("Growth Agent Report Ready ({})", log.id());
    let body = format!("The growth agent has completed its run.\n\nView the full report here:\n{report_url}");
    state.notifier.notify(log, &subject, &body, None).await;
    log.info("Sent summary email.");

    Ok(report_url)
}

fn marketing_prompt(data: &[Demographics]) -> String {
    let rows = data
        .iter()
        .map(|d| {
            format!(
                "- ZIP {}: median income ${}, average household size {}, median age {}",
                d.zip, d.median_income, d.avg_household_size, d.median_age
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the following demographic data for key ZIP codes:
{rows}

1.  **Customer Personas:** Create 2-3 distinct customer personas that represent these demographics. \
For each persona, include a name, age, career, financial situation, and primary insurance need.

2.  **Ad Copy:** For each persona, write a short, compelling ad copy (2-3 sentences) that speaks \
directly to their needs and would be suitable for a Facebook or LinkedIn ad.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_each_zip() {
        let prompt = marketing_prompt(&fixtures::demographics());
        assert!(prompt.contains("- ZIP 07302: median income $150000, average household size 2.1, median age 34"));
        assert!(prompt.contains("- ZIP 07307"));
        assert!(prompt.contains("**Customer Personas:**"));
    }
}
