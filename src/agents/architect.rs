//! Landing page agent.
//!
//! Generates location-specific copy with the LLM, wraps it in a React
//! component and commits each page on its own feature branch.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::agents::fixtures::{self, Location};
use crate::http::request::RequestId;
use crate::http::response::{preflight, AgentError};
use crate::http::server::AppState;
use crate::integrations::FileCommit;
use crate::observability::RequestLog;

const SCOPE: &str = "architect-agent";

const SYSTEM_PROMPT: &str = "You are an expert web developer and copywriter. You will be given a \
location and asked to create the text content for a React landing page component for a life \
insurance website. The output should be only the text content, formatted cleanly.";

pub fn routes() -> Router<AppState> {
    Router::new().route("/generate", post(generate).options(preflight))
}

/// One committed landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandingPage {
    pub location: String,
    pub branch: String,
    pub commit_url: String,
    pub file_path: String,
}

#[derive(Debug, Serialize)]
pub struct ArchitectSummary {
    pub status: &'static str,
    pub message: &'static str,
    pub results: Vec<LandingPage>,
}

pub async fn generate(
    State(state): State<AppState>,
    id: RequestId,
) -> Result<Json<ArchitectSummary>, AgentError> {
    let log = RequestLog::new(id);
    log.info("Architect agent run started.");

    let results = build_pages(&state, &log)
        .await
        .map_err(|e| log.failure(SCOPE, e))?;

    Ok(Json(ArchitectSummary {
        status: "ok",
        message: "Architect agent run completed.",
        results,
    }))
}

async fn build_pages(state: &AppState, log: &RequestLog) -> Result<Vec<LandingPage>, AgentError> {
    let locations = fixtures::locations();
    log.info(format_args!("Processing {} locations.", locations.len()));

    let mut results = Vec::with_capacity(locations.len());
    for location in &locations {
        log.info(format_args!("Generating content for {}...", location.name));
        let content = state
            .llm
            .generate(&page_prompt(location), Some(SYSTEM_PROMPT))
            .await?;

        let branch = branch_name(location, log.id());
        let file_path = file_path(location);
        let commit = FileCommit {
            branch: branch.clone(),
            path: file_path.clone(),
            message: format!("feat: Add landing page for {}", location.name),
            content: react_component(location, &content),
        };
        let commit_url = state.code_host.commit_file(&commit).await?;
        log.info(format_args!(
            "Committed content for {} to branch {branch}",
            location.name
        ));

        results.push(LandingPage {
            location: location.name.to_string(),
            branch,
            commit_url,
            file_path,
        });
    }

    let subject = format!("Architect Agent Run Completed ({})", log.id());
    let mut content = String::from("The architect agent has completed its run.\n\nGenerated pages:\n");
    for page in &results {
        content.push_str(&format!(
            "- Location: {}, Branch: {}, URL: {}\n",
            page.location, page.branch, page.commit_url
        ));
    }
    state.notifier.notify(log, &subject, &content, None).await;
    log.info("Sent summary email.");

    Ok(results)
}

fn page_prompt(location: &Location) -> String {
    format!(
        r#"Create the content for a life insurance landing page targeted at residents of {name} (ZIP code: {zip}).

The content should include:
1.  A catchy, location-specific headline (e.g., "Life Insurance for the Garden State").
2.  A brief introductory paragraph (2-3 sentences).
3.  Three short sections, each with a heading and a paragraph, highlighting key benefits relevant to people in that area (e.g., family protection, financial security, legacy planning).
4.  A compelling call-to-action (e.g., "Get Your Free Quote Now").

Please format the output as a simple JSON object with keys: "headline", "intro", "sections" (an array of {{"heading": "...", "text": "..."}}), and "cta".
"#,
        name = location.name,
        zip = location.zip,
    )
}

/// `feature/landing-page-<ST>-<zip>-<first 6 chars of the request id>`.
pub fn branch_name(location: &Location, id: &RequestId) -> String {
    format!(
        "feature/landing-page-{}-{}-{}",
        location.state_code,
        location.zip,
        id.short(6)
    )
}

pub fn file_path(location: &Location) -> String {
    format!(
        "packages/frontend/src/pages/landings/{}/{}.tsx",
        location.state_code, location.zip
    )
}

/// Wrap generated JSON copy in a page component named after the location.
pub fn react_component(location: &Location, content: &str) -> String {
    let component = format!("LandingPage_{}_{}", location.state_code, location.zip);
    format!(
        r#"
import React from 'react';
import {{
    Card,
    CardContent,
    CardHeader,
    CardTitle,
}} from "@/components/ui/card";

const landingPageData = {content};

const {component}: React.FC = () => {{
    return (
        <div className="container mx-auto p-8">
            <h1 className="text-4xl font-bold text-center mb-4">{{landingPageData.headline}}</h1>
            <p className="text-lg text-center text-gray-600 mb-8">{{landingPageData.intro}}</p>
            <div className="grid md:grid-cols-3 gap-8">
                {{landingPageData.sections.map((section, index) => (
                    <Card key={{index}}>
                        <CardHeader>
                            <CardTitle>{{section.heading}}</CardTitle>
                        </CardHeader>
                        <CardContent>
                            <p>{{section.text}}</p>
                        </CardContent>
                    </Card>
                ))}}
            </div>
            <div className="text-center mt-12">
                <button className="bg-blue-600 text-white font-bold py-3 px-8 rounded-lg hover:bg-blue-700">
                    {{landingPageData.cta}}
                </button>
            </div>
        </div>
    );
}};

export default {component};
"#
    )
}
