//! Policy audit intake.
//!
//! # Responsibilities
//! - Accept a policy document upload from the public audit form
//! - Archive it in Cloud Storage behind a signed download link
//! - Draft an audit report from a Docs template and notify the team
//! - Record submissions of the budget tool form

use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::http::request::RequestId;
use crate::http::response::{preflight, AgentError};
use crate::http::server::AppState;
use crate::integrations::types::take_chars;
use crate::integrations::{IntegrationError, TextReplacement};
use crate::observability::RequestLog;

const AUDIT_SCOPE: &str = "policy-audit";
const BUDGET_SCOPE: &str = "budget-tool";

const FILE_FIELDS: [&str; 2] = ["policy-file", "file"];
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const SNIPPET_CHARS: usize = 2000;
const REPORT_SNIPPET_CHARS: usize = 4000;

const PDF_PLACEHOLDER: &str = "[PDF received; text extraction is not enabled]";
const NON_PDF_PLACEHOLDER: &str = "[Non-PDF uploaded; OCR can be added later]";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook/policy-audit", post(policy_audit).options(preflight))
        .route("/webhook/budget-tool", post(budget_tool).options(preflight))
}

/// An uploaded document held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf" || self.filename.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Fields of the audit form.
#[derive(Debug, Default)]
pub struct AuditSubmission {
    pub name: String,
    pub email: String,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Serialize)]
pub struct AuditReceipt {
    pub status: &'static str,
    pub message: &'static str,
    pub client_name: String,
    pub client_email: String,
    pub file_url: String,
    pub report_url: String,
}

pub async fn policy_audit(
    State(state): State<AppState>,
    id: RequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AuditReceipt>, AgentError> {
    let log = RequestLog::new(id);

    let submission = match multipart {
        Ok(multipart) => read_submission(multipart)
            .await
            .map_err(|e| log.failure(AUDIT_SCOPE, e))?,
        Err(rejection) => {
            log.warn(format_args!("Not a multipart upload: {rejection}"));
            AuditSubmission::default()
        }
    };

    audit(&state, &log, submission)
        .await
        .map(Json)
        .map_err(|e| log.failure(AUDIT_SCOPE, e))
}

async fn read_submission(mut multipart: Multipart) -> Result<AuditSubmission, AgentError> {
    let mut submission = AuditSubmission::default();
    let mut files: [Option<UploadedFile>; 2] = [None, None];

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => submission.name = field.text().await.map_err(multipart_error)?.trim().to_string(),
            "email" => submission.email = field.text().await.map_err(multipart_error)?.trim().to_string(),
            other => {
                if let Some(slot) = FILE_FIELDS.iter().position(|f| *f == other) {
                    files[slot] = read_file(field).await?;
                }
            }
        }
    }

    let [policy_file, file] = files;
    submission.file = policy_file.or(file);
    Ok(submission)
}

async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, AgentError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let data = field.bytes().await.map_err(multipart_error)?;

    // An empty file input still submits a part with no name and no bytes.
    if filename.is_empty() && data.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        filename: if filename.is_empty() { "upload".to_string() } else { filename },
        content_type,
        data,
    }))
}

fn multipart_error(error: MultipartError) -> AgentError {
    AgentError::rejected(error.status(), error.body_text())
}

async fn audit(state: &AppState, log: &RequestLog, submission: AuditSubmission) -> Result<AuditReceipt, AgentError> {
    let AuditSubmission { name, email, file } = submission;
    let Some(file) = file else {
        return Err(AgentError::validation("No file uploaded"));
    };
    log.info(format_args!(
        "Received '{}' ({}), size={} bytes for {name} <{email}>",
        file.filename,
        file.content_type,
        file.data.len()
    ));

    let snippet = policy_snippet(&file);
    let stored = state
        .objects
        .upload_and_sign(file.data, &file.filename, &file.content_type)
        .await?;
    log.info(format_args!("Stored upload at {}", stored.gs_path));

    let template_id = state
        .config
        .google
        .audit_template_id
        .as_deref()
        .ok_or(IntegrationError::NotConfigured("AUDIT_TEMPLATE_ID"))?;
    let display_name = if name.is_empty() { "Client" } else { name.as_str() };
    let title = format!(
        "Policy Audit - {display_name} - {}",
        &Uuid::new_v4().simple().to_string()[..6]
    );
    let report_url = state
        .documents
        .render_template(template_id, &title, &report_replacements(display_name, &snippet, &stored.signed_url))
        .await?;
    log.info(format_args!("Drafted audit report {report_url}"));

    state
        .notifier
        .notify(
            log,
            &format!("New Policy Audit: {name}"),
            &format!(
                "Client: {name} <{email}>\nFile: {}\nReport: {report_url}",
                stored.signed_url
            ),
            None,
        )
        .await;

    Ok(AuditReceipt {
        status: "ok",
        message: "Audit received. Report drafted.",
        client_name: name,
        client_email: email,
        file_url: stored.signed_url,
        report_url,
    })
}

/// Leading text of the policy, or a placeholder when none can be read.
pub fn policy_snippet(file: &UploadedFile) -> String {
    let text = if file.is_pdf() {
        PDF_PLACEHOLDER
    } else {
        NON_PDF_PLACEHOLDER
    };
    take_chars(text.trim(), SNIPPET_CHARS).to_string()
}

fn report_replacements(client_name: &str, snippet: &str, file_url: &str) -> Vec<TextReplacement> {
    let snippet = match snippet.trim() {
        "" => "[No text extracted]",
        trimmed => take_chars(trimmed, REPORT_SNIPPET_CHARS),
    };
    let file_url = if file_url.is_empty() { "[no file url]" } else { file_url };
    vec![
        TextReplacement::new("{{CLIENT_NAME}}", client_name),
        TextReplacement::new("{{POLICY_TEXT_SNIPPET}}", snippet),
        TextReplacement::new("{{FILE_URL}}", file_url),
    ]
}

/// Budget tool form. Missing fields are empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BudgetSubmission {
    pub name: String,
    pub budget: String,
}

pub async fn budget_tool(id: RequestId, request: Request) -> Result<Json<Value>, AgentError> {
    let log = RequestLog::new(id);

    let submission = read_budget(request)
        .await
        .map_err(|e| log.failure(BUDGET_SCOPE, e))?;
    log.info(format_args!(
        "Budget tool from {} | Budget: {}",
        submission.name.trim(),
        submission.budget.trim()
    ));

    Ok(Json(json!({ "status": "ok" })))
}

/// Accepts both urlencoded and multipart bodies.
async fn read_budget(request: Request) -> Result<BudgetSubmission, AgentError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        return match Form::<BudgetSubmission>::from_request(request, &()).await {
            Ok(Form(form)) => Ok(form),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(AgentError::rejected(rejection.status(), rejection.body_text()))
            }
            Err(_) => Ok(BudgetSubmission::default()),
        };
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AgentError::rejected(e.status(), e.body_text()))?;
    let mut submission = BudgetSubmission::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("name") => submission.name = field.text().await.map_err(multipart_error)?,
            Some("budget") => submission.budget = field.text().await.map_err(multipart_error)?,
            _ => {}
        }
    }
    Ok(submission)
}
