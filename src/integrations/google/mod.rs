//! Google Cloud clients: OAuth tokens, Cloud Storage, Docs and Drive.
//!
//! All of them talk plain REST through reqwest with a bearer token from
//! [`GoogleAuth`].

pub mod auth;
pub mod docs;
pub mod storage;

pub use auth::GoogleAuth;
pub use docs::{DocumentStore, GoogleDocs, TextReplacement};
pub use storage::{GcsStore, ObjectStore, StoredObject};

/// Public edit URL of a Google Doc.
pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{document_id}/edit")
}
