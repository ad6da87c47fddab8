//! Third-party API clients.
//!
//! # Data Flow
//! ```text
//! Agent workflow
//!     → llm.rs (Ollama / OpenAI / Vertex stub)
//!     → email.rs (SendGrid, best effort)
//!     → google/ (metadata tokens, GCS upload + signed URL, Docs templates)
//!     → github.rs (branch + file commit)
//!     → quotes.rs (BackNine, graceful outcome)
//!     → types.rs (shared error type, status checks, outbound metrics)
//! ```
//!
//! # Design Decisions
//! - Each client sits behind a trait so agents can be exercised with fakes
//! - Settings are checked at call time and reported as `NotConfigured`
//! - Uploads, mail sends and quote fetches go through the retry executor

pub mod email;
pub mod github;
pub mod google;
pub mod llm;
pub mod quotes;
pub mod types;

pub use email::{Email, EmailOutcome, Mailer, Notifier, SendGridMailer};
pub use github::{CodeHost, FileCommit, GithubClient};
pub use google::{DocumentStore, GcsStore, GoogleAuth, GoogleDocs, ObjectStore, StoredObject, TextReplacement};
pub use llm::{text_generator, ChatMessage, Role, TextGenerator};
pub use quotes::{BackNineClient, QuoteOutcome, QuoteSource};
pub use types::IntegrationError;
