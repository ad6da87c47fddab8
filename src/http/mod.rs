//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, agent routes)
//!     → request.rs (request id generated or honoured, handed to handlers)
//!     → agent handler
//!     → response.rs (AgentError → status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, ShortRequestId, X_REQUEST_ID};
pub use response::{AgentError, INTERNAL_ERROR_MESSAGE};
pub use server::{build_router, AgentServer, AppState};
