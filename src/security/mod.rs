//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (reject bodies over the agent's cap with 413)
//!     → handler
//!     → headers.rs (CORS headers stamped on every response)
//! ```
//!
//! # Design Decisions
//! - CORS headers are set unconditionally, errors and health checks included
//! - Body caps are per agent: uploads get a larger budget than JSON bodies

pub mod headers;
pub mod limits;
