//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (email send, GCS upload, quote fetch):
//!     → timeouts.rs (every reqwest client carries connect/request deadlines)
//!     → retries.rs (retry the call while the failure is retryable)
//!     → backoff.rs (delay schedule between attempts, no jitter)
//! ```
//!
//! # Design Decisions
//! - Retry is a higher-order function over a `RetryPolicy` value
//! - The executor never logs; callers own observability
//! - Cancellation is left to the outbound client's own timeout

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::{calculate_backoff, Backoff};
pub use retries::{Retry, RetryPolicy};
