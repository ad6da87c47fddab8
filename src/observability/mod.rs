//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and integrations produce:
//!     → logging.rs (tracing subscriber, request-scoped "[req:<id>]" lines)
//!     → metrics.rs (request and outbound-call counters, latency histogram)
//!
//! Consumers:
//!     → stdout (pretty locally, JSON in production)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The request id is both a message prefix and a structured field
//! - Metrics are cheap atomic updates; a no-op until an exporter is installed

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, RequestLog};
